//! Pull-based (volcano-style) query operators.

mod aggregate;
mod filter;
mod join;
mod seq_scan;

pub use aggregate::{AggOp, Aggregate};
pub use filter::Filter;
pub use join::Join;
pub use seq_scan::SeqScan;

use std::sync::Arc;

use crate::error::SmallError;
use crate::tuple::{Tuple, TupleDesc};

pub trait OpIterator {
    fn open(&mut self) -> Result<(), SmallError>;

    fn has_next(&mut self) -> Result<bool, SmallError>;

    fn next(&mut self) -> Result<Tuple, SmallError>;

    fn rewind(&mut self) -> Result<(), SmallError>;

    fn close(&mut self);

    fn get_tuple_desc(&self) -> Arc<TupleDesc>;

    // arity is fixed per operator: 0 for SeqScan, 1 for Filter/Aggregate, 2 for Join.
    fn get_children(&self) -> Vec<&dyn OpIterator>;

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> Result<(), SmallError>;
}

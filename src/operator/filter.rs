use std::sync::Arc;

use crate::error::SmallError;
use crate::operator::OpIterator;
use crate::predicate::Predicate;
use crate::tuple::{Tuple, TupleDesc};

/// Arity-1: pulls from `child` until a row satisfies `predicate`, or the
/// child is exhausted.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    lookahead: Option<Tuple>,
    is_open: bool,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Self {
            predicate,
            child,
            lookahead: None,
            is_open: false,
        }
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.filter(&t) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> Result<(), SmallError> {
        self.child.open()?;
        self.lookahead = None;
        self.is_open = true;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, SmallError> {
        if !self.is_open {
            return Err(SmallError::IllegalState("has_next before open".into()));
        }
        if self.lookahead.is_some() {
            return Ok(true);
        }
        self.lookahead = self.fetch_next()?;
        Ok(self.lookahead.is_some())
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoMoreTuples);
        }
        Ok(self.lookahead.take().unwrap())
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.child.rewind()?;
        self.lookahead = None;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.lookahead = None;
        self.is_open = false;
    }

    fn get_tuple_desc(&self) -> Arc<TupleDesc> {
        self.child.get_tuple_desc()
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> Result<(), SmallError> {
        if children.len() != 1 {
            return Err(SmallError::IllegalState(
                "Filter takes exactly one child".into(),
            ));
        }
        self.child = children.remove(0);
        Ok(())
    }
}

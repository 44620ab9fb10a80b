use std::sync::Arc;

use crate::database::Database;
use crate::error::SmallError;
use crate::heap_file::HeapFileIterator;
use crate::operator::OpIterator;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

/// Arity-0 leaf: scans a table's `HeapFile` end to end, via its own
/// `TransactionId`, exposing field names qualified by `alias` (so two
/// scans of the same table can be joined without name collisions).
pub struct SeqScan {
    table_id: i32,
    tid: TransactionId,
    alias: String,
    file_iter: Option<HeapFileIterator>,
    lookahead: Option<Tuple>,
    is_open: bool,
}

impl SeqScan {
    pub fn new(tid: TransactionId, table_id: i32, alias: &str) -> Self {
        Self {
            table_id,
            tid,
            alias: alias.to_string(),
            file_iter: None,
            lookahead: None,
            is_open: false,
        }
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> Result<(), SmallError> {
        let file = Database::global().get_catalog().get_heap_file(self.table_id)?;
        let mut iter = file.iterator(self.tid);
        iter.open()?;
        self.file_iter = Some(iter);
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
        let iter = self
            .file_iter
            .as_mut()
            .expect("is_open implies file_iter is set");
        if iter.has_next()? {
            self.lookahead = Some(iter.next()?);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoMoreTuples);
        }
        Ok(self.lookahead.take().unwrap())
    }

    fn rewind(&mut self) -> Result<(), SmallError> {
        self.open()
    }

    fn close(&mut self) {
        if let Some(iter) = self.file_iter.as_mut() {
            iter.close();
        }
        self.file_iter = None;
        self.lookahead = None;
        self.is_open = false;
    }

    fn get_tuple_desc(&self) -> Arc<TupleDesc> {
        let desc = Database::global()
            .get_catalog()
            .get_tuple_desc(self.table_id)
            .expect("table registered before get_tuple_desc is called");
        let fields = (0..desc.num_fields())
            .map(|i| {
                let name = desc
                    .field_name(i)
                    .map(|n| format!("{}.{}", self.alias, n));
                (desc.field_type(i), name)
            })
            .collect();
        Arc::new(TupleDesc::new(fields))
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> Result<(), SmallError> {
        if !children.is_empty() {
            return Err(SmallError::IllegalState(
                "SeqScan takes no children".into(),
            ));
        }
        Ok(())
    }
}

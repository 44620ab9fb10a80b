use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SmallError;
use crate::heap_file::HeapFile;
use crate::tuple::TupleDesc;

/// Maps table ids to their backing `HeapFile` and advisory name. Realizes
/// the `getTupleDesc(tableId) -> TupleDesc` interface `HeapPage` uses
/// during construction.
#[derive(Default)]
pub struct Catalog {
    tables: HashMap<i32, (Arc<HeapFile>, String)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    pub fn add_table(&mut self, file: Arc<HeapFile>, name: &str) {
        self.tables.insert(file.get_id(), (file, name.to_string()));
    }

    pub fn get_heap_file(&self, table_id: i32) -> Result<Arc<HeapFile>, SmallError> {
        self.tables
            .get(&table_id)
            .map(|(f, _)| Arc::clone(f))
            .ok_or_else(|| SmallError::IllegalState(format!("no table with id {}", table_id)))
    }

    pub fn get_tuple_desc(&self, table_id: i32) -> Result<Arc<TupleDesc>, SmallError> {
        Ok(self.get_heap_file(table_id)?.get_tuple_desc())
    }

    pub fn table_id_by_name(&self, name: &str) -> Result<i32, SmallError> {
        self.tables
            .iter()
            .find(|(_, (_, n))| n == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| SmallError::IllegalState(format!("no table named {}", name)))
    }
}

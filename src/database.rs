use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::OnceCell;

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::heap_file::HeapFile;
use crate::util::HandyRwLock;
use std::sync::Arc;

static DB: OnceCell<Database> = OnceCell::new();

/// Process-wide singleton bundling the minimal external collaborators
/// one catalog, one buffer pool. These exist only so `HeapFile` and the
/// operators have something to pull pages through.
pub struct Database {
    catalog: RwLock<Catalog>,
    buffer_pool: BufferPool,
}

impl Database {
    fn new() -> Database {
        Database {
            catalog: RwLock::new(Catalog::new()),
            buffer_pool: BufferPool::new(),
        }
    }

    pub fn global() -> &'static Database {
        DB.get_or_init(Database::new)
    }

    pub fn get_catalog(&self) -> RwLockReadGuard<Catalog> {
        self.catalog.rl()
    }

    pub fn get_write_catalog(&self) -> RwLockWriteGuard<Catalog> {
        self.catalog.wl()
    }

    pub fn get_buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    pub fn add_table(&self, file: Arc<HeapFile>, name: &str) {
        self.get_write_catalog().add_table(file, name);
    }
}

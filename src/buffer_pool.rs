use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::database::Database;
use crate::error::SmallError;
use crate::page::HeapPage;
use crate::page_id::HeapPageId;
use crate::transaction::TransactionId;
use crate::util::HandyRwLock;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

/// Caches pages read through `HeapFile::read_page`. No eviction policy and
/// no lock manager: concurrency control beyond this bare interface is the
/// job of whatever collaborator layers 2PL on top of `Permission`.
#[derive(Default)]
pub struct BufferPool {
    pages: RwLock<HashMap<HeapPageId, Arc<RwLock<HeapPage>>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
        }
    }

    /// Idempotent within a transaction: repeated calls for the same page
    /// id return the same cached entry.
    pub fn get_page(
        &self,
        _tid: TransactionId,
        pid: HeapPageId,
        _permission: Permission,
    ) -> Result<Arc<RwLock<HeapPage>>, SmallError> {
        if let Some(page) = self.pages.rl().get(&pid) {
            return Ok(Arc::clone(page));
        }

        debug!("buffer pool miss for {}, loading from disk", pid);
        let file = Database::global().get_catalog().get_heap_file(pid.table_id)?;
        let page = file.read_page(pid)?;
        let page = Arc::new(RwLock::new(page));
        self.pages.wl().insert(pid, Arc::clone(&page));
        Ok(page)
    }

    pub fn clear(&self) {
        self.pages.wl().clear();
    }
}

use rand::Rng;
use std::fmt;

/// A process-unique transaction identifier. No isolation or durability is
/// implemented; the id exists only so dirtied pages can record who dirtied
/// them (`HeapPage::mark_dirty`) and so the buffer pool has something to
/// key locks on if a real lock manager is layered in later.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TransactionId {
    id: u64,
}

impl TransactionId {
    pub fn new() -> Self {
        TransactionId {
            id: rand::thread_rng().gen(),
        }
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tid:{}", self.id)
    }
}

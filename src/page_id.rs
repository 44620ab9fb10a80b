use std::fmt;

/// Identifies one page: the table it belongs to and its 0-based position
/// within that table's backing file.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct HeapPageId {
    pub table_id: i32,
    pub page_number: usize,
}

impl HeapPageId {
    pub fn new(table_id: i32, page_number: usize) -> Self {
        Self {
            table_id,
            page_number,
        }
    }
}

impl fmt::Display for HeapPageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(table {}, page {})", self.table_id, self.page_number)
    }
}

/// Locates a tuple: the page it lives on and its slot index within that
/// page.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordId {
    pub page_id: HeapPageId,
    pub slot_number: usize,
}

impl RecordId {
    pub fn new(page_id: HeapPageId, slot_number: usize) -> Self {
        Self {
            page_id,
            slot_number,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot_number)
    }
}

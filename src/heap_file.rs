use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::buffer_pool::Permission;
use crate::database::Database;
use crate::error::SmallError;
use crate::page::{self, HeapPage};
use crate::page_id::HeapPageId;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};
use crate::util::{stable_hash, HandyRwLock};

/// A single backing file holding a tightly-packed sequence of
/// `page::get_page_size()`-byte page images, no header, no trailer.
pub struct HeapFile {
    path: PathBuf,
    desc: Arc<TupleDesc>,
    table_id: i32,
    file: Mutex<File>,
}

impl HeapFile {
    pub fn new(path: impl AsRef<Path>, desc: TupleDesc) -> Result<HeapFile, SmallError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let canonical = std::fs::canonicalize(path.as_ref())?;
        let table_id = stable_hash(&canonical.to_string_lossy());
        Ok(HeapFile {
            path: canonical,
            desc: Arc::new(desc),
            table_id,
            file: Mutex::new(file),
        })
    }

    pub fn get_id(&self) -> i32 {
        self.table_id
    }

    pub fn get_tuple_desc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.desc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `numPages = floor(file_length / P)`. Holes are not supported: page
    /// `i` lives at byte offset `i * P`.
    pub fn num_pages(&self) -> Result<usize, SmallError> {
        let len = self.file.lock().unwrap().metadata()?.len();
        Ok((len as usize) / page::get_page_size())
    }

    /// Seeks to `pageNumber * P` and reads exactly `P` bytes. Fails with
    /// `IoError` if the read is short or the seek lands out of range.
    pub fn read_page(&self, pid: HeapPageId) -> Result<HeapPage, SmallError> {
        let page_size = page::get_page_size();
        let mut buf = vec![0u8; page_size];
        {
            let mut file = self.file.lock().unwrap();
            file.seek(SeekFrom::Start((pid.page_number * page_size) as u64))?;
            file.read_exact(&mut buf)?;
        }
        debug!("read page {} from {:?}", pid, self.path);
        HeapPage::from_bytes(pid, Arc::clone(&self.desc), &buf)
    }

    /// Seeks to `pageNumber * P` and writes the page's serialized image,
    /// extending the file if `pageNumber == numPages`.
    pub fn write_page(&self, page: &HeapPage) -> Result<(), SmallError> {
        let page_size = page::get_page_size();
        let bytes = page.get_page_data();
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(
            (page.get_id().page_number * page_size) as u64,
        ))?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Walks existing pages looking for a free slot; if none exists,
    /// allocates and writes through a new empty page, then inserts into
    /// it. Returns the (always singleton) list of pages mutated.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        t: Tuple,
    ) -> Result<Vec<HeapPageId>, SmallError> {
        let buffer_pool = Database::global().get_buffer_pool();
        let num_pages = self.num_pages()?;

        for page_no in 0..num_pages {
            let pid = HeapPageId::new(self.table_id, page_no);
            let page_lock = buffer_pool.get_page(tid, pid, Permission::ReadWrite)?;
            let mut page = page_lock.wl();
            match page.insert_tuple(t.clone()) {
                Ok(()) => {
                    page.mark_dirty(true, tid);
                    return Ok(vec![pid]);
                }
                Err(SmallError::PageFull) => continue,
                Err(e) => return Err(e),
            }
        }

        let new_pid = HeapPageId::new(self.table_id, num_pages);
        self.write_raw_page(new_pid, &HeapPage::create_empty_page_data())?;

        let page_lock = buffer_pool.get_page(tid, new_pid, Permission::ReadWrite)?;
        let mut page = page_lock.wl();
        page.insert_tuple(t)?;
        page.mark_dirty(true, tid);
        Ok(vec![new_pid])
    }

    fn write_raw_page(&self, pid: HeapPageId, bytes: &[u8]) -> Result<(), SmallError> {
        let page_size = page::get_page_size();
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((pid.page_number * page_size) as u64))?;
        file.write_all(bytes)?;
        Ok(())
    }

    /// Requires `t.record_id()` to be present; fetches the owning page
    /// through the buffer pool and deletes from it.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        t: &Tuple,
    ) -> Result<HeapPageId, SmallError> {
        let rid = t.record_id().ok_or(SmallError::NotOnPage)?;
        let page_lock =
            Database::global()
                .get_buffer_pool()
                .get_page(tid, rid.page_id, Permission::ReadWrite)?;
        let mut page = page_lock.wl();
        page.delete_tuple(t)?;
        page.mark_dirty(true, tid);
        Ok(rid.page_id)
    }

    pub fn iterator(&self, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(self.table_id, tid)
    }
}

enum IterState {
    Closed,
    Open {
        num_pages: usize,
        page_no: usize,
        tuples: Peekable<std::vec::IntoIter<Tuple>>,
    },
}

/// A lifecycle state machine over a `HeapFile`'s pages: `Closed`
/// (initial/terminal) or `Open(pageNo, pageIter)`. `numPages` is captured
/// at `open()`, not at construction: growth of the file between
/// construction and `open()` is visible; growth during the scan itself is
/// not required to be.
pub struct HeapFileIterator {
    table_id: i32,
    tid: TransactionId,
    state: IterState,
}

impl HeapFileIterator {
    fn new(table_id: i32, tid: TransactionId) -> Self {
        Self {
            table_id,
            tid,
            state: IterState::Closed,
        }
    }

    fn file(&self) -> Result<Arc<HeapFile>, SmallError> {
        Database::global().get_catalog().get_heap_file(self.table_id)
    }

    fn load_page_tuples(
        &self,
        page_no: usize,
    ) -> Result<Peekable<std::vec::IntoIter<Tuple>>, SmallError> {
        let pid = HeapPageId::new(self.table_id, page_no);
        let page_lock =
            Database::global()
                .get_buffer_pool()
                .get_page(self.tid, pid, Permission::ReadOnly)?;
        let page = page_lock.rl();
        let tuples: Vec<Tuple> = page.iterator().collect();
        Ok(tuples.into_iter().peekable())
    }

    pub fn open(&mut self) -> Result<(), SmallError> {
        let num_pages = self.file()?.num_pages()?;
        let tuples = if num_pages > 0 {
            self.load_page_tuples(0)?
        } else {
            Vec::new().into_iter().peekable()
        };
        self.state = IterState::Open {
            num_pages,
            page_no: 0,
            tuples,
        };
        Ok(())
    }

    pub fn has_next(&mut self) -> Result<bool, SmallError> {
        loop {
            let (page_no, num_pages) = match &mut self.state {
                IterState::Closed => {
                    return Err(SmallError::IllegalState(
                        "has_next called before open".into(),
                    ))
                }
                IterState::Open {
                    num_pages,
                    page_no,
                    tuples,
                } => {
                    if tuples.peek().is_some() {
                        return Ok(true);
                    }
                    (*page_no, *num_pages)
                }
            };

            if page_no + 1 >= num_pages {
                return Ok(false);
            }
            let next_tuples = self.load_page_tuples(page_no + 1)?;
            if let IterState::Open { page_no, tuples, .. } = &mut self.state {
                *page_no += 1;
                *tuples = next_tuples;
            }
        }
    }

    pub fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoMoreTuples);
        }
        match &mut self.state {
            IterState::Open { tuples, .. } => Ok(tuples.next().unwrap()),
            IterState::Closed => unreachable!("has_next would have errored first"),
        }
    }

    pub fn rewind(&mut self) -> Result<(), SmallError> {
        self.close();
        self.open()
    }

    pub fn close(&mut self) {
        self.state = IterState::Closed;
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bit_vec::BitVec;
use log::debug;

use crate::error::SmallError;
use crate::page_id::{HeapPageId, RecordId};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

pub const DEFAULT_PAGE_SIZE: usize = 4096;
static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

pub fn get_page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Relaxed);
}

pub struct HeapPage {
    pid: HeapPageId,
    desc: Arc<TupleDesc>,

    // bit k set iff slot k is populated.
    header: BitVec<u32>,
    slots: Vec<Option<Tuple>>,

    // snapshot of the last-committed byte image; mutually excluded only
    // between get_before_image and set_before_image.
    old_data: Mutex<Vec<u8>>,

    dirtier: Option<TransactionId>,
}

impl HeapPage {
    // N = floor(P*8 / (T*8 + 1))
    pub fn num_slots(desc: &TupleDesc) -> usize {
        let tuple_bits = desc.size() * 8;
        (get_page_size() * 8) / (tuple_bits + 1)
    }

    // H = ceil(N/8)
    pub fn header_size(desc: &TupleDesc) -> usize {
        (Self::num_slots(desc) + 7) / 8
    }

    pub fn create_empty_page_data() -> Vec<u8> {
        vec![0; get_page_size()]
    }

    pub fn from_bytes(
        pid: HeapPageId,
        desc: Arc<TupleDesc>,
        bytes: &[u8],
    ) -> Result<HeapPage, SmallError> {
        if bytes.len() != get_page_size() {
            return Err(SmallError::IoError(format!(
                "expected a {}-byte page image, got {}",
                get_page_size(),
                bytes.len()
            )));
        }

        let num_slots = Self::num_slots(&desc);
        let header_size = Self::header_size(&desc);
        debug!("page {}: {} slots, {} header bytes", pid, num_slots, header_size);

        // Bit k lives in header byte k/8, bit position k mod 8, LSB-first.
        let mut header = BitVec::from_elem(num_slots, false);
        for k in 0..num_slots {
            let byte = bytes[k / 8];
            header.set(k, (byte & (1 << (k % 8))) != 0);
        }

        let tuple_size = desc.size();
        let mut slots = Vec::with_capacity(num_slots);
        let mut offset = header_size;
        for k in 0..num_slots {
            if header[k] {
                let mut t = Tuple::parse(desc.clone(), &bytes[offset..offset + tuple_size])?;
                t.set_record_id(Some(RecordId::new(pid, k)));
                slots.push(Some(t));
            } else {
                slots.push(None);
            }
            offset += tuple_size;
        }

        Ok(HeapPage {
            pid,
            desc,
            header,
            slots,
            old_data: Mutex::new(bytes.to_vec()),
            dirtier: None,
        })
    }

    pub fn get_id(&self) -> HeapPageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn num_slots_total(&self) -> usize {
        self.slots.len()
    }

    pub fn num_empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    pub fn is_slot_used(&self, slot: usize) -> bool {
        self.header[slot]
    }

    pub fn get_page_data(&self) -> Vec<u8> {
        let header_size = Self::header_size(&self.desc);
        let tuple_size = self.desc.size();
        let mut out = vec![0u8; get_page_size()];

        for k in 0..self.slots.len() {
            if self.header[k] {
                out[k / 8] |= 1 << (k % 8);
            }
        }

        let mut offset = header_size;
        for slot in &self.slots {
            if let Some(t) = slot {
                let bytes = t
                    .serialize()
                    .expect("a tuple stored on this page always matches its schema");
                out[offset..offset + tuple_size].copy_from_slice(&bytes);
            }
            offset += tuple_size;
        }

        out
    }

    pub fn insert_tuple(&mut self, mut t: Tuple) -> Result<(), SmallError> {
        if t.tuple_desc().as_ref() != self.desc.as_ref() {
            return Err(SmallError::SchemaMismatch(
                "tuple descriptor does not match this page's schema".into(),
            ));
        }

        let slot = (0..self.slots.len())
            .find(|&k| !self.header[k])
            .ok_or(SmallError::PageFull)?;

        t.set_record_id(Some(RecordId::new(self.pid, slot)));
        self.header.set(slot, true);
        self.slots[slot] = Some(t);
        Ok(())
    }

    pub fn delete_tuple(&mut self, t: &Tuple) -> Result<(), SmallError> {
        let rid = t.record_id().ok_or(SmallError::NotOnPage)?;
        if rid.page_id != self.pid {
            return Err(SmallError::NotOnPage);
        }
        if !self.header[rid.slot_number] {
            return Err(SmallError::AlreadyEmpty);
        }
        self.header.set(rid.slot_number, false);
        self.slots[rid.slot_number] = None;
        Ok(())
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtier = if dirty { Some(tid) } else { None };
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtier
    }

    pub fn get_before_image(&self) -> HeapPage {
        let snapshot = self.old_data.lock().unwrap().clone();
        HeapPage::from_bytes(self.pid, self.desc.clone(), &snapshot)
            .expect("a previously-published before-image is always a valid page")
    }

    pub fn set_before_image(&self) {
        let current = self.get_page_data();
        *self.old_data.lock().unwrap() = current;
    }

    // not restartable; get a fresh iterator to rescan.
    pub fn iterator(&self) -> impl Iterator<Item = Tuple> + '_ {
        self.slots.iter().filter_map(|slot| slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::types::FieldType;
    use crate::util::init_log;

    fn desc(n: usize) -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new(
            (0..n).map(|_| (FieldType::Int, None)).collect(),
        ))
    }

    // S1: P=4096, schema (INT,INT), T=8, N=504, H=63.
    #[test]
    fn s1_page_round_trip() {
        init_log();
        let d = desc(2);
        assert_eq!(HeapPage::num_slots(&d), 504);
        assert_eq!(HeapPage::header_size(&d), 63);

        let pid = HeapPageId::new(1, 0);
        let blank = HeapPage::create_empty_page_data();
        let mut page = HeapPage::from_bytes(pid, d.clone(), &blank).unwrap();

        for (a, b) in [(0, 0), (1, 10), (2, 20)] {
            let t = Tuple::new(d.clone(), vec![Field::Int(a), Field::Int(b)]).unwrap();
            page.insert_tuple(t).unwrap();
        }

        let bytes = page.get_page_data();
        let page2 = HeapPage::from_bytes(pid, d.clone(), &bytes).unwrap();
        let rows: Vec<Tuple> = page2.iterator().collect();
        assert_eq!(rows.len(), 3);
        for (i, (a, b)) in [(0, 0), (1, 10), (2, 20)].iter().enumerate() {
            assert_eq!(rows[i].get_field(0), &Field::Int(*a));
            assert_eq!(rows[i].get_field(1), &Field::Int(*b));
            assert_eq!(rows[i].record_id().unwrap().slot_number, i);
        }

        assert_eq!(page2.get_page_data(), bytes);
    }

    // S2: schema (INT), N = floor(4096*8/33) = 992; the 993rd insert fails.
    #[test]
    fn s2_page_full() {
        init_log();
        let d = desc(1);
        assert_eq!(HeapPage::num_slots(&d), 992);

        let pid = HeapPageId::new(1, 0);
        let blank = HeapPage::create_empty_page_data();
        let mut page = HeapPage::from_bytes(pid, d.clone(), &blank).unwrap();

        for i in 0..992 {
            let t = Tuple::new(d.clone(), vec![Field::Int(i)]).unwrap();
            page.insert_tuple(t).unwrap();
        }
        assert_eq!(page.num_empty_slots(), 0);

        let overflow = Tuple::new(d, vec![Field::Int(993)]).unwrap();
        match page.insert_tuple(overflow) {
            Err(SmallError::PageFull) => {}
            other => panic!("expected PageFull, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn delete_then_reinsert_reuses_slot() {
        let d = desc(1);
        let pid = HeapPageId::new(1, 0);
        let blank = HeapPage::create_empty_page_data();
        let mut page = HeapPage::from_bytes(pid, d.clone(), &blank).unwrap();

        let t = Tuple::new(d.clone(), vec![Field::Int(7)]).unwrap();
        page.insert_tuple(t).unwrap();
        let stored = page.iterator().next().unwrap();
        page.delete_tuple(&stored).unwrap();
        assert_eq!(page.num_empty_slots(), HeapPage::num_slots(&d));

        match page.delete_tuple(&stored) {
            Err(SmallError::AlreadyEmpty) => {}
            other => panic!("expected AlreadyEmpty, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn before_image_is_independent_of_later_mutation() {
        let d = desc(1);
        let pid = HeapPageId::new(1, 0);
        let blank = HeapPage::create_empty_page_data();
        let mut page = HeapPage::from_bytes(pid, d.clone(), &blank).unwrap();
        page.set_before_image();

        let t = Tuple::new(d, vec![Field::Int(1)]).unwrap();
        page.insert_tuple(t).unwrap();

        let before = page.get_before_image();
        assert_eq!(before.num_empty_slots(), HeapPage::num_slots(&before.desc));
    }
}

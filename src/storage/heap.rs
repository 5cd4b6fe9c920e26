use std::collections::BTreeSet;

use crate::common::{RsqlError, RsqlResult};
use crate::config::PAGE_SIZE_BYTES;

use super::record::{Record, Rid};

struct HeapPage {
    slots: Vec<Option<Vec<u8>>>,
}

/// Fixed-size record slots grouped into pages.
/// A slot keeps its RID for as long as the record lives, freed slots are reused lowest first.
pub struct RecordHeap {
    record_size: usize,
    slots_per_page: usize,
    pages: Vec<HeapPage>,
    free_slots: BTreeSet<Rid>,
    count: usize,
}

impl RecordHeap {
    pub fn new(record_size: usize) -> Self {
        let slots_per_page = (PAGE_SIZE_BYTES / record_size.max(1)).max(1);
        RecordHeap {
            record_size,
            slots_per_page,
            pages: vec![],
            free_slots: BTreeSet::new(),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn check_size(&self, data: &[u8]) -> RsqlResult<()> {
        if data.len() != self.record_size {
            return Err(RsqlError::StorageError(format!(
                "Record of {} bytes does not match slot size {}", data.len(), self.record_size)));
        }
        Ok(())
    }

    fn slot_mut(&mut self, rid: Rid) -> RsqlResult<&mut Option<Vec<u8>>> {
        self.pages
            .get_mut(rid.page_num as usize)
            .and_then(|page| page.slots.get_mut(rid.slot_num as usize))
            .ok_or_else(|| RsqlError::StorageError(format!("Record {} out of heap bounds", rid)))
    }

    pub fn insert(&mut self, data: Vec<u8>) -> RsqlResult<Rid> {
        self.check_size(&data)?;
        let rid = match self.free_slots.pop_first() {
            Some(rid) => rid,
            None => {
                let need_page = self
                    .pages
                    .last()
                    .map_or(true, |p| p.slots.len() >= self.slots_per_page);
                if need_page {
                    self.pages.push(HeapPage { slots: Vec::with_capacity(self.slots_per_page) });
                }
                let page_num = self.pages.len() - 1;
                let page = &mut self.pages[page_num];
                page.slots.push(None);
                Rid::new(page_num as u64, (page.slots.len() - 1) as u64)
            }
        };
        *self.slot_mut(rid)? = Some(data);
        self.count += 1;
        Ok(rid)
    }

    pub fn get(&self, rid: Rid) -> RsqlResult<Record> {
        self.pages
            .get(rid.page_num as usize)
            .and_then(|page| page.slots.get(rid.slot_num as usize))
            .and_then(|slot| slot.as_ref())
            .map(|data| Record::new(rid, data.clone()))
            .ok_or_else(|| RsqlError::StorageError(format!("No record at {}", rid)))
    }

    /// Write a record image back in place.
    pub fn update(&mut self, record: &Record) -> RsqlResult<()> {
        self.check_size(record.data())?;
        let slot = self.slot_mut(record.rid())?;
        match slot {
            Some(data) => {
                data.copy_from_slice(record.data());
                Ok(())
            }
            None => Err(RsqlError::StorageError(format!("No record at {}", record.rid()))),
        }
    }

    pub fn delete(&mut self, rid: Rid) -> RsqlResult<Record> {
        let slot = self.slot_mut(rid)?;
        let Some(data) = slot.take() else {
            return Err(RsqlError::StorageError(format!("No record at {}", rid)));
        };
        self.free_slots.insert(rid);
        self.count -= 1;
        Ok(Record::new(rid, data))
    }

    /// First live record strictly after `cursor` in RID order, or the very first one.
    pub fn next_after(&self, cursor: Option<Rid>) -> Option<Record> {
        let (mut page_num, mut slot_num) = match cursor {
            Some(rid) => (rid.page_num as usize, rid.slot_num as usize + 1),
            None => (0, 0),
        };
        while let Some(page) = self.pages.get(page_num) {
            while let Some(slot) = page.slots.get(slot_num) {
                if let Some(data) = slot {
                    let rid = Rid::new(page_num as u64, slot_num as u64);
                    return Some(Record::new(rid, data.clone()));
                }
                slot_num += 1;
            }
            page_num += 1;
            slot_num = 0;
        }
        None
    }
}

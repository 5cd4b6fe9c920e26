use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::catalog::{FieldMeta, TableMeta};
use crate::common::{RsqlError, RsqlResult, Value};

use super::heap::RecordHeap;
use super::index::{BTreeIndex, Index};
use super::record::{Record, Rid};

pub type TableRef = Arc<RwLock<Table>>;

/// Data structure managing the rows and secondary indexes of one table.
/// Locks on a `TableRef` are taken per call and never held across operator steps.
pub struct Table {
    meta: TableMeta,
    heap: RecordHeap,
    indexes: Vec<Box<dyn Index>>,
}

impl Table {
    pub fn new(meta: TableMeta) -> Self {
        let heap = RecordHeap::new(meta.record_size());
        Table {
            meta,
            heap,
            indexes: vec![],
        }
    }

    pub fn into_ref(self) -> TableRef {
        Arc::new(RwLock::new(self))
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn record_count(&self) -> usize {
        self.heap.len()
    }

    fn field(&self, field_name: &str) -> RsqlResult<&FieldMeta> {
        self.meta.field(field_name).ok_or_else(|| RsqlError::FieldNotFound {
            table: self.meta.name().to_string(),
            field: field_name.to_string(),
        })
    }

    /// Insert one row, keeping every index in step.
    /// Nothing is left behind if an index rejects the row.
    pub fn insert_record(&mut self, values: &[Value]) -> RsqlResult<Rid> {
        let mut record = Record::from_values(self.meta.fields(), self.meta.record_size(), values)?;
        let rid = self.heap.insert(record.data().to_vec())?;
        record.set_rid(rid);
        for i in 0..self.indexes.len() {
            let key = record.get_value(self.indexes[i].field_meta())?;
            if let Err(e) = self.indexes[i].insert_entry(&key, rid) {
                for done in self.indexes[..i].iter_mut() {
                    let key = record.get_value(done.field_meta())?;
                    done.delete_entry(&key, rid)?;
                }
                self.heap.delete(rid)?;
                return Err(e);
            }
        }
        Ok(rid)
    }

    pub fn get_record(&self, rid: Rid) -> RsqlResult<Record> {
        self.heap.get(rid)
    }

    /// Write a mutated record back to its slot. Indexes are not touched.
    pub fn update_record(&mut self, record: &Record) -> RsqlResult<()> {
        self.heap.update(record)
    }

    pub fn delete_record(&mut self, rid: Rid) -> RsqlResult<()> {
        let record = self.heap.get(rid)?;
        for index in self.indexes.iter_mut() {
            let key = record.get_value(index.field_meta())?;
            index.delete_entry(&key, rid)?;
        }
        self.heap.delete(rid)?;
        Ok(())
    }

    /// First record after `cursor` in RID order.
    pub fn next_record_after(&self, cursor: Option<Rid>) -> Option<Record> {
        self.heap.next_after(cursor)
    }

    pub fn create_index(
        &mut self,
        index_name: &str,
        field_name: &str,
        unique: bool,
    ) -> RsqlResult<()> {
        let field = self.field(field_name)?.clone();
        self.add_index(Box::new(BTreeIndex::new(index_name, field, unique)))
    }

    /// Attach an index and populate it with the existing rows.
    pub fn add_index(&mut self, mut index: Box<dyn Index>) -> RsqlResult<()> {
        let name = index.index_meta().name.clone();
        if self.find_index(&name).is_some() {
            return Err(RsqlError::InvalidInput(format!(
                "Index {} already exists on table {}",
                name,
                self.name()
            )));
        }
        let field = index.field_meta().clone();
        if self.meta.fields().get(field.field_id()) != Some(&field) {
            return Err(RsqlError::FieldNotFound {
                table: self.name().to_string(),
                field: field.name().to_string(),
            });
        }
        let mut cursor = None;
        while let Some(record) = self.heap.next_after(cursor) {
            index.insert_entry(&record.get_value(&field)?, record.rid())?;
            cursor = Some(record.rid());
        }
        info!("created index {} on {}.{}", name, self.name(), field.name());
        self.indexes.push(index);
        Ok(())
    }

    pub fn find_index(&self, index_name: &str) -> Option<&dyn Index> {
        self.indexes
            .iter()
            .find(|index| index.index_meta().name == index_name)
            .map(|index| index.as_ref())
    }

    pub fn indexes(&self) -> &[Box<dyn Index>] {
        &self.indexes
    }

    pub fn indexes_mut(&mut self) -> &mut [Box<dyn Index>] {
        &mut self.indexes
    }

    /// Undo one field update of `rid` from `new_value` back to `old_value`.
    /// Works whatever state the index pair was left in, so a half applied
    /// delete/insert on any index is repaired as well.
    pub fn restore_field(
        &mut self,
        rid: Rid,
        field: &FieldMeta,
        old_value: &Value,
        new_value: &Value,
    ) -> RsqlResult<()> {
        let mut record = self.heap.get(rid)?;
        record.set_value(field, old_value)?;
        self.heap.update(&record)?;
        for index in self.indexes.iter_mut() {
            if index.field_meta().field_id() != field.field_id() {
                continue;
            }
            if old_value != new_value && index.contains_entry(new_value, rid) {
                index.delete_entry(new_value, rid)?;
            }
            if !index.contains_entry(old_value, rid) {
                index.insert_entry(old_value, rid)?;
            }
        }
        debug!("restored {}.{} of {} to {}", self.name(), field.name(), rid, old_value);
        Ok(())
    }

    /// Check every index against the heap, used after recovery and in tests.
    pub fn check_indexes(&self) -> RsqlResult<()> {
        let mut cursor = None;
        while let Some(record) = self.heap.next_after(cursor) {
            for index in self.indexes.iter() {
                let key = record.get_value(index.field_meta())?;
                if !index.contains_entry(&key, record.rid()) {
                    warn!("index {} misses ({}, {})", index.index_meta().name, key, record.rid());
                    return Err(RsqlError::IndexError(format!(
                        "Index {} misses entry ({}, {})",
                        index.index_meta().name,
                        key,
                        record.rid()
                    )));
                }
            }
            cursor = Some(record.rid());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttrInfo;
    use crate::common::AttrType;

    fn setup_table() -> Table {
        let meta = TableMeta::new(1, "t", &[
            AttrInfo::new("id", AttrType::Ints, 0),
            AttrInfo::new("name", AttrType::Chars, 8),
        ]).expect("schema");
        Table::new(meta)
    }

    fn chars(s: &str) -> Value {
        Value::Chars(s.to_string())
    }

    #[test]
    fn test_insert_and_index_backfill() {
        let mut table = setup_table();
        let r1 = table.insert_record(&[Value::Int(1), chars("a")]).expect("insert");
        let r2 = table.insert_record(&[Value::Int(2), chars("b")]).expect("insert");
        table.create_index("i_name", "name", false).expect("create index");
        let r3 = table.insert_record(&[Value::Int(3), chars("a")]).expect("insert");

        let index = table.find_index("i_name").expect("index");
        assert_eq!(index.lookup(&chars("a")), vec![r1, r3]);
        assert_eq!(index.lookup(&chars("b")), vec![r2]);
        table.check_indexes().expect("consistent");
    }

    #[test]
    fn test_create_index_errors() {
        let mut table = setup_table();
        assert!(matches!(
            table.create_index("i", "missing", false),
            Err(RsqlError::FieldNotFound { .. })
        ));
        table.create_index("i", "name", false).expect("create index");
        assert!(matches!(table.create_index("i", "id", false), Err(RsqlError::InvalidInput(_))));
    }

    #[test]
    fn test_unique_violation_leaves_no_trace() {
        let mut table = setup_table();
        table.create_index("i_id", "id", false).expect("create index");
        table.create_index("u_name", "name", true).expect("create index");
        table.insert_record(&[Value::Int(1), chars("a")]).expect("insert");
        assert!(table.insert_record(&[Value::Int(2), chars("a")]).is_err());
        assert_eq!(table.record_count(), 1);
        assert!(table.find_index("i_id").expect("index").lookup(&Value::Int(2)).is_empty());
        table.check_indexes().expect("consistent");
    }

    #[test]
    fn test_delete_record_cleans_indexes() {
        let mut table = setup_table();
        table.create_index("i_name", "name", false).expect("create index");
        let rid = table.insert_record(&[Value::Int(1), chars("a")]).expect("insert");
        table.delete_record(rid).expect("delete");
        assert_eq!(table.record_count(), 0);
        assert!(table.find_index("i_name").expect("index").lookup(&chars("a")).is_empty());
    }

    #[test]
    fn test_restore_field_repairs_half_applied_pair() {
        let mut table = setup_table();
        table.create_index("i_name", "name", false).expect("create index");
        let rid = table.insert_record(&[Value::Int(1), chars("a")]).expect("insert");
        let field = table.meta().field("name").expect("field").clone();

        // record says "b", index lost "a" but never got "b"
        let mut record = table.get_record(rid).expect("get");
        record.set_value(&field, &chars("b")).expect("set");
        table.update_record(&record).expect("update");
        table.indexes_mut()[0].delete_entry(&chars("a"), rid).expect("delete");

        table.restore_field(rid, &field, &chars("a"), &chars("b")).expect("restore");
        let record = table.get_record(rid).expect("get");
        assert_eq!(record.get_value(&field).expect("read"), chars("a"));
        let index = table.find_index("i_name").expect("index");
        assert_eq!(index.lookup(&chars("a")), vec![rid]);
        assert!(index.lookup(&chars("b")).is_empty());
    }
}

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::catalog::FieldMeta;
use crate::common::{RsqlError, RsqlResult, Value};
use crate::storage::{Rid, TableRef};

pub type TrxRef = Arc<Mutex<Trx>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrxState {
    Active,
    Committed,
    RolledBack,
}

/// Compensating action for one change made inside a transaction.
pub enum UndoRecord {
    /// One field of one row moved from `old` to `new`, together with the
    /// index entries of that field.
    UpdateField {
        table: TableRef,
        rid: Rid,
        field: FieldMeta,
        old: Value,
        new: Value,
    },
}

impl UndoRecord {
    fn undo(&self) -> RsqlResult<()> {
        match self {
            UndoRecord::UpdateField { table, rid, field, old, new } => {
                let mut table = table.write()?;
                table.restore_field(*rid, field, old, new)
            }
        }
    }
}

pub struct Trx {
    id: u64,
    state: TrxState,
    undo_log: Vec<UndoRecord>,
}

impl Trx {
    pub fn new(id: u64) -> Self {
        Trx {
            id,
            state: TrxState::Active,
            undo_log: vec![],
        }
    }

    pub fn into_ref(self) -> TrxRef {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> TrxState {
        self.state
    }

    pub fn undo_len(&self) -> usize {
        self.undo_log.len()
    }

    fn check_active(&self) -> RsqlResult<()> {
        if self.state != TrxState::Active {
            return Err(RsqlError::ExecutionError(format!(
                "Transaction {} is not active ({:?})", self.id, self.state)));
        }
        Ok(())
    }

    pub fn log_update(
        &mut self,
        table: TableRef,
        rid: Rid,
        field: FieldMeta,
        old: Value,
        new: Value,
    ) -> RsqlResult<()> {
        self.check_active()?;
        self.undo_log.push(UndoRecord::UpdateField { table, rid, field, old, new });
        Ok(())
    }

    pub fn commit(&mut self) -> RsqlResult<()> {
        self.check_active()?;
        self.undo_log.clear();
        self.state = TrxState::Committed;
        info!("transaction {} committed", self.id);
        Ok(())
    }

    /// Undo every logged change, newest first.
    /// Keeps going past a failed undo and reports the first failure at the end.
    pub fn rollback(&mut self) -> RsqlResult<usize> {
        self.check_active()?;
        let mut first_err = None;
        let mut undone = 0;
        while let Some(record) = self.undo_log.pop() {
            match record.undo() {
                Ok(()) => undone += 1,
                Err(e) => {
                    warn!("transaction {} failed to undo a change: {}", self.id, e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        self.state = TrxState::RolledBack;
        info!("transaction {} rolled back {} change(s)", self.id, undone);
        match first_err {
            Some(e) => Err(e),
            None => {
                debug!("transaction {} rollback complete", self.id);
                Ok(undone)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttrInfo, TableMeta};
    use crate::common::AttrType;
    use crate::storage::Table;

    fn setup() -> (TableRef, Rid, FieldMeta) {
        let meta = TableMeta::new(1, "t", &[
            AttrInfo::new("id", AttrType::Ints, 0),
            AttrInfo::new("name", AttrType::Chars, 4),
        ]).expect("schema");
        let mut table = Table::new(meta);
        table.create_index("i_name", "name", false).expect("index");
        let rid = table.insert_record(&[Value::Int(1), Value::Chars("a".into())]).expect("insert");
        let field = table.meta().field("name").expect("field").clone();
        (table.into_ref(), rid, field)
    }

    fn chars(s: &str) -> Value {
        Value::Chars(s.to_string())
    }

    fn apply(table: &TableRef, rid: Rid, field: &FieldMeta, old: &Value, new: &Value) {
        let mut table = table.write().expect("lock");
        let mut record = table.get_record(rid).expect("get");
        record.set_value(field, new).expect("set");
        table.update_record(&record).expect("update");
        table.indexes_mut()[0].replace_entry(old, new, rid).expect("replace");
    }

    #[test]
    fn test_rollback_replays_in_reverse() {
        let (table, rid, field) = setup();
        let mut trx = Trx::new(7);
        let (a, b, c) = (chars("a"), chars("b"), chars("c"));

        apply(&table, rid, &field, &a, &b);
        trx.log_update(table.clone(), rid, field.clone(), a.clone(), b.clone()).expect("log");
        apply(&table, rid, &field, &b, &c);
        trx.log_update(table.clone(), rid, field.clone(), b.clone(), c.clone()).expect("log");

        assert_eq!(trx.rollback().expect("rollback"), 2);
        assert_eq!(trx.state(), TrxState::RolledBack);
        let table = table.read().expect("lock");
        assert_eq!(table.get_record(rid).expect("get").get_value(&field).expect("read"), a);
        assert_eq!(table.find_index("i_name").expect("index").lookup(&a), vec![rid]);
        table.check_indexes().expect("consistent");
    }

    #[test]
    fn test_commit_discards_log() {
        let (table, rid, field) = setup();
        let mut trx = Trx::new(1);
        trx.log_update(table, rid, field, chars("a"), chars("b")).expect("log");
        trx.commit().expect("commit");
        assert_eq!(trx.undo_len(), 0);
        assert!(trx.rollback().is_err());
        assert!(trx.commit().is_err());
    }
}

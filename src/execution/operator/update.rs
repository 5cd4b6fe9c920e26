use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::{RsqlError, RsqlResult};
use crate::sql::stmt::UpdateStmt;
use crate::transaction::TrxRef;

use super::{PhysicalOperator, PhysicalOperatorType, Tuple};

/// Sink operator writing one value into one field of every row its child yields.
/// Drains the child in a single `next` call and produces no rows of its own.
pub struct UpdatePhysicalOperator {
    trx: Option<TrxRef>,
    stmt: Arc<UpdateStmt>,
    child: Option<Box<dyn PhysicalOperator>>,
    affected_rows: u64,
}

impl UpdatePhysicalOperator {
    pub fn new(stmt: Arc<UpdateStmt>, trx: Option<TrxRef>) -> Self {
        UpdatePhysicalOperator {
            trx,
            stmt,
            child: None,
            affected_rows: 0,
        }
    }

    pub fn add_child(&mut self, child: Box<dyn PhysicalOperator>) {
        self.child = Some(child);
    }

    pub fn stmt(&self) -> &UpdateStmt {
        &self.stmt
    }

    /// Rows whose value actually changed. Final once `next` has returned `false`.
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }
}

impl PhysicalOperator for UpdatePhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::Update
    }

    fn open(&mut self, trx: Option<TrxRef>) -> RsqlResult<()> {
        if trx.is_some() {
            self.trx = trx;
        }
        match self.child.as_mut() {
            Some(child) => child.open(self.trx.clone()),
            None => Ok(()),
        }
    }

    fn next(&mut self) -> RsqlResult<bool> {
        let Some(child) = self.child.as_mut() else {
            return Ok(false);
        };
        let table = self.stmt.table();
        let field = self.stmt.field();
        let new_value = self.stmt.value();

        let table_name = self.stmt.table_name();

        while child.next()? {
            if child.current_tuple().is_none() {
                warn!("update child reported a row without a tuple");
                return Err(RsqlError::ExecutionError(
                    "Child operator produced no tuple".to_string(),
                ));
            }
            let Some(record) = child.current_record_mut() else {
                warn!("update child row has no stored record");
                return Err(RsqlError::ExecutionError(
                    "Cannot resolve the stored record of the current row".to_string(),
                ));
            };

            let old_value = record.get_value(field)?;
            if old_value.compare(new_value) == Ordering::Equal {
                debug!(
                    "{}.{} of {} already {}, skipped",
                    table_name,
                    field.name(),
                    record.rid(),
                    new_value
                );
                continue;
            }

            record.set_value(field, new_value).map_err(|e| match e {
                RsqlError::FieldTypeMismatch {
                    field,
                    expected,
                    actual,
                    ..
                } => RsqlError::FieldTypeMismatch {
                    table: table_name.to_string(),
                    field,
                    expected,
                    actual,
                },
                other => other,
            })?;
            let rid = record.rid();
            table.write()?.update_record(record)?;

            if let Some(trx) = self.trx.as_ref() {
                trx.lock()?.log_update(
                    table.clone(),
                    rid,
                    field.clone(),
                    old_value.clone(),
                    new_value.clone(),
                )?;
            }

            {
                let mut table = table.write()?;
                for index in table.indexes_mut().iter_mut() {
                    if index.field_meta().field_id() != field.field_id() {
                        continue;
                    }
                    if let Err(e) = index.replace_entry(&old_value, new_value, rid) {
                        warn!(
                            "index {} failed to move {} from {} to {}: {}",
                            index.index_meta().name,
                            rid,
                            old_value,
                            new_value,
                            e
                        );
                        return Err(e);
                    }
                }
            }

            debug!(
                "{}.{} of {} set from {} to {}",
                table_name,
                field.name(),
                rid,
                old_value,
                new_value
            );
            self.affected_rows += 1;
        }
        Ok(false)
    }

    fn close(&mut self) -> RsqlResult<()> {
        match self.child.as_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }

    fn current_tuple_mut(&mut self) -> Option<&mut dyn Tuple> {
        None
    }
}

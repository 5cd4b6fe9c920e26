use tracing::debug;

use crate::common::{RsqlError, RsqlResult};
use crate::storage::{Record, Rid, TableRef};
use crate::transaction::TrxRef;

use super::{PhysicalOperator, PhysicalOperatorType, RowTuple, Tuple};

/// Walks every record of a table in RID order.
pub struct TableScanPhysicalOperator {
    table: TableRef,
    trx: Option<TrxRef>,
    cursor: Option<Rid>,
    opened: bool,
    exhausted: bool,
    current: Option<RowTuple>,
}

impl TableScanPhysicalOperator {
    pub fn new(table: TableRef) -> Self {
        TableScanPhysicalOperator {
            table,
            trx: None,
            cursor: None,
            opened: false,
            exhausted: false,
            current: None,
        }
    }

    pub fn trx(&self) -> Option<&TrxRef> {
        self.trx.as_ref()
    }
}

impl PhysicalOperator for TableScanPhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::TableScan
    }

    fn open(&mut self, trx: Option<TrxRef>) -> RsqlResult<()> {
        if trx.is_some() {
            self.trx = trx;
        }
        self.cursor = None;
        self.current = None;
        self.exhausted = false;
        self.opened = true;
        Ok(())
    }

    fn next(&mut self) -> RsqlResult<bool> {
        if !self.opened {
            return Err(RsqlError::ExecutionError("Table scan used before open".to_string()));
        }
        if self.exhausted {
            return Ok(false);
        }
        let next = self.table.read()?.next_record_after(self.cursor);
        match next {
            Some(record) => {
                self.cursor = Some(record.rid());
                self.current = Some(RowTuple::new(record));
                Ok(true)
            }
            None => {
                debug!("table scan exhausted");
                self.exhausted = true;
                self.current = None;
                Ok(false)
            }
        }
    }

    fn close(&mut self) -> RsqlResult<()> {
        self.opened = false;
        self.current = None;
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn current_tuple_mut(&mut self) -> Option<&mut dyn Tuple> {
        self.current.as_mut().map(|t| t as &mut dyn Tuple)
    }

    fn current_record_mut(&mut self) -> Option<&mut Record> {
        self.current.as_mut().map(RowTuple::inner_mut)
    }
}

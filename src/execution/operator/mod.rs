use std::fmt;

use crate::common::RsqlResult;
use crate::storage::Record;
use crate::transaction::TrxRef;

pub mod tuple;
pub use tuple::{RowTuple, Tuple, ValueListTuple};
pub mod table_scan;
pub use table_scan::TableScanPhysicalOperator;
pub mod predicate;
pub use predicate::PredicatePhysicalOperator;
pub mod update;
pub use update::UpdatePhysicalOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalOperatorType {
    TableScan,
    Predicate,
    Update,
}

impl fmt::Display for PhysicalOperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhysicalOperatorType::TableScan => "TABLE_SCAN",
            PhysicalOperatorType::Predicate => "PREDICATE",
            PhysicalOperatorType::Update => "UPDATE",
        };
        write!(f, "{}", s)
    }
}

/// Pull based execution step.
/// `next` returns `Ok(false)` once rows are exhausted and keeps doing so.
pub trait PhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType;

    /// A supplied transaction replaces the one the operator holds.
    fn open(&mut self, trx: Option<TrxRef>) -> RsqlResult<()>;

    fn next(&mut self) -> RsqlResult<bool>;

    fn close(&mut self) -> RsqlResult<()>;

    fn current_tuple(&self) -> Option<&dyn Tuple>;

    fn current_tuple_mut(&mut self) -> Option<&mut dyn Tuple>;

    /// Stored record behind the current row, for operators that write back.
    fn current_record_mut(&mut self) -> Option<&mut Record> {
        self.current_tuple_mut().and_then(|tuple| tuple.record_mut())
    }
}

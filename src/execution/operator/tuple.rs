use crate::catalog::FieldMeta;
use crate::common::{RsqlError, RsqlResult, Value};
use crate::storage::Record;

/// A row produced by an operator.
pub trait Tuple {
    fn find_cell(&self, field: &FieldMeta) -> RsqlResult<Value>;

    /// Stored record backing this row, if there is one.
    fn record(&self) -> Option<&Record> {
        None
    }

    fn record_mut(&mut self) -> Option<&mut Record> {
        None
    }
}

/// Row view over one stored record.
#[derive(Debug, Clone)]
pub struct RowTuple {
    record: Record,
}

impl RowTuple {
    pub fn new(record: Record) -> Self {
        RowTuple { record }
    }

    pub fn inner(&self) -> &Record {
        &self.record
    }

    pub fn inner_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl Tuple for RowTuple {
    fn find_cell(&self, field: &FieldMeta) -> RsqlResult<Value> {
        self.record.get_value(field)
    }

    fn record(&self) -> Option<&Record> {
        Some(&self.record)
    }

    fn record_mut(&mut self) -> Option<&mut Record> {
        Some(&mut self.record)
    }
}

/// Computed row with no stored record behind it.
#[derive(Debug, Clone, Default)]
pub struct ValueListTuple {
    cells: Vec<(FieldMeta, Value)>,
}

impl ValueListTuple {
    pub fn new(cells: Vec<(FieldMeta, Value)>) -> Self {
        ValueListTuple { cells }
    }
}

impl Tuple for ValueListTuple {
    fn find_cell(&self, field: &FieldMeta) -> RsqlResult<Value> {
        self.cells
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RsqlError::ExecutionError(format!("Tuple has no cell {}", field.name())))
    }
}

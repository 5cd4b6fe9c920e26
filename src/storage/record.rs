use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::FieldMeta;
use crate::common::{AttrType, RsqlError, RsqlResult, Value};

const NULL_TAG: u8 = 0;
const VALUE_TAG: u8 = 1;

/// Stable address of a record inside its table's heap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rid {
    pub page_num: u64,
    pub slot_num: u64,
}

impl Rid {
    pub fn new(page_num: u64, slot_num: u64) -> Self {
        Rid { page_num, slot_num }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_num, self.slot_num)
    }
}

/// One row as a fixed-width byte image, addressed by field metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    rid: Rid,
    data: Vec<u8>,
}

impl Record {
    pub fn new(rid: Rid, data: Vec<u8>) -> Self {
        Record { rid, data }
    }
    pub fn rid(&self) -> Rid {
        self.rid
    }
    pub(crate) fn set_rid(&mut self, rid: Rid) {
        self.rid = rid;
    }
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn slot(&self, field: &FieldMeta) -> RsqlResult<&[u8]> {
        self.data
            .get(field.offset()..field.offset() + field.slot_size())
            .ok_or_else(|| {
                RsqlError::StorageError(format!(
                    "Field {} lies outside record {} of {} bytes",
                    field.name(),
                    self.rid,
                    self.data.len()
                ))
            })
    }

    pub fn get_value(&self, field: &FieldMeta) -> RsqlResult<Value> {
        let slot = self.slot(field)?;
        match slot[0] {
            NULL_TAG => Ok(Value::Undefined),
            VALUE_TAG => Value::read_payload(field.attr_type(), &slot[1..]),
            tag => Err(RsqlError::StorageError(format!(
                "Unknown null tag {} in field {}",
                tag,
                field.name()
            ))),
        }
    }

    /// Overwrite one field. The record is left untouched when this fails.
    pub fn set_value(&mut self, field: &FieldMeta, value: &Value) -> RsqlResult<()> {
        let actual = value.attr_type();
        if actual != field.attr_type() && actual != AttrType::Undefined {
            return Err(RsqlError::FieldTypeMismatch {
                table: String::new(),
                field: field.name().to_string(),
                expected: field.attr_type(),
                actual,
            });
        }
        self.slot(field)?;
        let mut slot = vec![0u8; field.slot_size()];
        if !value.is_null() {
            slot[0] = VALUE_TAG;
            value.write_payload(&mut slot[1..])?;
        }
        self.data[field.offset()..field.offset() + field.slot_size()].copy_from_slice(&slot);
        Ok(())
    }

    /// Build a record image from one value per field.
    pub fn from_values(
        fields: &[FieldMeta],
        record_size: usize,
        values: &[Value],
    ) -> RsqlResult<Self> {
        if fields.len() != values.len() {
            return Err(RsqlError::InvalidInput(format!(
                "Expected {} values, found {}", fields.len(), values.len())));
        }
        let mut record = Record::new(Rid::default(), vec![0u8; record_size]);
        for (field, value) in fields.iter().zip(values) {
            record.set_value(field, value)?;
        }
        Ok(record)
    }
}

use serde::{Deserialize, Serialize};

use crate::common::{AttrType, RsqlError, RsqlResult};
use crate::config::{MAX_CHARS_SIZE, MAX_COL_NAME_SIZE, MAX_TABLE_NAME_SIZE};

/// Column definition as given by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrInfo {
    pub name: String,
    pub attr_type: AttrType,
    /// Declared length, only meaningful for CHARS.
    pub length: usize,
}

impl AttrInfo {
    pub fn new(name: &str, attr_type: AttrType, length: usize) -> Self {
        AttrInfo {
            name: name.to_string(),
            attr_type,
            length,
        }
    }
}

/// Schema descriptor of one column.
/// Every field slot in a record is `[null tag: 1 byte][payload: len bytes]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    name: String,
    attr_type: AttrType,
    offset: usize,
    len: usize,
    field_id: usize,
}

impl FieldMeta {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }
    /// Offset of the null tag inside the record.
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// Payload length, without the tag byte.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn field_id(&self) -> usize {
        self.field_id
    }
    pub(crate) fn slot_size(&self) -> usize {
        1 + self.len
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    table_id: u64,
    name: String,
    fields: Vec<FieldMeta>,
    record_size: usize,
}

impl TableMeta {
    pub fn new(table_id: u64, name: &str, attrs: &[AttrInfo]) -> RsqlResult<Self> {
        if name.trim().is_empty() {
            return Err(RsqlError::InvalidInput("Table name cannot be blank".to_string()));
        }
        if name.len() > MAX_TABLE_NAME_SIZE {
            return Err(RsqlError::InvalidInput(format!(
                "Table name {} exceeds max length {}",
                name, MAX_TABLE_NAME_SIZE
            )));
        }
        if attrs.is_empty() {
            return Err(RsqlError::InvalidInput(format!("Table {} has no columns", name)));
        }
        let mut fields = Vec::with_capacity(attrs.len());
        let mut name_set = std::collections::HashSet::new();
        let mut offset = 0;
        for (field_id, attr) in attrs.iter().enumerate() {
            if attr.name.len() > MAX_COL_NAME_SIZE {
                return Err(RsqlError::InvalidInput(format!(
                    "Column name {} exceeds max length {}",
                    attr.name, MAX_COL_NAME_SIZE
                )));
            }
            if !name_set.insert(attr.name.as_str()) {
                return Err(RsqlError::InvalidInput(format!("Duplicate column name {}", attr.name)));
            }
            let len = match attr.attr_type {
                AttrType::Chars => {
                    if attr.length == 0 || attr.length > MAX_CHARS_SIZE {
                        return Err(RsqlError::InvalidInput(format!(
                            "Chars column {} length {} must be within 1..={}",
                            attr.name, attr.length, MAX_CHARS_SIZE
                        )));
                    }
                    attr.length
                }
                AttrType::Undefined => {
                    return Err(RsqlError::InvalidInput(format!(
                        "Column {} has no type",
                        attr.name
                    )));
                }
                other => other.fixed_len().unwrap_or_default(),
            };
            let field = FieldMeta {
                name: attr.name.clone(),
                attr_type: attr.attr_type,
                offset,
                len,
                field_id,
            };
            offset += field.slot_size();
            fields.push(field);
        }
        Ok(TableMeta {
            table_id,
            name: name.to_string(),
            fields,
            record_size: offset,
        })
    }
    pub fn table_id(&self) -> u64 {
        self.table_id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }
    pub fn record_size(&self) -> usize {
        self.record_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_contiguous() {
        let meta = TableMeta::new(1, "t", &[
            AttrInfo::new("id", AttrType::Ints, 0),
            AttrInfo::new("name", AttrType::Chars, 10),
            AttrInfo::new("born", AttrType::Dates, 0),
        ]).expect("valid schema");
        let fields = meta.fields();
        assert_eq!(fields[0].offset(), 0);
        assert_eq!(fields[1].offset(), 9);
        assert_eq!(fields[2].offset(), 20);
        assert_eq!(meta.record_size(), 25);
        assert_eq!(meta.field("name").map(|f| f.field_id()), Some(1));
        assert!(meta.field("missing").is_none());
    }

    #[test]
    fn test_rejects_bad_schema() {
        assert!(TableMeta::new(1, " ", &[AttrInfo::new("id", AttrType::Ints, 0)]).is_err());
        assert!(TableMeta::new(1, "t", &[]).is_err());
        assert!(TableMeta::new(1, "t", &[
            AttrInfo::new("id", AttrType::Ints, 0),
            AttrInfo::new("id", AttrType::Floats, 0),
        ]).is_err());
        assert!(TableMeta::new(1, "t", &[AttrInfo::new("c", AttrType::Chars, 0)]).is_err());
        assert!(TableMeta::new(1, "t", &[AttrInfo::new("u", AttrType::Undefined, 0)]).is_err());
    }
}

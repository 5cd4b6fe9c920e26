use tracing::{debug, warn};

use crate::catalog::{Db, FieldMeta};
use crate::common::{AttrType, RsqlError, RsqlResult, Value};
use crate::sql::parse_defs::UpdateSqlNode;
use crate::storage::TableRef;

use super::filter_stmt::FilterStmt;

/// Validated `UPDATE` of one field of one table. Immutable once built.
pub struct UpdateStmt {
    table: TableRef,
    table_name: String,
    field: FieldMeta,
    value: Value,
    filter: Option<FilterStmt>,
}

impl UpdateStmt {
    /// Checks run in order and the first failure wins:
    /// database, table name, table, field, value type, then the filter conditions.
    /// Text assigned to a DATES field is parsed as a date first.
    pub fn create(db: Option<&Db>, node: &UpdateSqlNode) -> RsqlResult<UpdateStmt> {
        let Some(db) = db else {
            warn!("update on {} without a database", node.relation_name);
            return Err(RsqlError::NoDatabaseSelected);
        };

        let table_name = node.relation_name.as_str();
        if table_name.trim().is_empty() {
            warn!("update without a table name in {}", db.name());
            return Err(RsqlError::InvalidInput("Table name cannot be blank".to_string()));
        }
        let Some(table) = db.find_table(table_name)? else {
            warn!("update on unknown table {}.{}", db.name(), table_name);
            return Err(RsqlError::TableNotFound(table_name.to_string()));
        };

        let (field, value, filter) = {
            let guard = table.read()?;
            let meta = guard.meta();
            let Some(field) = meta.field(&node.attribute_name) else {
                warn!("update on unknown field {}.{}", table_name, node.attribute_name);
                return Err(RsqlError::FieldNotFound {
                    table: table_name.to_string(),
                    field: node.attribute_name.clone(),
                });
            };

            let value = node.value.cast_for(field.attr_type())?;
            let value_type = value.attr_type();
            if value_type != field.attr_type() && value_type != AttrType::Undefined {
                warn!("update value type {} does not fit {}.{} of type {}",
                    value_type, table_name, field.name(), field.attr_type());
                return Err(RsqlError::FieldTypeMismatch {
                    table: table_name.to_string(),
                    field: field.name().to_string(),
                    expected: field.attr_type(),
                    actual: value_type,
                });
            }

            let filter = FilterStmt::create(db, meta, &node.conditions)?;
            (field.clone(), value, filter)
        };

        debug!(target: "sql_debug", "update stmt: table={}, field={}, value={}, conditions={}",
            table_name, field.name(), value, filter.units().len());

        Ok(UpdateStmt {
            table,
            table_name: table_name.to_string(),
            field,
            value,
            filter: (!filter.is_empty()).then_some(filter),
        })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn field(&self) -> &FieldMeta {
        &self.field
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn filter(&self) -> Option<&FilterStmt> {
        self.filter.as_ref()
    }
}

use crate::catalog::Db;
use crate::common::{RsqlError, RsqlResult};
use crate::sql::parse_defs::DropTableSqlNode;

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    table_name: String,
    if_exists: bool,
}

impl DropTableStmt {
    /// Existence of the table is checked when the drop runs.
    pub fn create(db: Option<&Db>, node: &DropTableSqlNode) -> RsqlResult<DropTableStmt> {
        if db.is_none() {
            return Err(RsqlError::NoDatabaseSelected);
        }
        if node.relation_name.trim().is_empty() {
            return Err(RsqlError::InvalidInput("Table name cannot be blank".to_string()));
        }
        Ok(DropTableStmt {
            table_name: node.relation_name.clone(),
            if_exists: node.if_exists,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn if_exists(&self) -> bool {
        self.if_exists
    }
}

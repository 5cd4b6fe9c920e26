use tracing::{info, warn};

use crate::common::{RsqlError, RsqlResult};
use crate::sql::stmt::DropTableStmt;

use super::result::ExecutionResult;
use super::session::Session;

pub struct DropTableExecutor;

impl DropTableExecutor {
    pub fn execute(session: &Session, stmt: &DropTableStmt) -> RsqlResult<ExecutionResult> {
        let Some(db) = session.current_db() else {
            return Err(RsqlError::NoDatabaseSelected);
        };
        match session.handler().drop_table(db.name(), stmt.table_name()) {
            Ok(()) => {
                info!("drop table {}.{} succeeded", db.name(), stmt.table_name());
                Ok(ExecutionResult::Ddl(format!("Table {} dropped", stmt.table_name())))
            }
            Err(RsqlError::TableNotFound(_)) if stmt.if_exists() => {
                info!("drop table {}.{} skipped, no such table", db.name(), stmt.table_name());
                Ok(ExecutionResult::Ddl(format!("Table {} does not exist", stmt.table_name())))
            }
            Err(e) => {
                warn!("drop table {}.{} failed: {}", db.name(), stmt.table_name(), e);
                Err(e)
            }
        }
    }
}

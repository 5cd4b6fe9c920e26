use thiserror::Error;

use super::value::AttrType;

#[derive(Error, Debug)]
pub enum RsqlError {
    #[error("Parser Error: {0}")]
    ParserError(String),

    #[error("No database selected")]
    NoDatabaseSelected,

    #[error("Database {0} not found")]
    DatabaseNotFound(String),

    #[error("Table {0} not found")]
    TableNotFound(String),

    #[error("Table {0} already exists")]
    TableExists(String),

    #[error("Field {field} not found in table {table}")]
    FieldNotFound { table: String, field: String },

    #[error("Field type mismatch on {table}.{field}: expected {expected}, found {actual}")]
    FieldTypeMismatch {
        table: String,
        field: String,
        expected: AttrType,
        actual: AttrType,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Execution Error: {0}")]
    ExecutionError(String),

    #[error("Storage Error: {0}")]
    StorageError(String),

    #[error("Index Error: {0}")]
    IndexError(String),

    #[error("Failed to acquire lock: {0}")]
    LockError(String),

    #[error("Update aborted after {affected_rows} row(s): {source}")]
    UpdateAborted {
        affected_rows: u64,
        #[source]
        source: Box<RsqlError>,
    },
}

impl RsqlError {
    /// Errors raised while building a statement, before any stored data is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RsqlError::ParserError(_)
                | RsqlError::NoDatabaseSelected
                | RsqlError::DatabaseNotFound(_)
                | RsqlError::TableNotFound(_)
                | RsqlError::TableExists(_)
                | RsqlError::FieldNotFound { .. }
                | RsqlError::FieldTypeMismatch { .. }
                | RsqlError::InvalidInput(_)
                | RsqlError::InvalidDate(_)
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for RsqlError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RsqlError::LockError(e.to_string())
    }
}

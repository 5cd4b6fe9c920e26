use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionResult {
    TrxBeginSuccess,
    CommitSuccess,
    RollbackSuccess,
    Ddl(String), // drop
    Update {
        affected_rows: u64,
    },
}

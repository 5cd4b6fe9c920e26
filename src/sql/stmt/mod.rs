pub mod filter_stmt;
pub use filter_stmt::{FilterObj, FilterStmt, FilterUnit};
pub mod update_stmt;
pub use update_stmt::UpdateStmt;
pub mod drop_table_stmt;
pub use drop_table_stmt::DropTableStmt;

use crate::catalog::Db;
use crate::common::RsqlResult;

use super::parse_defs::SqlNode;

/// A parsed node after validation against the catalog.
pub enum Stmt {
    Update(UpdateStmt),
    DropTable(DropTableStmt),
    Begin,
    Commit,
    Rollback,
}

impl Stmt {
    pub fn create(db: Option<&Db>, node: &SqlNode) -> RsqlResult<Stmt> {
        Ok(match node {
            SqlNode::Update(node) => Stmt::Update(UpdateStmt::create(db, node)?),
            SqlNode::DropTable(node) => Stmt::DropTable(DropTableStmt::create(db, node)?),
            SqlNode::Begin => Stmt::Begin,
            SqlNode::Commit => Stmt::Commit,
            SqlNode::Rollback => Stmt::Rollback,
        })
    }
}

use std::fmt;
use std::sync::Arc;

use crate::sql::stmt::{FilterStmt, UpdateStmt};
use crate::storage::TableRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperatorType {
    TableGet,
    Predicate,
    Update,
}

impl fmt::Display for LogicalOperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicalOperatorType::TableGet => "TABLE_GET",
            LogicalOperatorType::Predicate => "PREDICATE",
            LogicalOperatorType::Update => "UPDATE",
        };
        write!(f, "{}", s)
    }
}

pub struct TableGetLogicalOperator {
    pub table: TableRef,
    pub table_name: String,
}

pub struct PredicateLogicalOperator {
    pub filter: FilterStmt,
    pub input: Box<LogicalOperator>,
}

/// Plan node carrying a validated update. It holds no logic of its own.
pub struct UpdateLogicalOperator {
    stmt: Arc<UpdateStmt>,
    input: Box<LogicalOperator>,
}

impl UpdateLogicalOperator {
    pub fn new(stmt: Arc<UpdateStmt>, input: LogicalOperator) -> Self {
        UpdateLogicalOperator {
            stmt,
            input: Box::new(input),
        }
    }

    pub fn stmt(&self) -> &Arc<UpdateStmt> {
        &self.stmt
    }

    pub fn input(&self) -> &LogicalOperator {
        &self.input
    }
}

pub enum LogicalOperator {
    TableGet(TableGetLogicalOperator),
    Predicate(PredicateLogicalOperator),
    Update(UpdateLogicalOperator),
}

impl LogicalOperator {
    pub fn kind(&self) -> LogicalOperatorType {
        match self {
            LogicalOperator::TableGet(_) => LogicalOperatorType::TableGet,
            LogicalOperator::Predicate(_) => LogicalOperatorType::Predicate,
            LogicalOperator::Update(_) => LogicalOperatorType::Update,
        }
    }

    pub fn children(&self) -> Vec<&LogicalOperator> {
        match self {
            LogicalOperator::TableGet(_) => vec![],
            LogicalOperator::Predicate(oper) => vec![oper.input.as_ref()],
            LogicalOperator::Update(oper) => vec![oper.input()],
        }
    }

    /// Node tags in pre-order, e.g. `UPDATE -> PREDICATE -> TABLE_GET`.
    pub fn explain(&self) -> String {
        let mut tags = vec![self.kind().to_string()];
        let mut children = self.children();
        while let Some(child) = children.pop() {
            tags.push(child.kind().to_string());
            children.extend(child.children());
        }
        tags.join(" -> ")
    }
}

pub struct LogicalPlanGenerator;

impl LogicalPlanGenerator {
    pub fn create_update(stmt: Arc<UpdateStmt>) -> LogicalOperator {
        let mut input = LogicalOperator::TableGet(TableGetLogicalOperator {
            table: stmt.table().clone(),
            table_name: stmt.table_name().to_string(),
        });
        if let Some(filter) = stmt.filter() {
            input = LogicalOperator::Predicate(PredicateLogicalOperator {
                filter: filter.clone(),
                input: Box::new(input),
            });
        }
        LogicalOperator::Update(UpdateLogicalOperator::new(stmt, input))
    }
}

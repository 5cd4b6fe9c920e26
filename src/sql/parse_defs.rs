use std::cmp::Ordering;
use std::fmt;

use crate::common::Value;

/// Comparison operator of one WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompOp {
    pub fn matches(&self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::NotEq => ord != Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::LtEq => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::GtEq => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompOp::Eq => "=",
            CompOp::NotEq => "<>",
            CompOp::Lt => "<",
            CompOp::LtEq => "<=",
            CompOp::Gt => ">",
            CompOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Attr(String),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionSqlNode {
    pub left: Operand,
    pub op: CompOp,
    pub right: Operand,
}

/// `UPDATE relation SET attribute = value [WHERE conditions]`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSqlNode {
    pub relation_name: String,
    pub attribute_name: String,
    pub value: Value,
    pub conditions: Vec<ConditionSqlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableSqlNode {
    pub relation_name: String,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlNode {
    Update(UpdateSqlNode),
    DropTable(DropTableSqlNode),
    Begin,
    Commit,
    Rollback,
}

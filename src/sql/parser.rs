use sqlparser::ast::{
    AssignmentTarget,
    BinaryOperator,
    Expr,
    ObjectType,
    Statement,
    TableFactor,
    UnaryOperator,
    Value as AstValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::common::{RsqlError, RsqlResult, Value};

use super::parse_defs::{
    CompOp, ConditionSqlNode, DropTableSqlNode, Operand, SqlNode, UpdateSqlNode,
};

/// Parse a batch of statements.
pub fn parse(sql: &str) -> RsqlResult<Vec<SqlNode>> {
    let dialect = GenericDialect {};
    let ast = Parser::parse_sql(&dialect, sql)
        .map_err(|e| RsqlError::ParserError(format!("{e}")))?;

    if ast.is_empty() {
        return Err(RsqlError::ParserError("Empty SQL".to_string()));
    }

    let mut nodes = Vec::with_capacity(ast.len());
    for stmt in ast.iter() {
        let node = match stmt {
            Statement::StartTransaction { .. } => SqlNode::Begin,
            Statement::Commit { .. } => SqlNode::Commit,
            Statement::Rollback { .. } => SqlNode::Rollback,
            Statement::Update(update) => {
                if !update.table.joins.is_empty() {
                    return Err(RsqlError::ParserError(
                        "UPDATE supports a single table only".to_string(),
                    ));
                }
                let relation_name = match &update.table.relation {
                    TableFactor::Table { name, .. } => name.to_string(),
                    other => {
                        return Err(RsqlError::ParserError(format!(
                            "Unsupported UPDATE target: {}",
                            other
                        )));
                    }
                };
                if update.assignments.len() != 1 {
                    return Err(RsqlError::ParserError(format!(
                        "UPDATE takes exactly one assignment, found {}",
                        update.assignments.len()
                    )));
                }
                let assignment = &update.assignments[0];
                let attribute_name = match &assignment.target {
                    AssignmentTarget::ColumnName(name) => name.to_string(),
                    other => {
                        return Err(RsqlError::ParserError(format!(
                            "Unsupported assignment target: {}",
                            other
                        )));
                    }
                };
                let value = parse_literal(&assignment.value)?;
                let mut conditions = vec![];
                if let Some(selection) = &update.selection {
                    collect_conditions(selection, &mut conditions)?;
                }
                SqlNode::Update(UpdateSqlNode {
                    relation_name,
                    attribute_name,
                    value,
                    conditions,
                })
            }
            Statement::Drop { object_type: ObjectType::Table, names, if_exists, .. } => {
                if names.len() != 1 {
                    return Err(RsqlError::ParserError(
                        "DROP TABLE takes exactly one table".to_string(),
                    ));
                }
                SqlNode::DropTable(DropTableSqlNode {
                    relation_name: names[0].to_string(),
                    if_exists: *if_exists,
                })
            }
            other => {
                return Err(RsqlError::ParserError(format!("Unsupported statement: {}", other)));
            }
        };
        debug!(target: "sql_debug", "parsed {:?}", node);
        nodes.push(node);
    }
    Ok(nodes)
}

fn collect_conditions(expr: &Expr, conditions: &mut Vec<ConditionSqlNode>) -> RsqlResult<()> {
    match expr {
        Expr::Nested(inner) => collect_conditions(inner, conditions),
        Expr::BinaryOp { left, op: BinaryOperator::And, right } => {
            collect_conditions(left, conditions)?;
            collect_conditions(right, conditions)
        }
        Expr::BinaryOp { left, op, right } => {
            let op = match op {
                BinaryOperator::Eq => CompOp::Eq,
                BinaryOperator::NotEq => CompOp::NotEq,
                BinaryOperator::Lt => CompOp::Lt,
                BinaryOperator::LtEq => CompOp::LtEq,
                BinaryOperator::Gt => CompOp::Gt,
                BinaryOperator::GtEq => CompOp::GtEq,
                other => {
                    return Err(RsqlError::ParserError(format!(
                        "Unsupported operator in WHERE: {}",
                        other
                    )));
                }
            };
            conditions.push(ConditionSqlNode {
                left: parse_operand(left)?,
                op,
                right: parse_operand(right)?,
            });
            Ok(())
        }
        other => Err(RsqlError::ParserError(format!("Unsupported WHERE expression: {}", other))),
    }
}

fn parse_operand(expr: &Expr) -> RsqlResult<Operand> {
    match expr {
        Expr::Identifier(ident) => Ok(Operand::Attr(ident.value.clone())),
        Expr::CompoundIdentifier(idents) => match idents.last() {
            Some(ident) => Ok(Operand::Attr(ident.value.clone())),
            None => Err(RsqlError::ParserError("Empty identifier".to_string())),
        },
        Expr::Nested(inner) => parse_operand(inner),
        _ => Ok(Operand::Value(parse_literal(expr)?)),
    }
}

fn parse_number(s: &str) -> RsqlResult<Value> {
    if let Ok(int) = s.parse::<i64>() {
        return Ok(Value::Int(int));
    }
    if let Ok(float) = s.parse::<f64>() {
        return Ok(Value::Float(float));
    }
    Err(RsqlError::ParserError(format!("Failed to parse number from string: {}", s)))
}

fn parse_literal(expr: &Expr) -> RsqlResult<Value> {
    match expr {
        Expr::Nested(inner) => parse_literal(inner),
        Expr::UnaryOp { op: UnaryOperator::Minus, expr: inner } => match &**inner {
            Expr::Value(v) => match &v.value {
                AstValue::Number(n, _) => parse_number(&format!("-{}", n)),
                other => Err(RsqlError::ParserError(format!("Cannot negate {}", other))),
            },
            other => Err(RsqlError::ParserError(format!("Cannot negate {}", other))),
        },
        Expr::Value(v) => match &v.value {
            AstValue::Number(n, _) => parse_number(n),
            AstValue::Boolean(b) => Ok(Value::Boolean(*b)),
            AstValue::Null => Ok(Value::Undefined),
            // text stays text until the target field is known
            AstValue::SingleQuotedString(s) => Ok(Value::Chars(s.clone())),
            other => Err(RsqlError::ParserError(format!("Unsupported literal: {}", other))),
        },
        other => Err(RsqlError::ParserError(format!("Expected a literal, found {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_update(sql: &str) -> UpdateSqlNode {
        match parse(sql).expect("parse").pop() {
            Some(SqlNode::Update(node)) => node,
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_with_conjunction() {
        let node = parse_update("UPDATE t SET name = 'a' WHERE id = 2 AND (score >= -1.5)");
        assert_eq!(node.relation_name, "t");
        assert_eq!(node.attribute_name, "name");
        assert_eq!(node.value, Value::Chars("a".into()));
        assert_eq!(node.conditions, vec![
            ConditionSqlNode {
                left: Operand::Attr("id".into()),
                op: CompOp::Eq,
                right: Operand::Value(Value::Int(2)),
            },
            ConditionSqlNode {
                left: Operand::Attr("score".into()),
                op: CompOp::GtEq,
                right: Operand::Value(Value::Float(-1.5)),
            },
        ]);
    }

    #[test]
    fn test_parse_literals() {
        // quoted text stays text, dates are resolved against the field later
        let date_like = parse_update("UPDATE t SET d = '2024-02-29'").value;
        assert_eq!(date_like, Value::Chars("2024-02-29".into()));
        let wide_digits = parse_update("UPDATE t SET d = '２０２４-01-01'").value;
        assert_eq!(wide_digits, Value::Chars("２０２４-01-01".into()));
        assert_eq!(parse_update("UPDATE t SET b = TRUE").value, Value::Boolean(true));
        assert_eq!(parse_update("UPDATE t SET n = NULL").value, Value::Undefined);
        assert_eq!(parse_update("UPDATE t SET n = -3").value, Value::Int(-3));
        assert_eq!(parse_update("UPDATE t SET s = '2024-1'").value, Value::Chars("2024-1".into()));
    }

    #[test]
    fn test_reject_unsupported_update_shapes() {
        assert!(matches!(parse("UPDATE t SET a = 1, b = 2"), Err(RsqlError::ParserError(_))));
        assert!(matches!(
            parse("UPDATE t SET a = 1 WHERE a = 1 OR a = 2"),
            Err(RsqlError::ParserError(_))
        ));
        assert!(matches!(parse("UPDATE t SET a = b"), Err(RsqlError::ParserError(_))));
        assert!(matches!(parse("SELECT 1"), Err(RsqlError::ParserError(_))));
        assert!(matches!(parse(""), Err(RsqlError::ParserError(_))));
    }

    #[test]
    fn test_parse_drop_and_transactions() {
        let nodes = parse("BEGIN; DROP TABLE IF EXISTS t; COMMIT; ROLLBACK;").expect("parse");
        assert_eq!(nodes, vec![
            SqlNode::Begin,
            SqlNode::DropTable(DropTableSqlNode { relation_name: "t".into(), if_exists: true }),
            SqlNode::Commit,
            SqlNode::Rollback,
        ]);
    }
}

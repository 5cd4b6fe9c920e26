use std::sync::Arc;

use tracing::{info, warn};

use crate::common::{RsqlError, RsqlResult};
use crate::execution::operator::PhysicalOperator;
use crate::sql::parse;
use crate::sql::parse_defs::SqlNode;
use crate::sql::planner::{LogicalOperator, LogicalPlanGenerator, PhysicalPlanGenerator};
use crate::sql::stmt::{Stmt, UpdateStmt};

use super::drop_table_executor::DropTableExecutor;
use super::result::ExecutionResult;
use super::session::Session;

fn commit_transaction(session: &mut Session) -> RsqlResult<()> {
    let Some(trx) = session.take_trx() else {
        return Err(RsqlError::InvalidInput("No active transaction to commit".to_string()));
    };
    let mut trx = trx.lock()?;
    trx.commit()
}

fn rollback_transaction(session: &mut Session) -> RsqlResult<()> {
    let Some(trx) = session.take_trx() else {
        return Err(RsqlError::InvalidInput("No active transaction to rollback".to_string()));
    };
    let mut trx = trx.lock()?;
    trx.rollback()?;
    Ok(())
}

/// Drive an update to exhaustion. The operator is closed on every path.
fn execute_update(session: &Session, stmt: UpdateStmt) -> RsqlResult<ExecutionResult> {
    let logical = LogicalPlanGenerator::create_update(Arc::new(stmt));
    let LogicalOperator::Update(update) = &logical else {
        return Err(RsqlError::ExecutionError(format!(
            "Expected an UPDATE plan, found {}",
            logical.kind()
        )));
    };
    info!("update plan: {}", logical.explain());

    let mut oper = PhysicalPlanGenerator::create_update(update, None);
    let run = oper.open(session.trx().cloned()).and_then(|_| {
        while oper.next()? {}
        Ok(())
    });
    let closed = oper.close();

    let affected_rows = oper.affected_rows();
    if let Err(e) = run {
        warn!(
            "update on {} aborted after {} row(s): {}",
            update.stmt().table_name(),
            affected_rows,
            e
        );
        return Err(RsqlError::UpdateAborted {
            affected_rows,
            source: Box::new(e),
        });
    }
    closed?;
    info!("update on {} changed {} row(s)", update.stmt().table_name(), affected_rows);
    Ok(ExecutionResult::Update { affected_rows })
}

fn execute_stmt(session: &Session, node: &SqlNode) -> RsqlResult<ExecutionResult> {
    let stmt = Stmt::create(session.current_db().map(|db| db.as_ref()), node)?;
    match stmt {
        Stmt::Update(stmt) => execute_update(session, stmt),
        Stmt::DropTable(stmt) => DropTableExecutor::execute(session, &stmt),
        Stmt::Begin | Stmt::Commit | Stmt::Rollback => Err(RsqlError::ExecutionError(
            "Transaction control reached the statement path".to_string(),
        )),
    }
}

fn execute_inner(session: &mut Session, sql: &str) -> RsqlResult<Vec<ExecutionResult>> {
    let nodes = parse(sql)?;
    let mut results = vec![];
    for node in nodes.iter() {
        match node {
            SqlNode::Begin => {
                session.begin_trx()?;
                results.push(ExecutionResult::TrxBeginSuccess);
            }
            SqlNode::Commit => {
                commit_transaction(session)?;
                results.push(ExecutionResult::CommitSuccess);
            }
            SqlNode::Rollback => {
                rollback_transaction(session)?;
                results.push(ExecutionResult::RollbackSuccess);
            }
            SqlNode::Update(_) | SqlNode::DropTable(_) => {
                let auto_trx = session.trx().is_none();
                if auto_trx {
                    // auto begin transaction
                    session.begin_trx()?;
                }
                let res = execute_stmt(session, node)?;
                if auto_trx {
                    commit_transaction(session)?;
                }
                results.push(res);
            }
        }
    }
    Ok(results)
}

/// Execute a batch of SQL statements in the session.
/// Any failure rolls back the active transaction before the error is returned.
/// A failed rollback is logged, the statement's own error is what the caller sees.
pub fn execute(session: &mut Session, sql: &str) -> RsqlResult<Vec<ExecutionResult>> {
    info!("Executing SQL: {}", sql);
    match execute_inner(session, sql) {
        Ok(res) => {
            info!("SQL {} executed successfully", sql);
            Ok(res)
        }
        Err(e) => {
            if e.is_validation() {
                info!("SQL {} rejected: {}", sql, e);
            } else {
                warn!("SQL {} execution failed: {}", sql, e);
            }
            if session.trx().is_some() {
                if let Err(rollback_err) = rollback_transaction(session) {
                    warn!("rollback after failed SQL {} also failed: {}", sql, rollback_err);
                }
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttrInfo, Handler};
    use crate::common::{AttrType, Value};
    use crate::config::DEFAULT_DB_NAME;
    use crate::storage::{Rid, TableRef};

    fn chars(s: &str) -> Value {
        Value::Chars(s.to_string())
    }

    /// Session on the default db holding T(id int, name chars) indexed on name,
    /// with rows (1,"a") and (2,"b").
    fn setup_session() -> (Session, TableRef) {
        let handler = Arc::new(Handler::with_default_db().expect("handler"));
        let mut session = Session::new(handler);
        session.set_current_db(DEFAULT_DB_NAME).expect("use db");
        let table = session.current_db().expect("db").create_table("t", &[
            AttrInfo::new("id", AttrType::Ints, 0),
            AttrInfo::new("name", AttrType::Chars, 16),
        ]).expect("create table");
        {
            let mut t = table.write().expect("lock");
            t.create_index("i_name", "name", false).expect("index");
            t.insert_record(&[Value::Int(1), chars("a")]).expect("insert");
            t.insert_record(&[Value::Int(2), chars("b")]).expect("insert");
        }
        (session, table)
    }

    fn name_of(table: &TableRef, rid: Rid) -> Value {
        let t = table.read().expect("lock");
        let field = t.meta().field("name").expect("field").clone();
        t.get_record(rid).expect("get").get_value(&field).expect("read")
    }

    #[test]
    fn test_update_filtered_row() {
        let (mut session, table) = setup_session();
        let res = execute(&mut session, "UPDATE t SET name = 'a' WHERE id = 2").expect("update");
        assert_eq!(res, vec![ExecutionResult::Update { affected_rows: 1 }]);
        assert_eq!(name_of(&table, Rid::new(0, 1)), chars("a"));

        let t = table.read().expect("lock");
        let index = t.find_index("i_name").expect("index");
        assert_eq!(index.lookup(&chars("a")), vec![Rid::new(0, 0), Rid::new(0, 1)]);
        assert!(index.lookup(&chars("b")).is_empty());
        assert!(session.trx().is_none());
    }

    #[test]
    fn test_update_unchanged_row() {
        let (mut session, table) = setup_session();
        let res = execute(&mut session, "UPDATE t SET name = 'a' WHERE id = 1").expect("update");
        assert_eq!(res, vec![ExecutionResult::Update { affected_rows: 0 }]);
        let t = table.read().expect("lock");
        let index = t.find_index("i_name").expect("index");
        assert_eq!(index.lookup(&chars("b")), vec![Rid::new(0, 1)]);
    }

    #[test]
    fn test_update_without_database() {
        let handler = Arc::new(Handler::with_default_db().expect("handler"));
        let mut session = Session::new(handler);
        assert!(matches!(
            execute(&mut session, "UPDATE t SET name = 'a'"),
            Err(RsqlError::NoDatabaseSelected)
        ));
    }

    #[test]
    fn test_validation_errors_surface_unwrapped() {
        let (mut session, _table) = setup_session();
        assert!(matches!(
            execute(&mut session, "UPDATE x SET name = 'a'"),
            Err(RsqlError::TableNotFound(_))
        ));
        assert!(matches!(
            execute(&mut session, "UPDATE t SET nope = 'a'"),
            Err(RsqlError::FieldNotFound { .. })
        ));
        assert!(matches!(
            execute(&mut session, "UPDATE t SET name = 1"),
            Err(RsqlError::FieldTypeMismatch { .. })
        ));
        assert!(matches!(
            execute(&mut session, "UPDATE t SET name = 'a' WHERE id = 'x'"),
            Err(RsqlError::FieldTypeMismatch { .. })
        ));
        assert!(session.trx().is_none());
    }

    #[test]
    fn test_failed_update_reports_partial_count_and_rolls_back() {
        let (mut session, table) = setup_session();
        table.write().expect("lock").create_index("u_id", "id", true).expect("unique index");

        let err = execute(&mut session, "UPDATE t SET id = 5").expect_err("second row collides");
        match err {
            RsqlError::UpdateAborted { affected_rows, source } => {
                assert_eq!(affected_rows, 1);
                assert!(matches!(*source, RsqlError::IndexError(_)));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let t = table.read().expect("lock");
        let id = t.meta().field("id").expect("field").clone();
        let id_of = |rid| t.get_record(rid).expect("get").get_value(&id).expect("read");
        assert_eq!(id_of(Rid::new(0, 0)), Value::Int(1));
        assert_eq!(id_of(Rid::new(0, 1)), Value::Int(2));
        t.check_indexes().expect("consistent after rollback");
        assert!(t.find_index("u_id").expect("index").lookup(&Value::Int(5)).is_empty());
    }

    #[test]
    fn test_failed_rollback_keeps_update_error() {
        let (mut session, table) = setup_session();
        let gone = {
            let mut t = table.write().expect("lock");
            t.create_index("u_id", "id", true).expect("unique index");
            t.insert_record(&[Value::Int(3), chars("c")]).expect("insert")
        };
        execute(&mut session, "BEGIN").expect("begin");
        execute(&mut session, "UPDATE t SET name = 'z' WHERE id = 3").expect("update");
        // its undo can no longer be applied
        table.write().expect("lock").delete_record(gone).expect("delete");

        let err = execute(&mut session, "UPDATE t SET id = 5").expect_err("second row collides");
        assert!(matches!(err, RsqlError::UpdateAborted { affected_rows: 1, .. }));
        assert!(session.trx().is_none());
    }

    #[test]
    fn test_date_shaped_text_through_sql() {
        let (mut session, table) = setup_session();
        let res = execute(&mut session, "UPDATE t SET name = '2024-01-01' WHERE id = 1")
            .expect("chars field");
        assert_eq!(res, vec![ExecutionResult::Update { affected_rows: 1 }]);
        assert_eq!(name_of(&table, Rid::new(0, 0)), chars("2024-01-01"));

        let events = session.current_db().expect("db").create_table("events", &[
            AttrInfo::new("id", AttrType::Ints, 0),
            AttrInfo::new("day", AttrType::Dates, 0),
        ]).expect("create table");
        events
            .write()
            .expect("lock")
            .insert_record(&[Value::Int(1), Value::Undefined])
            .expect("insert");

        let res =
            execute(&mut session, "UPDATE events SET day = '2024-01-01'").expect("dates field");
        assert_eq!(res, vec![ExecutionResult::Update { affected_rows: 1 }]);
        let res = execute(
            &mut session,
            "UPDATE events SET day = '2024-1-1' WHERE day = '2024-01-01'",
        )
        .expect("same date");
        assert_eq!(res, vec![ExecutionResult::Update { affected_rows: 0 }]);
        assert!(matches!(
            execute(&mut session, "UPDATE events SET day = '2023-02-29'"),
            Err(RsqlError::InvalidDate(_))
        ));

        let t = events.read().expect("lock");
        let day = t.meta().field("day").expect("field").clone();
        assert_eq!(
            t.get_record(Rid::new(0, 0)).expect("get").get_value(&day).expect("read"),
            Value::date(2024, 1, 1).expect("date")
        );
    }

    #[test]
    fn test_explicit_transaction_rollback_and_commit() {
        let (mut session, table) = setup_session();
        let res =
            execute(&mut session, "BEGIN; UPDATE t SET name = 'z'; ROLLBACK;").expect("batch");
        assert_eq!(res, vec![
            ExecutionResult::TrxBeginSuccess,
            ExecutionResult::Update { affected_rows: 2 },
            ExecutionResult::RollbackSuccess,
        ]);
        assert_eq!(name_of(&table, Rid::new(0, 0)), chars("a"));
        assert_eq!(name_of(&table, Rid::new(0, 1)), chars("b"));
        table.read().expect("lock").check_indexes().expect("consistent");

        execute(&mut session, "BEGIN").expect("begin");
        execute(&mut session, "UPDATE t SET name = 'z' WHERE id = 1").expect("update");
        assert!(session.trx().is_some());
        execute(&mut session, "COMMIT").expect("commit");
        assert_eq!(name_of(&table, Rid::new(0, 0)), chars("z"));
        assert!(matches!(execute(&mut session, "COMMIT"), Err(RsqlError::InvalidInput(_))));
    }

    #[test]
    fn test_drop_table_through_sql() {
        let (mut session, _table) = setup_session();
        let res = execute(&mut session, "DROP TABLE t").expect("drop");
        assert_eq!(res, vec![ExecutionResult::Ddl("Table t dropped".to_string())]);
        assert!(matches!(execute(&mut session, "DROP TABLE t"), Err(RsqlError::TableNotFound(_))));
        execute(&mut session, "DROP TABLE IF EXISTS t").expect("if exists");
        assert!(matches!(
            execute(&mut session, "UPDATE t SET name = 'a'"),
            Err(RsqlError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_result_serializes() {
        let json = serde_json::to_string(&ExecutionResult::Update { affected_rows: 3 })
            .expect("serialize");
        assert_eq!(json, r#"{"Update":{"affected_rows":3}}"#);
    }
}

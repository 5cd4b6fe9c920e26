pub mod logical;
pub use logical::{
    LogicalOperator,
    LogicalOperatorType,
    LogicalPlanGenerator,
    PredicateLogicalOperator,
    TableGetLogicalOperator,
    UpdateLogicalOperator,
};
pub mod physical;
pub use physical::PhysicalPlanGenerator;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{AttrInfo, Db};
    use crate::common::{AttrType, Value};
    use crate::execution::operator::PhysicalOperatorType;
    use crate::sql::parse_defs::{CompOp, ConditionSqlNode, Operand, UpdateSqlNode};
    use crate::sql::stmt::UpdateStmt;

    fn stmt(db: &Db, filtered: bool) -> Arc<UpdateStmt> {
        let conditions = if filtered {
            vec![ConditionSqlNode {
                left: Operand::Attr("id".into()),
                op: CompOp::Eq,
                right: Operand::Value(Value::Int(1)),
            }]
        } else {
            vec![]
        };
        Arc::new(UpdateStmt::create(Some(db), &UpdateSqlNode {
            relation_name: "t".into(),
            attribute_name: "id".into(),
            value: Value::Int(9),
            conditions,
        }).expect("stmt"))
    }

    #[test]
    fn test_update_plan_shapes() {
        let db = Db::new("test");
        db.create_table("t", &[AttrInfo::new("id", AttrType::Ints, 0)]).expect("create table");

        let plain = LogicalPlanGenerator::create_update(stmt(&db, false));
        assert_eq!(plain.kind(), LogicalOperatorType::Update);
        assert_eq!(plain.kind().to_string(), "UPDATE");
        assert_eq!(plain.explain(), "UPDATE -> TABLE_GET");

        let filtered = LogicalPlanGenerator::create_update(stmt(&db, true));
        assert_eq!(filtered.explain(), "UPDATE -> PREDICATE -> TABLE_GET");
        let LogicalOperator::Update(update) = &filtered else {
            panic!("expected an update node");
        };
        assert_eq!(update.stmt().field().name(), "id");

        let physical = PhysicalPlanGenerator::create(&filtered, None);
        assert_eq!(physical.kind(), PhysicalOperatorType::Update);
        let typed = PhysicalPlanGenerator::create_update(update, None);
        assert_eq!(typed.affected_rows(), 0);
    }
}

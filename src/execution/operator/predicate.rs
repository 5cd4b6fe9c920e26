use crate::common::{RsqlError, RsqlResult};
use crate::sql::stmt::FilterStmt;
use crate::storage::Record;
use crate::transaction::TrxRef;

use super::{PhysicalOperator, PhysicalOperatorType, Tuple};

/// Passes through the child's rows that satisfy a filter.
pub struct PredicatePhysicalOperator {
    filter: FilterStmt,
    child: Option<Box<dyn PhysicalOperator>>,
}

impl PredicatePhysicalOperator {
    pub fn new(filter: FilterStmt) -> Self {
        PredicatePhysicalOperator { filter, child: None }
    }

    pub fn add_child(&mut self, child: Box<dyn PhysicalOperator>) {
        self.child = Some(child);
    }
}

impl PhysicalOperator for PredicatePhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::Predicate
    }

    fn open(&mut self, trx: Option<TrxRef>) -> RsqlResult<()> {
        match self.child.as_mut() {
            Some(child) => child.open(trx),
            None => Ok(()),
        }
    }

    fn next(&mut self) -> RsqlResult<bool> {
        let Some(child) = self.child.as_mut() else {
            return Ok(false);
        };
        while child.next()? {
            let tuple = child.current_tuple().ok_or_else(|| {
                RsqlError::ExecutionError("Predicate child produced no tuple".to_string())
            })?;
            if self.filter.filter(tuple)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> RsqlResult<()> {
        match self.child.as_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.child.as_ref().and_then(|child| child.current_tuple())
    }

    fn current_tuple_mut(&mut self) -> Option<&mut dyn Tuple> {
        self.child.as_mut().and_then(|child| child.current_tuple_mut())
    }

    fn current_record_mut(&mut self) -> Option<&mut Record> {
        self.child.as_mut().and_then(|child| child.current_record_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttrInfo, Db, TableMeta};
    use crate::common::{AttrType, Value};
    use crate::execution::operator::TableScanPhysicalOperator;
    use crate::sql::parse_defs::{CompOp, ConditionSqlNode, Operand};
    use crate::storage::Table;

    #[test]
    fn test_predicate_filters_rows() {
        let meta =
            TableMeta::new(1, "t", &[AttrInfo::new("id", AttrType::Ints, 0)]).expect("schema");
        let field = meta.fields()[0].clone();
        let filter = FilterStmt::create(&Db::new("test"), &meta, &[ConditionSqlNode {
            left: Operand::Attr("id".into()),
            op: CompOp::GtEq,
            right: Operand::Value(Value::Int(3)),
        }]).expect("filter");
        let mut table = Table::new(meta);
        for i in 0..5 {
            table.insert_record(&[Value::Int(i)]).expect("insert");
        }

        let mut predicate = PredicatePhysicalOperator::new(filter);
        predicate.add_child(Box::new(TableScanPhysicalOperator::new(table.into_ref())));
        predicate.open(None).expect("open");
        let mut seen = vec![];
        while predicate.next().expect("next") {
            seen.push(predicate.current_tuple().expect("tuple").find_cell(&field).expect("cell"));
            assert!(predicate.current_record_mut().is_some());
        }
        assert_eq!(seen, vec![Value::Int(3), Value::Int(4)]);
        predicate.close().expect("close");
    }

    #[test]
    fn test_predicate_without_child() {
        let mut predicate = PredicatePhysicalOperator::new(FilterStmt::default());
        predicate.open(None).expect("open");
        assert!(!predicate.next().expect("next"));
        assert!(predicate.current_tuple().is_none());
        predicate.close().expect("close");
    }
}

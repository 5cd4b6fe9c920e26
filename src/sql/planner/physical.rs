use crate::execution::operator::{
    PhysicalOperator,
    PredicatePhysicalOperator,
    TableScanPhysicalOperator,
    UpdatePhysicalOperator,
};
use crate::transaction::TrxRef;

use super::logical::{LogicalOperator, UpdateLogicalOperator};

pub struct PhysicalPlanGenerator;

impl PhysicalPlanGenerator {
    pub fn create(oper: &LogicalOperator, trx: Option<TrxRef>) -> Box<dyn PhysicalOperator> {
        match oper {
            LogicalOperator::TableGet(get) => {
                Box::new(TableScanPhysicalOperator::new(get.table.clone()))
            }
            LogicalOperator::Predicate(pred) => {
                let mut predicate = PredicatePhysicalOperator::new(pred.filter.clone());
                predicate.add_child(Self::create(&pred.input, trx));
                Box::new(predicate)
            }
            LogicalOperator::Update(update) => Box::new(Self::create_update(update, trx)),
        }
    }

    /// Typed variant so callers can read `affected_rows` afterwards.
    pub fn create_update(
        oper: &UpdateLogicalOperator,
        trx: Option<TrxRef>,
    ) -> UpdatePhysicalOperator {
        let mut update = UpdatePhysicalOperator::new(oper.stmt().clone(), trx.clone());
        update.add_child(Self::create(oper.input(), trx));
        update
    }
}

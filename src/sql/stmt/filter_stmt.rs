use tracing::warn;

use crate::catalog::{Db, FieldMeta, TableMeta};
use crate::common::{AttrType, RsqlError, RsqlResult, Value};
use crate::execution::operator::Tuple;
use crate::sql::parse_defs::{CompOp, ConditionSqlNode, Operand};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterObj {
    Field(FieldMeta),
    Value(Value),
}

impl FilterObj {
    fn attr_type(&self) -> AttrType {
        match self {
            FilterObj::Field(field) => field.attr_type(),
            FilterObj::Value(value) => value.attr_type(),
        }
    }

    fn eval(&self, tuple: &dyn Tuple) -> RsqlResult<Value> {
        match self {
            FilterObj::Field(field) => tuple.find_cell(field),
            FilterObj::Value(value) => Ok(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterUnit {
    pub left: FilterObj,
    pub comp: CompOp,
    pub right: FilterObj,
}

/// Conjunction of resolved comparisons over one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterStmt {
    units: Vec<FilterUnit>,
}

impl FilterStmt {
    pub fn create(
        _db: &Db,
        table_meta: &TableMeta,
        conditions: &[ConditionSqlNode],
    ) -> RsqlResult<FilterStmt> {
        let mut units = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let left = resolve(table_meta, &condition.left)?;
            let right = resolve(table_meta, &condition.right)?;
            let (left, right) = coerce(left, right)?;
            let (lt, rt) = (left.attr_type(), right.attr_type());
            if lt != rt && lt != AttrType::Undefined && rt != AttrType::Undefined {
                let field = match (&left, &right) {
                    (FilterObj::Field(f), _) | (_, FilterObj::Field(f)) => f.name().to_string(),
                    _ => String::new(),
                };
                warn!(
                    "condition type mismatch on {}.{}: {} vs {}",
                    table_meta.name(),
                    field,
                    lt,
                    rt
                );
                return Err(RsqlError::FieldTypeMismatch {
                    table: table_meta.name().to_string(),
                    field,
                    expected: lt,
                    actual: rt,
                });
            }
            units.push(FilterUnit { left, comp: condition.op, right });
        }
        Ok(FilterStmt { units })
    }

    pub fn units(&self) -> &[FilterUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// True when every comparison holds. A comparison touching NULL never holds.
    pub fn filter(&self, tuple: &dyn Tuple) -> RsqlResult<bool> {
        for unit in self.units.iter() {
            let left = unit.left.eval(tuple)?;
            let right = unit.right.eval(tuple)?;
            if left.is_null() || right.is_null() {
                return Ok(false);
            }
            if !unit.comp.matches(left.compare(&right)) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn resolve(table_meta: &TableMeta, operand: &Operand) -> RsqlResult<FilterObj> {
    match operand {
        Operand::Attr(name) => match table_meta.field(name) {
            Some(field) => Ok(FilterObj::Field(field.clone())),
            None => Err(RsqlError::FieldNotFound {
                table: table_meta.name().to_string(),
                field: name.clone(),
            }),
        },
        Operand::Value(value) => Ok(FilterObj::Value(value.clone())),
    }
}

/// Cast a literal to the type of the field on the other side of the comparison.
fn coerce(left: FilterObj, right: FilterObj) -> RsqlResult<(FilterObj, FilterObj)> {
    match (left, right) {
        (FilterObj::Field(field), FilterObj::Value(value)) => {
            let value = value.cast_for(field.attr_type())?;
            Ok((FilterObj::Field(field), FilterObj::Value(value)))
        }
        (FilterObj::Value(value), FilterObj::Field(field)) => {
            let value = value.cast_for(field.attr_type())?;
            Ok((FilterObj::Value(value), FilterObj::Field(field)))
        }
        other => Ok(other),
    }
}

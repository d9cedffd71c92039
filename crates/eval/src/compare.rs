//! Comparison of fact values.
//!
//! Numbers compare as `rust_decimal::Decimal` (never `f64`), dates as
//! calendar dates. Labels and booleans support only `=` and `!=`.
//! Mismatched operand types are a `TypeError`; the evaluator degrades
//! such a leaf to UNKNOWN rather than failing the traversal.

use std::cmp::Ordering;

use civicnav_catalog::CompareOp;

use crate::types::{EvalError, FactValue};

/// Apply `left <op> right`.
pub fn compare_values(left: &FactValue, op: CompareOp, right: &FactValue) -> Result<bool, EvalError> {
    match (left, right) {
        (FactValue::Number(l), FactValue::Number(r)) => Ok(apply_ordering(l.cmp(r), op)),
        (FactValue::Date(l), FactValue::Date(r)) => Ok(apply_ordering(l.cmp(r), op)),
        (FactValue::Bool(l), FactValue::Bool(r)) => equality_only(l == r, op, "boolean"),
        (FactValue::Label(l), FactValue::Label(r)) => equality_only(l == r, op, "label"),
        _ => Err(EvalError::TypeError {
            message: format!(
                "cannot compare {} with {} using '{}'",
                left.type_name(),
                right.type_name(),
                op
            ),
        }),
    }
}

fn apply_ordering(ord: Ordering, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
    }
}

fn equality_only(equal: bool, op: CompareOp, type_name: &str) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(equal),
        CompareOp::Ne => Ok(!equal),
        _ => Err(EvalError::TypeError {
            message: format!(
                "operator '{}' not defined for {}; {} supports only = and !=",
                op, type_name, type_name
            ),
        }),
    }
}

//! Two-variable specialisations of the constraint factories.
//!
//! The builder routes two-variable constraints through these so that the
//! resulting predicates become directed arcs and AC-3 can prune both
//! endpoints directly instead of going through the slower generalised
//! support search.

use std::collections::HashSet;
use std::sync::Arc;

use crate::solver::constraint::BinaryFn;
use crate::solver::value::{CmpOp, Value};

pub fn not_equal() -> BinaryFn {
    Arc::new(|a, b| !a.equals(b))
}

pub fn equal() -> BinaryFn {
    Arc::new(|a, b| a.equals(b))
}

/// `a op b` with numeric promotion on equality and numeric-only ordering.
pub fn compare(op: CmpOp) -> BinaryFn {
    Arc::new(move |a, b| op.eval(a, b))
}

/// `a + b op target`.
pub fn sum(op: CmpOp, target: f64) -> BinaryFn {
    weighted_sum(op, target, [1.0, 1.0])
}

/// `w₀·a + w₁·b op target`.
pub fn weighted_sum(op: CmpOp, target: f64, weights: [f64; 2]) -> BinaryFn {
    Arc::new(move |a, b| match (a.as_num(), b.as_num()) {
        (Some(x), Some(y)) => op.eval_num(weights[0] * x + weights[1] * y, target),
        _ => false,
    })
}

/// `a * b op target`.
pub fn product(op: CmpOp, target: f64) -> BinaryFn {
    Arc::new(move |a, b| match (a.as_num(), b.as_num()) {
        (Some(x), Some(y)) => op.eval_num(x * y, target),
        _ => false,
    })
}

/// `lo <(=) a + b <(=) hi`.
pub(crate) fn sum_bounded(lo: f64, lo_strict: bool, hi: f64, hi_strict: bool) -> BinaryFn {
    Arc::new(move |a, b| match (a.as_num(), b.as_num()) {
        (Some(x), Some(y)) => {
            let total = x + y;
            let above = if lo_strict { total > lo } else { total >= lo };
            let below = if hi_strict { total < hi } else { total <= hi };
            above && below
        }
        _ => false,
    })
}

pub fn in_set(set: Vec<Value>) -> BinaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |a, b| members.contains(a) && members.contains(b))
}

pub fn not_in_set(set: Vec<Value>) -> BinaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |a, b| !members.contains(a) && !members.contains(b))
}

pub fn some_in_set(set: Vec<Value>, count: usize) -> BinaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |a, b| {
        let hits = usize::from(members.contains(a)) + usize::from(members.contains(b));
        hits >= count
    })
}

pub fn some_not_in_set(set: Vec<Value>, count: usize) -> BinaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |a, b| {
        let hits = usize::from(!members.contains(a)) + usize::from(!members.contains(b));
        hits >= count
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons() {
        assert!(not_equal()(&Value::Int(1), &Value::Int(2)));
        assert!(equal()(&Value::Int(2), &Value::Real(2.0)));
        assert!(compare(CmpOp::Lt)(&Value::Int(1), &Value::Int(2)));
        assert!(!compare(CmpOp::Lt)(
            &Value::symbol("a"),
            &Value::symbol("b")
        ));
    }

    #[test]
    fn arithmetic_pairs() {
        assert!(sum(CmpOp::Eq, 5.0)(&Value::Int(2), &Value::Int(3)));
        assert!(weighted_sum(CmpOp::Eq, 35.0, [25.0, 10.0])(
            &Value::Int(1),
            &Value::Int(1)
        ));
        assert!(product(CmpOp::Ge, 6.0)(&Value::Int(2), &Value::Int(3)));
        assert!(!sum(CmpOp::Eq, 5.0)(&Value::symbol("x"), &Value::Int(3)));
    }

    #[test]
    fn set_pairs() {
        let set = vec![Value::Int(1), Value::Int(2)];
        assert!(in_set(set.clone())(&Value::Int(1), &Value::Int(2)));
        assert!(!in_set(set.clone())(&Value::Int(1), &Value::Int(3)));
        assert!(some_in_set(set, 1)(&Value::Int(9), &Value::Int(2)));
    }
}

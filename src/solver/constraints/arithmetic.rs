//! Sum and product constraints over numeric domains.

use std::sync::Arc;

use crate::solver::constraint::NaryFn;
use crate::solver::value::{CmpOp, Value};

/// Outcome of folding the assigned values of a constraint.
pub(crate) enum Fold {
    Num(f64),
    /// At least one variable has no value yet; the predicate stays
    /// optimistic.
    Missing,
    /// A non-numeric value reached an arithmetic predicate.
    Bad,
}

pub(crate) fn fold_sum(slots: &[Option<&Value>], weights: Option<&[f64]>) -> Fold {
    let mut total = 0.0;
    for (i, slot) in slots.iter().enumerate() {
        let Some(value) = slot else {
            return Fold::Missing;
        };
        let Some(n) = value.as_num() else {
            return Fold::Bad;
        };
        let w = weights.map_or(1.0, |ws| ws[i]);
        total += w * n;
    }
    Fold::Num(total)
}

pub(crate) fn fold_product(slots: &[Option<&Value>]) -> Fold {
    // The empty product is 1.
    let mut total = 1.0;
    for slot in slots {
        let Some(value) = slot else {
            return Fold::Missing;
        };
        let Some(n) = value.as_num() else {
            return Fold::Bad;
        };
        total *= n;
    }
    Fold::Num(total)
}

fn sum_cmp(op: CmpOp, target: f64, weights: Option<Vec<f64>>) -> NaryFn {
    Arc::new(move |slots| match fold_sum(slots, weights.as_deref()) {
        Fold::Num(total) => op.eval_num(total, target),
        Fold::Missing => true,
        Fold::Bad => false,
    })
}

fn product_cmp(op: CmpOp, target: f64) -> NaryFn {
    Arc::new(move |slots| match fold_product(slots) {
        Fold::Num(total) => op.eval_num(total, target),
        Fold::Missing => true,
        Fold::Bad => false,
    })
}

/// `Σ vᵢ == target`.
pub fn exact_sum(target: f64) -> NaryFn {
    sum_cmp(CmpOp::Eq, target, None)
}

/// `Σ wᵢ·vᵢ == target`; `weights` must match the constraint's arity.
pub fn exact_sum_weighted(target: f64, weights: Vec<f64>) -> NaryFn {
    sum_cmp(CmpOp::Eq, target, Some(weights))
}

/// `Σ vᵢ >= target`.
pub fn min_sum(target: f64) -> NaryFn {
    sum_cmp(CmpOp::Ge, target, None)
}

pub fn min_sum_weighted(target: f64, weights: Vec<f64>) -> NaryFn {
    sum_cmp(CmpOp::Ge, target, Some(weights))
}

/// `Σ vᵢ <= target`.
pub fn max_sum(target: f64) -> NaryFn {
    sum_cmp(CmpOp::Le, target, None)
}

pub fn max_sum_weighted(target: f64, weights: Vec<f64>) -> NaryFn {
    sum_cmp(CmpOp::Le, target, Some(weights))
}

/// `lo <= Σ vᵢ <= hi`, both bounds inclusive.
pub fn sum_in_range(lo: f64, hi: f64) -> NaryFn {
    sum_bounded(lo, false, hi, false)
}

/// Range sum with independently strict bounds; the inclusive form is
/// [`sum_in_range`].
pub(crate) fn sum_bounded(lo: f64, lo_strict: bool, hi: f64, hi_strict: bool) -> NaryFn {
    Arc::new(move |slots| match fold_sum(slots, None) {
        Fold::Num(total) => {
            let above = if lo_strict { total > lo } else { total >= lo };
            let below = if hi_strict { total < hi } else { total <= hi };
            above && below
        }
        Fold::Missing => true,
        Fold::Bad => false,
    })
}

/// `Π vᵢ == target`.
pub fn exact_product(target: f64) -> NaryFn {
    product_cmp(CmpOp::Eq, target)
}

/// `Π vᵢ >= target`.
pub fn min_product(target: f64) -> NaryFn {
    product_cmp(CmpOp::Ge, target)
}

/// `Π vᵢ <= target`.
pub fn max_product(target: f64) -> NaryFn {
    product_cmp(CmpOp::Le, target)
}

/// `v₀ + v₁ + … == v_last`: the last variable holds the sum of the others.
pub fn sum_equals_var() -> NaryFn {
    Arc::new(|slots| {
        let (target, terms) = match slots.split_last() {
            Some(split) => split,
            None => return true,
        };
        let Some(target) = target else {
            return true;
        };
        match (fold_sum(terms, None), target.as_num()) {
            (Fold::Num(total), Some(t)) => CmpOp::Eq.eval_num(total, t),
            (Fold::Missing, _) => true,
            _ => false,
        }
    })
}

/// `v₀ * v₁ * … == v_last`.
pub fn product_equals_var() -> NaryFn {
    Arc::new(|slots| {
        let (target, terms) = match slots.split_last() {
            Some(split) => split,
            None => return true,
        };
        let Some(target) = target else {
            return true;
        };
        match (fold_product(terms), target.as_num()) {
            (Fold::Num(total), Some(t)) => CmpOp::Eq.eval_num(total, t),
            (Fold::Missing, _) => true,
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(f: &NaryFn, values: &[Option<i64>]) -> bool {
        let owned: Vec<Option<Value>> = values.iter().map(|v| v.map(Value::Int)).collect();
        let view: Vec<Option<&Value>> = owned.iter().map(|v| v.as_ref()).collect();
        f(&view)
    }

    #[test]
    fn exact_sum_complete_and_partial() {
        let f = exact_sum(6.0);
        assert!(check(&f, &[Some(1), Some(2), Some(3)]));
        assert!(!check(&f, &[Some(1), Some(2), Some(4)]));
        assert!(check(&f, &[Some(1), None, Some(4)]));
    }

    #[test]
    fn weighted_sum_applies_multipliers() {
        let f = exact_sum_weighted(100.0, vec![25.0, 10.0, 5.0]);
        assert!(check(&f, &[Some(2), Some(4), Some(2)]));
        assert!(!check(&f, &[Some(2), Some(4), Some(3)]));
    }

    #[test]
    fn non_numeric_values_fail() {
        let f = exact_sum(1.0);
        let red = Value::symbol("red");
        let view = vec![Some(&red)];
        assert!(!f(&view));
    }

    #[test]
    fn bounds_and_ranges() {
        assert!(check(&min_sum(5.0), &[Some(2), Some(3)]));
        assert!(!check(&min_sum(6.0), &[Some(2), Some(3)]));
        assert!(check(&max_sum(5.0), &[Some(2), Some(3)]));
        assert!(check(&sum_in_range(4.0, 6.0), &[Some(2), Some(3)]));
        assert!(!check(&sum_in_range(6.0, 9.0), &[Some(2), Some(3)]));
    }

    #[test]
    fn products() {
        assert!(check(&exact_product(12.0), &[Some(3), Some(4)]));
        assert!(check(&min_product(10.0), &[Some(3), Some(4)]));
        assert!(!check(&max_product(10.0), &[Some(3), Some(4)]));
    }

    #[test]
    fn variable_equations_target_last_slot() {
        let f = sum_equals_var();
        assert!(check(&f, &[Some(2), Some(3), Some(5)]));
        assert!(!check(&f, &[Some(2), Some(3), Some(6)]));
        assert!(check(&f, &[Some(2), None, Some(6)]));

        let g = product_equals_var();
        assert!(check(&g, &[Some(2), Some(3), Some(6)]));
        assert!(!check(&g, &[Some(2), Some(3), Some(5)]));
    }
}

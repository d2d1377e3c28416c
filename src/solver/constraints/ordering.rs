//! Monotone-sequence constraints along the constraint's variable order.

use std::sync::Arc;

use crate::solver::constraint::NaryFn;
use crate::solver::value::CmpOp;

/// Pairwise comparison chain: `v₀ op₀ v₁ op₁ v₂ …`. A pair with an
/// unassigned side is skipped and rechecked once both sides are known.
pub(crate) fn chain(ops: Vec<CmpOp>) -> NaryFn {
    Arc::new(move |slots| {
        slots
            .windows(2)
            .zip(ops.iter())
            .all(|(pair, op)| match (pair[0], pair[1]) {
                (Some(a), Some(b)) => op.eval(a, b),
                _ => true,
            })
    })
}

fn uniform(op: CmpOp) -> NaryFn {
    Arc::new(move |slots| {
        slots.windows(2).all(|pair| match (pair[0], pair[1]) {
            (Some(a), Some(b)) => op.eval(a, b),
            _ => true,
        })
    })
}

/// `v₀ <= v₁ <= …`.
pub fn ascending() -> NaryFn {
    uniform(CmpOp::Le)
}

/// `v₀ < v₁ < …`.
pub fn strictly_ascending() -> NaryFn {
    uniform(CmpOp::Lt)
}

/// `v₀ >= v₁ >= …`.
pub fn descending() -> NaryFn {
    uniform(CmpOp::Ge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::value::Value;

    fn check(f: &NaryFn, values: &[Option<i64>]) -> bool {
        let owned: Vec<Option<Value>> = values.iter().map(|v| v.map(Value::Int)).collect();
        let view: Vec<Option<&Value>> = owned.iter().map(|v| v.as_ref()).collect();
        f(&view)
    }

    #[test]
    fn ascending_skips_open_pairs() {
        let f = ascending();
        assert!(check(&f, &[Some(1), Some(1), Some(3)]));
        assert!(check(&f, &[Some(3), None, Some(1)]));
        assert!(!check(&f, &[Some(3), Some(1)]));
    }

    #[test]
    fn strict_and_descending() {
        assert!(!check(&strictly_ascending(), &[Some(1), Some(1)]));
        assert!(check(&strictly_ascending(), &[Some(1), Some(2), Some(5)]));
        assert!(check(&descending(), &[Some(5), Some(5), Some(2)]));
        assert!(!check(&descending(), &[Some(2), Some(5)]));
    }

    #[test]
    fn mixed_chain() {
        let f = chain(vec![CmpOp::Lt, CmpOp::Le]);
        assert!(check(&f, &[Some(1), Some(2), Some(2)]));
        assert!(!check(&f, &[Some(1), Some(1), Some(2)]));
    }
}

//! Set-membership constraints.

use std::collections::HashSet;
use std::sync::Arc;

use crate::solver::constraint::NaryFn;
use crate::solver::value::Value;

/// Every assigned variable's value is a member of `set`.
pub fn in_set(set: Vec<Value>) -> NaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |slots| slots.iter().flatten().all(|v| members.contains(*v)))
}

/// No assigned variable's value is a member of `set`.
pub fn not_in_set(set: Vec<Value>) -> NaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |slots| slots.iter().flatten().all(|v| !members.contains(*v)))
}

/// At least `count` of the variables take a value in `set`. While some
/// variables are unassigned the predicate only fails once membership has
/// become unreachable.
pub fn some_in_set(set: Vec<Value>, count: usize) -> NaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |slots| {
        let missing = slots.iter().filter(|s| s.is_none()).count();
        let hits = slots
            .iter()
            .flatten()
            .filter(|v| members.contains(**v))
            .count();
        hits + missing >= count
    })
}

/// At least `count` of the variables take a value outside `set`.
pub fn some_not_in_set(set: Vec<Value>, count: usize) -> NaryFn {
    let members: HashSet<Value> = set.into_iter().collect();
    Arc::new(move |slots| {
        let missing = slots.iter().filter(|s| s.is_none()).count();
        let hits = slots
            .iter()
            .flatten()
            .filter(|v| !members.contains(**v))
            .count();
        hits + missing >= count
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    fn check(f: &NaryFn, values: &[Option<i64>]) -> bool {
        let owned: Vec<Option<Value>> = values.iter().map(|v| v.map(Value::Int)).collect();
        let view: Vec<Option<&Value>> = owned.iter().map(|v| v.as_ref()).collect();
        f(&view)
    }

    #[test]
    fn membership_ignores_unassigned() {
        let f = in_set(ints(&[1, 2, 3]));
        assert!(check(&f, &[Some(1), None, Some(3)]));
        assert!(!check(&f, &[Some(1), Some(4)]));

        let g = not_in_set(ints(&[1, 2, 3]));
        assert!(check(&g, &[Some(5), None]));
        assert!(!check(&g, &[Some(5), Some(2)]));
    }

    #[test]
    fn counted_membership_fails_only_when_unreachable() {
        let f = some_in_set(ints(&[1, 2]), 2);
        assert!(check(&f, &[Some(1), Some(2), Some(9)]));
        assert!(check(&f, &[Some(1), None, Some(9)]));
        assert!(!check(&f, &[Some(8), Some(9), Some(1)]));
    }
}

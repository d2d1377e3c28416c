//! Uniqueness constraints: all-different and all-equal.

use std::collections::HashSet;
use std::sync::Arc;

use crate::solver::constraint::NaryFn;

/// True iff no two assigned variables share a value. A duplicate among the
/// values seen so far is a definite violation even while other variables
/// are still open.
pub fn all_different() -> NaryFn {
    Arc::new(|slots| {
        let mut seen = HashSet::new();
        slots.iter().flatten().all(|v| seen.insert(*v))
    })
}

/// True iff every assigned variable holds the same value (vacuously true
/// when fewer than two are assigned).
pub fn all_equal() -> NaryFn {
    Arc::new(|slots| {
        let mut values = slots.iter().flatten();
        match values.next() {
            Some(first) => values.all(|v| v.equals(first)),
            None => true,
        }
    })
}

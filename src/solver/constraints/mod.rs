//! Reusable predicate factories for the common constraint families.
//!
//! Each factory returns an [`NaryFn`](crate::solver::constraint::NaryFn)
//! closed over its parameters; the [`binary`] module holds the
//! two-variable specialisations the builder prefers when a constraint
//! mentions exactly two variables.
//!
//! All n-ary predicates follow the optimistic contract: a missing value
//! never counts as a violation, a non-numeric value fed to an arithmetic
//! predicate always does.

pub mod arithmetic;
pub mod binary;
pub mod cardinality;
pub mod membership;
pub mod ordering;

pub use arithmetic::{
    exact_product, exact_sum, exact_sum_weighted, max_product, max_sum, max_sum_weighted,
    min_product, min_sum, min_sum_weighted, product_equals_var, sum_equals_var, sum_in_range,
};
pub use cardinality::{all_different, all_equal};
pub use membership::{in_set, not_in_set, some_in_set, some_not_in_set};
pub use ordering::{ascending, descending, strictly_ascending};

//! Satis is a general-purpose constraint satisfaction problem (CSP)
//! solver.
//!
//! A problem is a set of named variables, a finite domain of candidate
//! values for each, and a set of constraints restricting which
//! combinations are admissible. The systematic solver runs depth-first
//! backtracking with forward checking — AC-3 over binary constraints and
//! generalised arc consistency over n-ary ones — guided by
//! minimum-remaining-values variable selection and least-constraining
//! value ordering. Solutions can be taken one at a time or streamed
//! lazily in a deterministic order. A min-conflicts local search is
//! available as a stochastic alternative for large, loosely constrained
//! problems.
//!
//! # Core concepts
//!
//! - **[`Problem`]**: the fluent builder and solver entry point.
//! - **[`Value`]** / **[`Domain`]**: tagged domain values (integers,
//!   reals, text, symbols, opaque tuples) and ordered candidate sets.
//! - **[`Predicate`]**: a constraint test, binary or n-ary. Built-in
//!   factories live in [`constraints`]; strings like `"A + B == C"` are
//!   compiled by [`Problem::add_string_constraint`].
//!
//! # Example: map colouring
//!
//! ```
//! use satis::{Domain, Problem};
//!
//! let mut problem = Problem::new();
//! problem
//!     .add_variables(&["WA", "NT", "SA"], Domain::symbols(["red", "green", "blue"]))
//!     .unwrap();
//! problem.add_string_constraint("WA != NT").unwrap();
//! problem.add_string_constraint("WA != SA").unwrap();
//! problem.add_string_constraint("NT != SA").unwrap();
//!
//! let solution = problem.solve().expect("three colours suffice");
//! assert_ne!(solution["WA"], solution["NT"]);
//! assert_ne!(solution["NT"], solution["SA"]);
//! assert_eq!(problem.count_solutions(), 6);
//! ```

pub mod error;
pub mod solver;

pub use error::{Error, Result};
pub use solver::{
    constraint::{BinaryFn, NaryFn, Predicate, VarId},
    constraints,
    domain::Domain,
    expr::{parse_constraint, ParsedConstraint},
    problem::{Problem, Solution, SolveOptions, StepCallback},
    search::Solutions,
    stats::{render_problem_summary, render_search_stats, SearchStats},
    value::{CmpOp, Value},
};

/// One-shot solver for the all-different problem over a shared domain.
pub fn solve_all_different(vars: &[&str], domain: Domain) -> Result<Option<Solution>> {
    let mut problem = Problem::new();
    problem.add_variables(vars, domain)?;
    problem.add_all_different(vars)?;
    Ok(problem.solve())
}

/// One-shot solver: declares every variable over `domain`, compiles the
/// given constraint strings, and returns the first solution.
pub fn solve_with_constraints(
    vars: &[&str],
    domain: Domain,
    constraints: &[&str],
) -> Result<Option<Solution>> {
    let mut problem = Problem::new();
    problem.add_variables(vars, domain)?;
    for expr in constraints {
        problem.add_string_constraint(expr)?;
    }
    Ok(problem.solve())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_all_different() {
        let solution = solve_all_different(&["A", "B", "C"], Domain::int_range(1, 3))
            .unwrap()
            .unwrap();
        let mut values: Vec<i64> = solution
            .values()
            .map(|v| v.as_num().unwrap() as i64)
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn one_shot_string_constraints() {
        let solution =
            solve_with_constraints(&["A", "B"], Domain::int_range(1, 3), &["A < B", "B == 2"])
                .unwrap()
                .unwrap();
        assert_eq!(solution["A"], Value::Int(1));
        assert_eq!(solution["B"], Value::Int(2));
    }

    #[test]
    fn construction_errors_surface_through_the_shortcuts() {
        assert!(solve_with_constraints(&["A"], Domain::int_range(1, 3), &["A < Missing"]).is_err());
    }
}

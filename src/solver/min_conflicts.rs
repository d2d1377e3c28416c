//! Min-conflicts local search over complete assignments.
//!
//! Starts from a uniformly random total assignment and repeatedly moves a
//! conflicted variable to a value violating as few constraints as
//! possible. Incomplete by design: it can miss solutions of satisfiable
//! problems, but is often effective on large, loosely constrained ones.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::solver::constraint::VarId;
use crate::solver::problem::{Solution, SolveContext};
use crate::solver::value::Value;

pub(crate) fn run<R: Rng>(ctx: &SolveContext, max_steps: usize, rng: &mut R) -> Option<Solution> {
    let problem = ctx.problem;

    let mut current: Vec<Value> = problem
        .domains
        .iter()
        .map(|domain| {
            let pick = rng.gen_range(0..domain.len());
            domain.iter().nth(pick).cloned().expect("domain is non-empty")
        })
        .collect();

    for step in 0..max_steps {
        let conflicted = conflicted_vars(ctx, &current);
        if conflicted.is_empty() {
            debug!(step, "min-conflicts reached a consistent assignment");
            return Some(problem.names.iter().cloned().zip(current).collect());
        }

        let &var = conflicted
            .choose(rng)
            .expect("conflict set is non-empty here");

        let mut best: Vec<Value> = Vec::new();
        let mut best_count = usize::MAX;
        for value in problem.domains[var].iter() {
            let count = violations(ctx, &current, var, value);
            if count < best_count {
                best_count = count;
                best.clear();
                best.push(value.clone());
            } else if count == best_count {
                best.push(value.clone());
            }
        }
        current[var] = best
            .choose(rng)
            .cloned()
            .expect("domain is non-empty");
    }

    debug!(max_steps, "min-conflicts exhausted its step budget");
    None
}

/// Every variable mentioned by a currently violated constraint, sorted so
/// a seeded run is reproducible.
fn conflicted_vars(ctx: &SolveContext, current: &[Value]) -> Vec<VarId> {
    let mut conflicted = HashSet::new();

    // Arcs are installed in pairs; the even one carries the user's
    // orientation, and one check per constraint is enough here.
    for arc in ctx.problem.arcs.iter().step_by(2) {
        if !arc.check(&current[arc.head], &current[arc.tail]) {
            conflicted.insert(arc.head);
            conflicted.insert(arc.tail);
        }
    }
    for cons in &ctx.problem.narys {
        let slots: Vec<Option<&Value>> = cons.vars.iter().map(|&v| Some(&current[v])).collect();
        if !cons.check(&slots) {
            conflicted.extend(cons.vars.iter().copied());
        }
    }

    let mut vars: Vec<VarId> = conflicted.into_iter().collect();
    vars.sort_unstable();
    vars
}

/// Number of constraints that would be violated with `var` moved to
/// `value`, everything else held fixed.
fn violations(ctx: &SolveContext, current: &[Value], var: VarId, value: &Value) -> usize {
    let mut count = 0;

    // One arc per user constraint has `var` as its tail.
    for &arc_id in &ctx.arcs_by_tail[var] {
        let arc = &ctx.problem.arcs[arc_id];
        if !arc.check(&current[arc.head], value) {
            count += 1;
        }
    }
    for &cons_id in &ctx.nary_by_var[var] {
        let cons = &ctx.problem.narys[cons_id];
        let slots: Vec<Option<&Value>> = cons
            .vars
            .iter()
            .map(|&v| Some(if v == var { value } else { &current[v] }))
            .collect();
        if !cons.check(&slots) {
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::domain::Domain;
    use crate::solver::problem::Problem;

    #[test]
    fn repairs_a_loose_problem() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B"], Domain::int_range(1, 3)).unwrap();
        p.add_all_different(&["A", "B"]).unwrap();

        // A fix always exists within two repairs, whatever the seed.
        let solution = p.solve_with_min_conflicts_seeded(100, 7).unwrap();
        assert_ne!(solution["A"], solution["B"]);
    }

    #[test]
    fn gives_up_on_the_pigeonhole() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B", "C"], Domain::int_range(1, 2)).unwrap();
        p.add_all_different(&["A", "B", "C"]).unwrap();
        assert_eq!(p.solve_with_min_conflicts_seeded(200, 3), None);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B", "C", "D"], Domain::int_range(1, 4)).unwrap();
        p.add_all_different(&["A", "B", "C", "D"]).unwrap();
        let one = p.solve_with_min_conflicts_seeded(500, 42);
        let two = p.solve_with_min_conflicts_seeded(500, 42);
        assert_eq!(one, two);
    }

    #[test]
    fn eight_queens_solutions_are_valid_when_found() {
        let names: Vec<String> = (1..=8).map(|i| format!("Q{i}")).collect();
        let vars: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut p = Problem::new();
        p.add_variables(&vars, Domain::int_range(1, 8)).unwrap();
        p.add_all_different(&vars).unwrap();
        for i in 0..8 {
            for j in (i + 1)..8 {
                let gap = (j - i) as i64;
                p.add_constraint(
                    &[vars[i], vars[j]],
                    crate::solver::constraint::Predicate::binary(move |a, b| {
                        match (a.as_num(), b.as_num()) {
                            (Some(x), Some(y)) => (x - y).abs() != gap as f64,
                            _ => false,
                        }
                    }),
                )
                .unwrap();
            }
        }

        if let Some(solution) = p.solve_with_min_conflicts_seeded(2000, 11) {
            for i in 0..8 {
                for j in (i + 1)..8 {
                    let a = solution[&names[i]].as_num().unwrap();
                    let b = solution[&names[j]].as_num().unwrap();
                    assert_ne!(a, b);
                    assert_ne!((a - b).abs(), (j - i) as f64);
                }
            }
        }
    }
}

//! The consistency engine: AC-3 over binary arcs and generalised arc
//! consistency over n-ary constraints.

use tracing::debug;

use crate::solver::constraint::{NaryConstraint, VarId};
use crate::solver::domain::Domain;
use crate::solver::problem::SolveContext;
use crate::solver::stats::SearchStats;
use crate::solver::value::Value;
use crate::solver::work_queue::WorkQueue;

/// Current domain of every variable, indexed by [`VarId`]. Persistent, so
/// each search frame clones it in O(1) amortised.
pub(crate) type Domains = im::Vector<Domain>;

/// Runs AC-3 and then GAC over `domains` in place. Returns `false` when a
/// domain wipes out, leaving `domains` in an unspecified (but safe) state;
/// the caller discards it on failure.
pub(crate) fn propagate(ctx: &SolveContext, domains: &mut Domains, stats: &mut SearchStats) -> bool {
    ac3(ctx, domains, stats) && gac(ctx, domains, stats)
}

/// Arc consistency over the directed binary arcs: a tail value survives
/// only while some head value supports it. Domains only ever shrink.
pub(crate) fn ac3(ctx: &SolveContext, domains: &mut Domains, stats: &mut SearchStats) -> bool {
    let mut queue = WorkQueue::new();
    queue.extend(0..ctx.problem.arcs.len());

    while let Some(arc_id) = queue.pop_front() {
        let arc = &ctx.problem.arcs[arc_id];
        stats.arc_revisions += 1;

        let head_domain = &domains[arc.head];
        let tail_domain = &domains[arc.tail];
        let reduced = tail_domain.retain(|y| head_domain.iter().any(|x| arc.check(x, y)));
        if reduced.len() == tail_domain.len() {
            continue;
        }

        stats.prunings += 1;
        if reduced.is_empty() {
            debug!(arc = %arc.label, variable = arc.tail, "domain wiped out during AC-3");
            return false;
        }
        let tail = arc.tail;
        domains.set(tail, reduced);
        queue.extend(ctx.arcs_by_head[tail].iter().copied());
    }
    true
}

/// Generalised arc consistency: for every n-ary constraint and every
/// member variable, a value survives only if the other variables can be
/// completed into a full local assignment the predicate accepts.
pub(crate) fn gac(ctx: &SolveContext, domains: &mut Domains, stats: &mut SearchStats) -> bool {
    let mut queue = WorkQueue::new();
    queue.extend(0..ctx.problem.narys.len());

    while let Some(cons_id) = queue.pop_front() {
        let cons = &ctx.problem.narys[cons_id];
        stats.gac_revisions += 1;

        for (focal_pos, &var) in cons.vars.iter().enumerate() {
            // A repeated variable is revised once, at its first position.
            if cons.vars[..focal_pos].contains(&var) {
                continue;
            }

            let domain = &domains[var];
            stats.support_checks += domain.len() as u64;
            let reduced = domain.retain(|value| has_support(cons, focal_pos, value, domains));
            if reduced.len() == domain.len() {
                continue;
            }

            stats.prunings += 1;
            if reduced.is_empty() {
                debug!(constraint = %cons.label, variable = var, "domain wiped out during GAC");
                return false;
            }
            domains.set(var, reduced);
            queue.extend(ctx.nary_by_var[var].iter().copied());
        }
    }
    true
}

/// Support test: can the constraint's other variables be assigned from
/// their current domains so that the predicate holds with `value` at the
/// focal position?
fn has_support(cons: &NaryConstraint, focal_pos: usize, value: &Value, domains: &Domains) -> bool {
    let focal_var = cons.vars[focal_pos];
    let mut slots: Vec<Option<&Value>> = vec![None; cons.vars.len()];
    for (pos, &var) in cons.vars.iter().enumerate() {
        if var == focal_var {
            slots[pos] = Some(value);
        }
    }

    // Each distinct remaining variable is assigned once; repeated
    // positions share its value.
    let mut order: Vec<VarId> = Vec::new();
    for &var in &cons.vars {
        if var != focal_var && !order.contains(&var) {
            order.push(var);
        }
    }

    support_dfs(cons, domains, &mut slots, &order)
}

// The predicate is consulted on every partial assignment along the way;
// its optimistic contract means `false` on a prefix proves the whole
// subtree unsupported.
fn support_dfs<'a>(
    cons: &NaryConstraint,
    domains: &'a Domains,
    slots: &mut Vec<Option<&'a Value>>,
    order: &[VarId],
) -> bool {
    if !cons.check(slots) {
        return false;
    }
    let Some((&var, rest)) = order.split_first() else {
        return true;
    };
    for candidate in domains[var].iter() {
        for (pos, &v) in cons.vars.iter().enumerate() {
            if v == var {
                slots[pos] = Some(candidate);
            }
        }
        if support_dfs(cons, domains, slots, rest) {
            return true;
        }
    }
    for (pos, &v) in cons.vars.iter().enumerate() {
        if v == var {
            slots[pos] = None;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::problem::Problem;

    fn initial_domains(problem: &Problem) -> Domains {
        problem.domains.iter().cloned().collect()
    }

    #[test]
    fn ac3_prunes_both_endpoints_of_a_relation() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B"], Domain::int_range(1, 3))
            .unwrap();
        p.add_string_constraint("A < B").unwrap();

        let ctx = SolveContext::new(&p);
        let mut domains = initial_domains(&p);
        let mut stats = SearchStats::default();
        assert!(ac3(&ctx, &mut domains, &mut stats));

        let a: Vec<_> = domains[0].iter().cloned().collect();
        let b: Vec<_> = domains[1].iter().cloned().collect();
        assert_eq!(a, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(b, vec![Value::Int(2), Value::Int(3)]);
        assert!(stats.prunings >= 2);
    }

    #[test]
    fn ac3_reports_wipeout() {
        let mut p = Problem::new();
        p.add_variable("A", Domain::int_range(1, 3)).unwrap();
        p.add_variable("B", Domain::singleton(Value::Int(1))).unwrap();
        p.add_string_constraint("A < B").unwrap();

        let ctx = SolveContext::new(&p);
        let mut domains = initial_domains(&p);
        assert!(!ac3(&ctx, &mut domains, &mut SearchStats::default()));
    }

    #[test]
    fn gac_wipes_out_the_pigeonhole() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B", "C"], Domain::int_range(1, 2))
            .unwrap();
        p.add_all_different(&["A", "B", "C"]).unwrap();

        let ctx = SolveContext::new(&p);
        let mut domains = initial_domains(&p);
        assert!(!gac(&ctx, &mut domains, &mut SearchStats::default()));
    }

    #[test]
    fn gac_keeps_only_supported_values() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B", "C"], Domain::int_range(1, 4))
            .unwrap();
        // A + B + C == 10 with C pinned to 4 leaves {2,3,4} for A and B...
        p.add_string_constraint("A + B + C == 10").unwrap();
        p.add_string_constraint("C == 4").unwrap();

        let ctx = SolveContext::new(&p);
        let mut domains = initial_domains(&p);
        let mut stats = SearchStats::default();
        assert!(gac(&ctx, &mut domains, &mut stats));

        let a: Vec<_> = domains[0].iter().cloned().collect();
        assert_eq!(a, vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
        let c: Vec<_> = domains[2].iter().cloned().collect();
        assert_eq!(c, vec![Value::Int(4)]);
        assert!(stats.support_checks > 0);
    }

    #[test]
    fn propagation_is_monotone() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B", "C"], Domain::int_range(1, 5))
            .unwrap();
        p.add_string_constraint("A < B").unwrap();
        p.add_string_constraint("A + B + C == 6").unwrap();

        let ctx = SolveContext::new(&p);
        let mut domains = initial_domains(&p);
        let before: Vec<usize> = domains.iter().map(Domain::len).collect();
        assert!(propagate(&ctx, &mut domains, &mut SearchStats::default()));
        for (id, old_len) in before.iter().enumerate() {
            assert!(domains[id].len() <= *old_len);
            // Every surviving value came from the original domain.
            for value in domains[id].iter() {
                assert!(p.domains[id].contains(value));
            }
        }
    }
}

//! The systematic solver: depth-first backtracking with forward checking.

use std::collections::HashMap;

use tracing::debug;

use crate::solver::domain::Domain;
use crate::solver::heuristics;
use crate::solver::problem::{Problem, Solution, SolveContext};
use crate::solver::propagation::{self, Domains};
use crate::solver::stats::SearchStats;
use crate::solver::value::Value;
use crate::solver::constraint::VarId;

/// One node of the search tree: the values committed so far plus the
/// (propagated) domains of every variable. Committed variables keep a
/// singleton domain, so the two views always agree.
struct SearchState {
    assigned: im::HashMap<VarId, Value>,
    domains: Domains,
}

/// The children of one branching decision, in least-constraining order.
struct Frame {
    branches: std::vec::IntoIter<SearchState>,
}

/// Lazy, deterministic enumeration of every solution.
///
/// The search runs a frame at a time as the consumer pulls: variables are
/// picked by minimum remaining values (degree as tie-break), candidate
/// values by how much room their propagated state leaves the other
/// variables. Values whose propagation wipes out a domain cannot lead to
/// a solution and are dropped on the spot. Dropping the iterator abandons
/// the search; it is not restartable.
pub struct Solutions<'p> {
    ctx: SolveContext<'p>,
    stack: Vec<Frame>,
    stats: SearchStats,
}

impl<'p> Solutions<'p> {
    pub(crate) fn new(problem: &'p Problem) -> Self {
        let ctx = SolveContext::new(problem);
        let mut stats = SearchStats::default();
        let mut domains: Domains = problem.domains.iter().cloned().collect();
        let mut stack = Vec::new();

        if propagation::propagate(&ctx, &mut domains, &mut stats) {
            let root = SearchState {
                assigned: im::HashMap::new(),
                domains,
            };
            stack.push(Frame {
                branches: vec![root].into_iter(),
            });
        } else {
            debug!("initial propagation proved the problem unsolvable");
        }

        Self { ctx, stack, stats }
    }

    /// Counters accumulated so far; final once the iterator is exhausted.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Tries every value of one chosen variable and keeps the branches
    /// that survive propagation, best-scored first.
    fn expand(&mut self, state: SearchState) -> Vec<SearchState> {
        let Some(var) = heuristics::select_variable(&self.ctx, &state.assigned, &state.domains)
        else {
            return Vec::new();
        };

        let values: Vec<Value> = state.domains[var].iter().cloned().collect();
        let mut scored: Vec<(u64, SearchState)> = Vec::with_capacity(values.len());

        for value in values {
            self.stats.nodes_visited += 1;
            let mut domains = state.domains.clone();
            domains.set(var, Domain::singleton(value.clone()));
            let assigned = state.assigned.update(var, value);
            self.notify_step(&assigned, &domains);

            if propagation::propagate(&self.ctx, &mut domains, &mut self.stats) {
                let score = heuristics::lcv_score(&domains, var);
                scored.push((score, SearchState { assigned, domains }));
            } else {
                self.stats.backtracks += 1;
            }
        }

        // Stable sort: branches with equal scores stay in domain order,
        // which keeps the enumeration deterministic.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, state)| state).collect()
    }

    fn notify_step(&self, assigned: &im::HashMap<VarId, Value>, domains: &Domains) {
        let options = &self.ctx.problem.options;
        if let Some(callback) = &options.callback {
            let names = &self.ctx.problem.names;
            let mut committed = HashMap::new();
            let mut open = HashMap::new();
            for (var, name) in names.iter().enumerate() {
                match assigned.get(&var) {
                    Some(value) => {
                        committed.insert(name.clone(), value.clone());
                    }
                    None => {
                        open.insert(name.clone(), domains[var].clone());
                    }
                }
            }
            callback(&committed, &open);
        }
        if let Some(delay) = options.time_step {
            std::thread::sleep(delay);
        }
    }

    fn to_solution(&self, state: &SearchState) -> Solution {
        self.ctx
            .problem
            .names
            .iter()
            .enumerate()
            .map(|(var, name)| {
                let value = state.assigned.get(&var).cloned().expect("state is total");
                (name.clone(), value)
            })
            .collect()
    }
}

impl<'p> Iterator for Solutions<'p> {
    type Item = Solution;

    fn next(&mut self) -> Option<Solution> {
        while let Some(frame) = self.stack.last_mut() {
            match frame.branches.next() {
                None => {
                    self.stack.pop();
                    self.stats.backtracks += 1;
                }
                Some(state) => {
                    if state.assigned.len() == self.ctx.var_count() {
                        debug!(nodes = self.stats.nodes_visited, "solution found");
                        return Some(self.to_solution(&state));
                    }
                    let branches = self.expand(state);
                    self.stack.push(Frame {
                        branches: branches.into_iter(),
                    });
                }
            }
        }
        None
    }
}

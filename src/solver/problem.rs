//! The problem model and its fluent builder.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand_core::SeedableRng;

use crate::error::{Error, Result};
use crate::solver::constraint::{BinaryArc, BinaryFn, NaryConstraint, NaryFn, Predicate, VarId};
use crate::solver::constraints::{self, binary};
use crate::solver::domain::Domain;
use crate::solver::expr::parse_constraint;
use crate::solver::min_conflicts;
use crate::solver::search::Solutions;
use crate::solver::stats::SearchStats;
use crate::solver::value::{CmpOp, Value};

/// A total assignment satisfying every constraint.
pub type Solution = HashMap<String, Value>;

/// Observer invoked once per tentative assignment with snapshots of the
/// committed values and of the remaining domains. The callback must treat
/// both maps as read-only.
pub type StepCallback = Arc<dyn Fn(&HashMap<String, Value>, &HashMap<String, Domain>) + Send + Sync>;

/// Presentation options for a solve run.
#[derive(Clone, Default)]
pub struct SolveOptions {
    /// Extra delay inserted after each search step, purely as a
    /// visualisation aid.
    pub time_step: Option<Duration>,
    pub callback: Option<StepCallback>,
}

impl fmt::Debug for SolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveOptions")
            .field("time_step", &self.time_step)
            .field("callback", &self.callback.as_ref().map(|_| "..."))
            .finish()
    }
}

/// A constraint satisfaction problem under construction.
///
/// Variables, domains and constraints are only mutable through this
/// builder; each solve entry point clones the initial domains, so the
/// problem can be solved repeatedly and extended between runs.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    pub(crate) names: Vec<String>,
    pub(crate) index: HashMap<String, VarId>,
    pub(crate) domains: Vec<Domain>,
    pub(crate) arcs: Vec<BinaryArc>,
    pub(crate) narys: Vec<NaryConstraint>,
    pub(crate) options: SolveOptions,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable with its initial domain. A domain of size one
    /// acts as a pre-assigned clue.
    pub fn add_variable(&mut self, name: impl Into<String>, domain: Domain) -> Result<&mut Self> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateVariable(name));
        }
        if domain.is_empty() {
            return Err(Error::EmptyDomain(name));
        }
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.domains.push(domain);
        Ok(self)
    }

    /// Declares several variables sharing one domain.
    pub fn add_variables(&mut self, names: &[&str], domain: Domain) -> Result<&mut Self> {
        for name in names {
            self.add_variable(*name, domain.clone())?;
        }
        Ok(self)
    }

    /// Attaches a predicate to the named variables, routing on arity:
    /// exactly two variables require a binary predicate (installed as a
    /// pair of directed arcs); one, or three or more, require an n-ary
    /// predicate.
    pub fn add_constraint(&mut self, vars: &[&str], predicate: Predicate) -> Result<&mut Self> {
        let label = match &predicate {
            Predicate::Binary(_) => format!("binary({})", vars.join(", ")),
            Predicate::Nary(_) => format!("nary({})", vars.join(", ")),
        };
        self.route(vars, predicate, label)
    }

    /// Compiles a constraint expression and installs the result.
    pub fn add_string_constraint(&mut self, expr: &str) -> Result<&mut Self> {
        let parsed = parse_constraint(expr, &self.index)?;
        let vars: Vec<&str> = parsed.variables.iter().map(String::as_str).collect();
        self.route(&vars, parsed.predicate, expr.to_string())
    }

    fn route(&mut self, vars: &[&str], predicate: Predicate, label: String) -> Result<&mut Self> {
        let ids = self.resolve(vars)?;
        match (ids.len(), predicate) {
            (2, Predicate::Binary(_)) if ids[0] == ids[1] => Err(Error::InvalidConstraint(
                format!("binary constraint needs two distinct variables, got `{}` twice", vars[0]),
            )),
            (2, Predicate::Binary(test)) => {
                self.install_arcs(ids[0], ids[1], test, label);
                Ok(self)
            }
            (n, Predicate::Binary(_)) => Err(Error::ArityMismatch {
                vars: n,
                predicate: "binary",
            }),
            (0, _) => Err(Error::ArityMismatch {
                vars: 0,
                predicate: "n-ary",
            }),
            (2, Predicate::Nary(_)) => Err(Error::ArityMismatch {
                vars: 2,
                predicate: "n-ary",
            }),
            (_, Predicate::Nary(test)) => {
                self.narys.push(NaryConstraint {
                    vars: ids,
                    test,
                    label,
                });
                Ok(self)
            }
        }
    }

    fn resolve(&self, vars: &[&str]) -> Result<Vec<VarId>> {
        vars.iter()
            .map(|name| {
                self.index
                    .get(*name)
                    .copied()
                    .ok_or_else(|| Error::UnknownVariable(name.to_string()))
            })
            .collect()
    }

    // A single user-level binary constraint becomes two directed arcs, so
    // AC-3 can prune either endpoint even when the test is asymmetric.
    fn install_arcs(&mut self, a: VarId, b: VarId, test: BinaryFn, label: String) {
        let swapped = test.clone();
        self.arcs.push(BinaryArc {
            head: a,
            tail: b,
            test,
            label: label.clone(),
        });
        self.arcs.push(BinaryArc {
            head: b,
            tail: a,
            test: Arc::new(move |head, tail| swapped(tail, head)),
            label,
        });
    }

    fn add_binary(&mut self, vars: &[&str], test: BinaryFn, label: String) -> Result<&mut Self> {
        self.route(vars, Predicate::Binary(test), label)
    }

    fn add_nary(&mut self, vars: &[&str], test: NaryFn, label: String) -> Result<&mut Self> {
        self.route(vars, Predicate::Nary(test), label)
    }

    // Built-in helpers. Two-variable calls go through the binary
    // specialisations so the constraint lands on the arc queue.

    pub fn add_all_different(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let label = format!("all_different({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::not_equal(), label)
        } else {
            self.add_nary(vars, constraints::all_different(), label)
        }
    }

    pub fn add_all_equal(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let label = format!("all_equal({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::equal(), label)
        } else {
            self.add_nary(vars, constraints::all_equal(), label)
        }
    }

    pub fn add_exact_sum(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        self.add_sum(vars, CmpOp::Eq, target)
    }

    pub fn add_min_sum(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        self.add_sum(vars, CmpOp::Ge, target)
    }

    pub fn add_max_sum(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        self.add_sum(vars, CmpOp::Le, target)
    }

    fn add_sum(&mut self, vars: &[&str], op: CmpOp, target: f64) -> Result<&mut Self> {
        let label = format!("sum({}) {} {}", vars.join(" + "), op.symbol(), target);
        if vars.len() == 2 {
            return self.add_binary(vars, binary::sum(op, target), label);
        }
        let test = match op {
            CmpOp::Eq => constraints::exact_sum(target),
            CmpOp::Ge => constraints::min_sum(target),
            _ => constraints::max_sum(target),
        };
        self.add_nary(vars, test, label)
    }

    /// `Σ wᵢ·vᵢ == target`; one weight per variable.
    pub fn add_exact_sum_weighted(
        &mut self,
        vars: &[&str],
        target: f64,
        weights: &[f64],
    ) -> Result<&mut Self> {
        if weights.len() != vars.len() {
            return Err(Error::InvalidConstraint(format!(
                "{} weights for {} variables",
                weights.len(),
                vars.len()
            )));
        }
        let label = format!("weighted_sum({}) == {}", vars.join(", "), target);
        if vars.len() == 2 {
            let w = [weights[0], weights[1]];
            return self.add_binary(vars, binary::weighted_sum(CmpOp::Eq, target, w), label);
        }
        self.add_nary(
            vars,
            constraints::exact_sum_weighted(target, weights.to_vec()),
            label,
        )
    }

    pub fn add_sum_in_range(&mut self, vars: &[&str], lo: f64, hi: f64) -> Result<&mut Self> {
        let label = format!("{} <= sum({}) <= {}", lo, vars.join(" + "), hi);
        if vars.len() == 2 {
            self.add_binary(vars, binary::sum_bounded(lo, false, hi, false), label)
        } else {
            self.add_nary(vars, constraints::sum_in_range(lo, hi), label)
        }
    }

    pub fn add_exact_product(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        self.add_product(vars, CmpOp::Eq, target)
    }

    pub fn add_min_product(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        self.add_product(vars, CmpOp::Ge, target)
    }

    pub fn add_max_product(&mut self, vars: &[&str], target: f64) -> Result<&mut Self> {
        self.add_product(vars, CmpOp::Le, target)
    }

    fn add_product(&mut self, vars: &[&str], op: CmpOp, target: f64) -> Result<&mut Self> {
        let label = format!("product({}) {} {}", vars.join(" * "), op.symbol(), target);
        if vars.len() == 2 {
            return self.add_binary(vars, binary::product(op, target), label);
        }
        let test = match op {
            CmpOp::Eq => constraints::exact_product(target),
            CmpOp::Ge => constraints::min_product(target),
            _ => constraints::max_product(target),
        };
        self.add_nary(vars, test, label)
    }

    pub fn add_in_set(&mut self, vars: &[&str], set: &[Value]) -> Result<&mut Self> {
        let label = format!("in_set({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::in_set(set.to_vec()), label)
        } else {
            self.add_nary(vars, constraints::in_set(set.to_vec()), label)
        }
    }

    pub fn add_not_in_set(&mut self, vars: &[&str], set: &[Value]) -> Result<&mut Self> {
        let label = format!("not_in_set({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::not_in_set(set.to_vec()), label)
        } else {
            self.add_nary(vars, constraints::not_in_set(set.to_vec()), label)
        }
    }

    pub fn add_some_in_set(
        &mut self,
        vars: &[&str],
        set: &[Value],
        count: usize,
    ) -> Result<&mut Self> {
        let label = format!("some_in_set({}, {count})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::some_in_set(set.to_vec(), count), label)
        } else {
            self.add_nary(vars, constraints::some_in_set(set.to_vec(), count), label)
        }
    }

    pub fn add_some_not_in_set(
        &mut self,
        vars: &[&str],
        set: &[Value],
        count: usize,
    ) -> Result<&mut Self> {
        let label = format!("some_not_in_set({}, {count})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::some_not_in_set(set.to_vec(), count), label)
        } else {
            self.add_nary(vars, constraints::some_not_in_set(set.to_vec(), count), label)
        }
    }

    pub fn add_ascending(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let label = format!("ascending({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::compare(CmpOp::Le), label)
        } else {
            self.add_nary(vars, constraints::ascending(), label)
        }
    }

    pub fn add_strictly_ascending(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let label = format!("strictly_ascending({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::compare(CmpOp::Lt), label)
        } else {
            self.add_nary(vars, constraints::strictly_ascending(), label)
        }
    }

    pub fn add_descending(&mut self, vars: &[&str]) -> Result<&mut Self> {
        let label = format!("descending({})", vars.join(", "));
        if vars.len() == 2 {
            self.add_binary(vars, binary::compare(CmpOp::Ge), label)
        } else {
            self.add_nary(vars, constraints::descending(), label)
        }
    }

    /// Installs presentation options (step callback, step delay).
    pub fn set_options(&mut self, options: SolveOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Removes every variable, constraint and option.
    pub fn clear(&mut self) {
        *self = Problem::new();
    }

    pub fn var_count(&self) -> usize {
        self.names.len()
    }

    /// User-level constraint count (an arc pair counts once).
    pub fn constraint_count(&self) -> usize {
        self.arcs.len() / 2 + self.narys.len()
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.index.get(name).map(|id| &self.domains[*id])
    }

    /// Non-fatal diagnostics: variables no constraint mentions, and a
    /// crude over-constrainedness warning. Never rejects the problem.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let ctx = SolveContext::new(self);
        for (id, name) in self.names.iter().enumerate() {
            if ctx.degree[id] == 0 {
                warnings.push(format!("variable `{name}` is not referenced by any constraint"));
            }
        }
        if !self.names.is_empty() {
            let ratio = self.constraint_count() as f64 / self.names.len() as f64;
            if ratio > 10.0 {
                warnings.push(format!(
                    "{} constraints over {} variables; the problem may be over-constrained",
                    self.constraint_count(),
                    self.names.len()
                ));
            }
        }
        warnings
    }

    /// Renders the variable and constraint tables.
    pub fn summary(&self) -> String {
        crate::solver::stats::render_problem_summary(self)
    }

    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }

    // Solving.

    /// Lazy enumeration of every solution in deterministic order. The
    /// iterator owns its search state, so dropping it abandons the search.
    pub fn solutions(&self) -> Solutions<'_> {
        Solutions::new(self)
    }

    /// The first solution, or `None` when the problem is unsolvable.
    pub fn solve(&self) -> Option<Solution> {
        self.solutions().next()
    }

    /// Like [`solve`](Self::solve), also returning the search statistics.
    pub fn solve_with_stats(&self) -> (Option<Solution>, SearchStats) {
        let mut stream = self.solutions();
        let solution = stream.next();
        (solution, stream.stats().clone())
    }

    /// Every solution, materialised.
    pub fn all_solutions(&self) -> Vec<Solution> {
        self.solutions().collect()
    }

    /// Number of solutions, in constant memory over the stream.
    pub fn count_solutions(&self) -> usize {
        self.solutions().count()
    }

    /// True iff at least two solutions exist; stops searching after the
    /// second.
    pub fn has_multiple_solutions(&self) -> bool {
        self.solutions().take(2).count() == 2
    }

    /// The first `n` solutions in enumeration order (fewer when the
    /// problem has fewer).
    pub fn first_n(&self, n: usize) -> Vec<Solution> {
        self.solutions().take(n).collect()
    }

    /// Min-conflicts local search with a fresh random seed. Incomplete:
    /// `None` means no solution was found within `max_steps`, not that
    /// none exists.
    pub fn solve_with_min_conflicts(&self, max_steps: usize) -> Option<Solution> {
        let mut rng = rand_chacha::ChaCha8Rng::from_entropy();
        min_conflicts::run(&SolveContext::new(self), max_steps, &mut rng)
    }

    /// Min-conflicts with a caller-supplied seed, for reproducible runs.
    pub fn solve_with_min_conflicts_seeded(&self, max_steps: usize, seed: u64) -> Option<Solution> {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        min_conflicts::run(&SolveContext::new(self), max_steps, &mut rng)
    }
}

/// Read-only indexes derived from a [`Problem`] once per solve call.
pub(crate) struct SolveContext<'p> {
    pub problem: &'p Problem,
    /// Arc ids grouped by head variable; revising a domain re-enqueues
    /// the arcs whose head it is.
    pub arcs_by_head: Vec<Vec<usize>>,
    /// Arc ids grouped by tail variable; one entry per user constraint a
    /// variable participates in.
    pub arcs_by_tail: Vec<Vec<usize>>,
    /// The n-ary index: constraint ids grouped by member variable.
    pub nary_by_var: Vec<Vec<usize>>,
    /// Arcs plus n-ary constraints mentioning each variable; the
    /// tie-breaker for variable selection.
    pub degree: Vec<usize>,
}

impl<'p> SolveContext<'p> {
    pub fn new(problem: &'p Problem) -> Self {
        let n = problem.names.len();
        let mut arcs_by_head = vec![Vec::new(); n];
        let mut arcs_by_tail = vec![Vec::new(); n];
        let mut nary_by_var = vec![Vec::new(); n];
        let mut degree = vec![0usize; n];

        for (arc_id, arc) in problem.arcs.iter().enumerate() {
            arcs_by_head[arc.head].push(arc_id);
            arcs_by_tail[arc.tail].push(arc_id);
            degree[arc.head] += 1;
        }
        for (cons_id, cons) in problem.narys.iter().enumerate() {
            let mut seen = std::collections::HashSet::new();
            for &var in &cons.vars {
                if seen.insert(var) {
                    nary_by_var[var].push(cons_id);
                    degree[var] += 1;
                }
            }
        }

        Self {
            problem,
            arcs_by_head,
            arcs_by_tail,
            nary_by_var,
            degree,
        }
    }

    pub fn var_count(&self) -> usize {
        self.problem.names.len()
    }
}

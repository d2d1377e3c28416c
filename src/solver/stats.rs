//! Per-solve statistics and table renderers for diagnostics.

use prettytable::{Cell, Row, Table};
use serde::Serialize;

use crate::solver::problem::{Problem, SolveContext};

/// Counters for one solve run. Every entry point that searches owns one of
/// these; nothing is stashed in process-wide state.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SearchStats {
    /// Tentative assignments tried.
    pub nodes_visited: u64,
    /// Abandoned branches (failed propagations plus exhausted frames).
    pub backtracks: u64,
    /// Arc revisions performed by AC-3.
    pub arc_revisions: u64,
    /// Constraint revisions performed by GAC.
    pub gac_revisions: u64,
    /// Individual value-support searches during GAC.
    pub support_checks: u64,
    /// Domain reductions across both propagators.
    pub prunings: u64,
}

impl SearchStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("stats serialise to JSON")
    }
}

pub fn render_search_stats(stats: &SearchStats) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Count")]));
    let rows: [(&str, u64); 6] = [
        ("Nodes visited", stats.nodes_visited),
        ("Backtracks", stats.backtracks),
        ("AC-3 arc revisions", stats.arc_revisions),
        ("GAC constraint revisions", stats.gac_revisions),
        ("GAC support checks", stats.support_checks),
        ("Domain prunings", stats.prunings),
    ];
    for (name, count) in rows {
        table.add_row(Row::new(vec![
            Cell::new(name),
            Cell::new(&count.to_string()),
        ]));
    }
    table.to_string()
}

pub fn render_problem_summary(problem: &Problem) -> String {
    let ctx = SolveContext::new(problem);

    let mut variables = Table::new();
    variables.add_row(Row::new(vec![
        Cell::new("Variable"),
        Cell::new("Domain"),
        Cell::new("Size"),
        Cell::new("Degree"),
    ]));
    for (id, name) in problem.names.iter().enumerate() {
        let domain = &problem.domains[id];
        variables.add_row(Row::new(vec![
            Cell::new(name),
            Cell::new(&domain.to_string()),
            Cell::new(&domain.len().to_string()),
            Cell::new(&ctx.degree[id].to_string()),
        ]));
    }

    let mut constraints = Table::new();
    constraints.add_row(Row::new(vec![Cell::new("Constraint"), Cell::new("Kind")]));
    // Arcs are installed in pairs; the even one carries the user's
    // orientation.
    for arc in problem.arcs.iter().step_by(2) {
        constraints.add_row(Row::new(vec![Cell::new(&arc.label), Cell::new("binary")]));
    }
    for cons in &problem.narys {
        constraints.add_row(Row::new(vec![Cell::new(&cons.label), Cell::new("n-ary")]));
    }

    format!(
        "{} variables, {} constraints\n{}\n{}",
        problem.var_count(),
        problem.constraint_count(),
        variables, constraints
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::domain::Domain;

    #[test]
    fn stats_serialise_to_json() {
        let stats = SearchStats {
            nodes_visited: 3,
            ..Default::default()
        };
        let json = stats.to_json();
        assert!(json.contains("\"nodes_visited\": 3"));
    }

    #[test]
    fn summary_mentions_every_variable_and_constraint() {
        let mut p = Problem::new();
        p.add_variables(&["A", "B"], Domain::int_range(1, 3)).unwrap();
        p.add_string_constraint("A < B").unwrap();
        let summary = p.summary();
        assert!(summary.contains("A < B"));
        assert!(summary.contains("2 variables, 1 constraints"));
    }
}

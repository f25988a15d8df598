//! Planner-instance counters. `AlgorithmStats` in the earlier multi-
//! algorithm codebase this is descended from tracked one variant per
//! algorithm; here there is only one algorithm per `Planner`, so the
//! enum-of-variants shape collapses to a plain struct.

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlannerStats {
    pub nodes_expanded: u64,
    pub replanning_count: u64,
    pub total_planning_time: Duration,
}

impl PlannerStats {
    pub(crate) fn new() -> Self {
        PlannerStats::default()
    }
}

impl fmt::Display for PlannerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes expanded: {}", self.nodes_expanded)?;
        writeln!(f, "Replanning count: {}", self.replanning_count)?;
        write!(
            f,
            "Total planning time: {:.3}ms",
            self.total_planning_time.as_secs_f64() * 1000.0
        )
    }
}

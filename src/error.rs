//! Error kinds surfaced to callers.
//!
//! Earlier code in this lineage expressed all of this as
//! `Result<T, String>` (`simulation.rs::Simulation::new`,
//! `batch_simulation.rs::run`); this crate upgrades that to a
//! `thiserror`-derived enum, one variant per error kind, each carrying the
//! offending coordinates where relevant.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PlannerError {
    /// `start` or `goal` is out of bounds, or classed as an obstacle.
    #[error("invalid endpoint ({x}, {y}): out of bounds or obstacle")]
    InvalidEndpoint { x: i32, y: i32 },

    /// `ComputeShortestPath` terminated with `g(start) == +inf`; the start
    /// cell is unreachable from the goal under the current costs.
    #[error("no path exists between the current start and goal")]
    NoPath,

    /// `update_obstacles` or `replan_path` was called before `plan_path`
    /// ever initialized the planner.
    #[error("planner used before an initial plan_path call")]
    StalePlannerUsage,
}

//! Incremental heuristic (D* Lite) path planner for grid navigation, with a
//! traffic-aware cost overlay as a second [`cost::CostProvider`]
//! implementation.
//!
//! The base pieces are [`grid::GridMap`] (static occupancy + terrain) and
//! [`traffic::TrafficGrid`] (dynamic, simulated road cost); both implement
//! [`cost::CostProvider`] and either can drive a [`planner::Planner`].

pub mod config;
pub mod cost;
pub mod error;
pub mod grid;
pub mod planner;
pub mod queue;
pub mod stats;
pub mod traffic;

pub use cost::CostProvider;
pub use error::PlannerError;
pub use grid::{ChangeRecord, DiagonalMode, GridMap, Position};
pub use planner::{Planner, PlannerPhase};
pub use stats::PlannerStats;
pub use traffic::TrafficGrid;

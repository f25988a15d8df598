//! CLI configuration for the demo binary: fewer simulation-specific knobs,
//! more planner-shaped ones (heuristic weight, diagonal mode, traffic
//! overlay toggle).

use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Plain obstacle grid: random walls, one obstacle field.
    Grid,
    /// Road network with traffic lights and moving vehicles.
    Traffic,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, default_value_t = 32)]
    pub grid_size: i32,

    #[arg(long, default_value_t = 40)]
    pub num_walls: usize,

    #[arg(long, value_enum, default_value_t = Scenario::Grid)]
    pub scenario: Scenario,

    /// D* Lite heuristic weight. 1.0 is admissible/optimal; higher trades
    /// optimality for fewer expansions.
    #[arg(long, default_value_t = 1.0)]
    pub heuristic_weight: f64,

    /// Number of replanning steps to simulate after the initial plan.
    #[arg(long, default_value_t = 5)]
    pub replan_steps: u32,

    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

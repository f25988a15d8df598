use clap::Parser;
use rand::Rng;
use tracing::info;

use dstar_lite_planner::config::{Config, Scenario};
use dstar_lite_planner::{GridMap, Planner, TrafficGrid};

fn run_grid_scenario(config: &Config) {
    let mut rng = rand::thread_rng();
    let mut grid = GridMap::new(config.grid_size, config.grid_size);

    for _ in 0..config.num_walls {
        let x = rng.gen_range(0..config.grid_size);
        let y = rng.gen_range(0..config.grid_size);
        grid.set_obstacle(x, y, true);
    }
    grid.set_obstacle(0, 0, false);
    grid.set_obstacle(config.grid_size - 1, config.grid_size - 1, false);

    let mut planner = Planner::new(grid, config.heuristic_weight);
    let start = (0, 0);
    let goal = (config.grid_size - 1, config.grid_size - 1);

    let path = match planner.plan_path(start, goal) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("initial plan failed: {e}");
            std::process::exit(1);
        }
    };
    info!(len = path.len(), "initial plan computed");

    for step in 0..config.replan_steps {
        let x = rng.gen_range(0..config.grid_size);
        let y = rng.gen_range(0..config.grid_size);
        let changes = match planner.grid_mut().set_obstacle(x, y, true) {
            Some(c) => vec![c],
            None => continue,
        };
        let change_tuples: Vec<(i32, i32, bool)> =
            changes.iter().map(|c| (c.x, c.y, c.now_blocked)).collect();
        if planner.update_obstacles(&change_tuples).is_err() {
            continue;
        }
        match planner.replan_path(None) {
            Ok(path) => info!(step, len = path.len(), "replanned"),
            Err(e) => info!(step, error = %e, "replan found no path"),
        }
    }

    if !config.quiet {
        println!("Scenario: grid");
        println!("{}", planner.stats());
        println!("Final cost to goal: {:.3}", planner.start_cost());
    }
}

fn run_traffic_scenario(config: &Config) {
    let mut rng = rand::thread_rng();
    let mut traffic = TrafficGrid::new(config.grid_size, config.grid_size);
    traffic.add_road_rect(0, 0, config.grid_size - 1, config.grid_size - 1, dstar_lite_planner::traffic::RoadType::Street, 40.0);
    traffic.add_traffic_light(config.grid_size / 2, config.grid_size / 2);
    for _ in 0..5 {
        let x = rng.gen_range(0.0..config.grid_size as f64);
        let y = rng.gen_range(0.0..config.grid_size as f64);
        traffic.spawn_vehicle(x, y, 1.0, 0.0);
    }

    let mut planner = Planner::new(traffic, config.heuristic_weight);
    let start = (0, 0);
    let goal = (config.grid_size - 1, config.grid_size - 1);
    if let Err(e) = planner.plan_path(start, goal) {
        eprintln!("initial plan failed: {e}");
        std::process::exit(1);
    }

    for step in 0..config.replan_steps {
        planner.grid_mut().step(1.0);
        let changes = planner.grid_mut().detect_changes();
        if changes.is_empty() {
            continue;
        }
        if planner.update_obstacles(&changes).is_err() {
            continue;
        }
        match planner.replan_path(None) {
            Ok(path) => info!(step, len = path.len(), changed = changes.len(), "replanned"),
            Err(e) => info!(step, error = %e, "replan found no path"),
        }
    }

    if !config.quiet {
        println!("Scenario: traffic");
        println!("{}", planner.stats());
        println!("Final cost to goal: {:.3}", planner.start_cost());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::parse();

    match config.scenario {
        Scenario::Grid => run_grid_scenario(&config),
        Scenario::Traffic => run_traffic_scenario(&config),
    }
}

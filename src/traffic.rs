//! Traffic-aware cost overlay, implemented as a second [`CostProvider`]
//! rather than a `GridMap` subclass. Grounded in
//! `original_source/src/environment/traffic_environment.py` and
//! `original_source/src/dstar/traffic_dstar.py`, which this module
//! generalizes from a fixed "Istanbul-like" city generator into a plain
//! builder API (`add_road_rect`, `add_building_rect`, `add_traffic_light`,
//! `spawn_vehicle`).

use tracing::trace;

use crate::cost::CostProvider;

/// Road classes and their base traversal cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadType {
    Highway,
    Main,
    Street,
    Narrow,
    Parking,
    Intersection,
    Roundabout,
}

impl RoadType {
    fn base_cost(self) -> f64 {
        match self {
            RoadType::Highway => 1.0,
            RoadType::Main => 1.2,
            RoadType::Street => 1.5,
            RoadType::Narrow => 2.0,
            RoadType::Parking => 3.0,
            RoadType::Intersection => 2.5,
            RoadType::Roundabout => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Green,
    Yellow,
    Red,
}

/// A signalized intersection cycling green(30s) -> yellow(3s) -> red(25s).
#[derive(Debug, Clone, Copy)]
pub struct TrafficLight {
    pub x: i32,
    pub y: i32,
    pub state: SignalState,
    phase_duration: f64,
    elapsed: f64,
}

impl TrafficLight {
    fn new(x: i32, y: i32) -> Self {
        TrafficLight {
            x,
            y,
            state: SignalState::Green,
            phase_duration: 30.0,
            elapsed: 0.0,
        }
    }

    fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
        if self.elapsed < self.phase_duration {
            return;
        }
        self.elapsed = 0.0;
        let (next_state, next_duration) = match self.state {
            SignalState::Green => (SignalState::Yellow, 3.0),
            SignalState::Yellow => (SignalState::Red, 25.0),
            SignalState::Red => (SignalState::Green, 30.0),
        };
        self.state = next_state;
        self.phase_duration = next_duration;
    }
}

/// A simulated vehicle used only to drive the local-density field; not a
/// planning obstacle.
#[derive(Debug, Clone, Copy)]
pub struct MovingVehicle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

/// Grid-shaped road/building/density/speed-limit layers plus signals and
/// vehicles, exposing the same `CostProvider` surface as `GridMap` but
/// computing cost dynamically.
pub struct TrafficGrid {
    width: i32,
    height: i32,
    road: Vec<Option<RoadType>>,
    building: Vec<bool>,
    density: Vec<f64>,
    speed_limit: Vec<f64>,
    lights: Vec<TrafficLight>,
    vehicles: Vec<MovingVehicle>,
    /// Cost-delta threshold above which `detect_changes` reports a cell as
    /// changed. Default 0.5, matching the original's hard-coded value.
    pub change_threshold: f64,
    last_cost: Vec<f64>,
}

const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl TrafficGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width as usize) * (height as usize);
        TrafficGrid {
            width,
            height,
            road: vec![None; len],
            building: vec![false; len],
            density: vec![0.0; len],
            speed_limit: vec![50.0; len],
            lights: Vec::new(),
            vehicles: Vec::new(),
            change_threshold: 0.5,
            last_cost: vec![f64::INFINITY; len],
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    fn rect_bounds(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
        (
            x1.min(x2).max(0),
            y1.min(y2).max(0),
            x1.max(x2).min(self.width - 1),
            y1.max(y2).min(self.height - 1),
        )
    }

    /// Paints a rectangle of road, setting its type and speed limit.
    pub fn add_road_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, road: RoadType, speed_limit_kmh: f64) {
        let (lo_x, lo_y, hi_x, hi_y) = self.rect_bounds(x1, y1, x2, y2);
        for y in lo_y..=hi_y {
            for x in lo_x..=hi_x {
                let idx = self.index(x, y);
                self.road[idx] = Some(road);
                self.speed_limit[idx] = speed_limit_kmh;
            }
        }
    }

    /// Marks a rectangle as a building (impassable regardless of any road
    /// layer painted underneath).
    pub fn add_building_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let (lo_x, lo_y, hi_x, hi_y) = self.rect_bounds(x1, y1, x2, y2);
        for y in lo_y..=hi_y {
            for x in lo_x..=hi_x {
                let idx = self.index(x, y);
                self.building[idx] = true;
            }
        }
    }

    pub fn add_traffic_light(&mut self, x: i32, y: i32) {
        self.lights.push(TrafficLight::new(x, y));
    }

    pub fn spawn_vehicle(&mut self, x: f64, y: f64, vx: f64, vy: f64) {
        self.vehicles.push(MovingVehicle { x, y, vx, vy });
    }

    pub fn lights(&self) -> &[TrafficLight] {
        &self.lights
    }

    pub fn vehicles(&self) -> &[MovingVehicle] {
        &self.vehicles
    }

    /// True iff `(x,y)` carries a road layer and isn't covered by a
    /// building.
    pub fn is_road(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        !self.building[idx] && self.road[idx].is_some()
    }

    fn signal_penalty(&self, x: i32, y: i32) -> f64 {
        for light in &self.lights {
            let distance = (light.x - x).abs() + (light.y - y).abs();
            if distance <= 3 {
                match light.state {
                    SignalState::Red => return 5.0,
                    SignalState::Yellow => return 2.0,
                    SignalState::Green => {}
                }
            }
        }
        1.0
    }

    /// `base_cost * (1 + 2*density) * signal_penalty * (50 / max(limit,10))`.
    pub fn dynamic_cost(&self, x: i32, y: i32) -> f64 {
        if !self.is_road(x, y) {
            return f64::INFINITY;
        }
        let idx = self.index(x, y);
        let road = self.road[idx].expect("is_road guarantees Some");
        let density_factor = 1.0 + 2.0 * self.density[idx];
        let signal_factor = self.signal_penalty(x, y);
        let speed_factor = 50.0 / self.speed_limit[idx].max(10.0);
        road.base_cost() * density_factor * signal_factor * speed_factor
    }

    pub fn density(&self, x: i32, y: i32) -> f64 {
        if !self.in_bounds(x, y) {
            return 0.0;
        }
        self.density[self.index(x, y)]
    }

    /// Advances signal phases and vehicle positions by `dt` seconds, then
    /// recomputes the local-density field from vehicle positions (radius-2
    /// kernel, linear falloff) — grounded in
    /// `_update_traffic_lights`/`_update_moving_vehicles`/
    /// `_update_traffic_density_grid` in `traffic_environment.py`.
    pub fn step(&mut self, dt: f64) {
        for light in &mut self.lights {
            light.advance(dt);
        }

        let (w, h) = (self.width as f64, self.height as f64);
        let width = self.width;
        let road = &self.road;
        let building = &self.building;
        self.vehicles.retain_mut(|v| {
            let new_x = v.x + v.vx * dt;
            let new_y = v.y + v.vy * dt;
            if new_x < 0.0 || new_x >= w || new_y < 0.0 || new_y >= h {
                return false;
            }
            let idx = (new_y as i32 as usize) * (width as usize) + (new_x as i32 as usize);
            if road[idx].is_some() && !building[idx] {
                v.x = new_x;
                v.y = new_y;
            } else {
                v.vx *= -0.5;
                v.vy *= -0.5;
            }
            true
        });

        self.density.iter_mut().for_each(|d| *d = 0.0);
        for v in &self.vehicles {
            let (cx, cy) = (v.x as i32, v.y as i32);
            for dy in -2..=2 {
                for dx in -2..=2 {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !self.in_bounds(nx, ny) {
                        continue;
                    }
                    let distance = ((dx * dx + dy * dy) as f64).sqrt();
                    if distance <= 2.0 {
                        let weight = 1.0 - distance / 2.0;
                        let idx = self.index(nx, ny);
                        self.density[idx] += weight;
                    }
                }
            }
        }

        trace!(vehicles = self.vehicles.len(), "traffic step complete");
    }

    /// Compares every road cell's current dynamic cost to the cost recorded
    /// the last time this was called; returns a change list suitable for
    /// `Planner::update_obstacles` wherever the delta exceeds
    /// `change_threshold`.
    pub fn detect_changes(&mut self) -> Vec<(i32, i32, bool)> {
        let mut changes = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_road(x, y) {
                    continue;
                }
                let idx = self.index(x, y);
                let current = self.dynamic_cost(x, y);
                let delta = (current - self.last_cost[idx]).abs();
                if delta > self.change_threshold {
                    changes.push((x, y, false));
                }
                self.last_cost[idx] = current;
            }
        }
        changes
    }
}

impl CostProvider for TrafficGrid {
    fn dims(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn is_obstacle(&self, x: i32, y: i32) -> bool {
        !self.is_road(x, y)
    }

    fn edge_cost(&self, from: (i32, i32), to: (i32, i32)) -> f64 {
        let cost = self.dynamic_cost(to.0, to.1);
        if !cost.is_finite() {
            return f64::INFINITY;
        }
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let distance = if dx != 0 && dy != 0 {
            std::f64::consts::SQRT_2
        } else {
            1.0
        };
        distance * cost
    }

    fn heuristic(&self, a: (i32, i32), b: (i32, i32)) -> f64 {
        let dx = (a.0 - b.0).abs() as f64;
        let dy = (a.1 - b.1).abs() as f64;
        let manhattan = dx + dy;
        let euclidean = (dx * dx + dy * dy).sqrt();
        let traffic_factor = 1.0 + 0.5 * self.density(a.0, a.1);
        (0.7 * manhattan + 0.3 * euclidean) * traffic_factor
    }

    fn neighbors(&self, pos: (i32, i32)) -> Vec<(i32, i32)> {
        let mut out = Vec::with_capacity(8);
        for &(dx, dy) in DIRECTIONS_8.iter() {
            let (nx, ny) = (pos.0 + dx, pos.1 + dy);
            if self.is_road(nx, ny) {
                out.push((nx, ny));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_road_grid() -> TrafficGrid {
        let mut g = TrafficGrid::new(10, 10);
        g.add_road_rect(0, 0, 9, 9, RoadType::Street, 50.0);
        g
    }

    #[test]
    fn building_overrides_road() {
        let mut g = simple_road_grid();
        g.add_building_rect(4, 4, 5, 5);
        assert!(g.is_obstacle(4, 4));
        assert!(!g.is_obstacle(0, 0));
    }

    #[test]
    fn cells_without_road_are_obstacles() {
        let g = TrafficGrid::new(5, 5);
        assert!(g.is_obstacle(2, 2));
    }

    #[test]
    fn dynamic_cost_matches_base_when_free_flowing() {
        let g = simple_road_grid();
        let cost = g.dynamic_cost(5, 5);
        // base(1.5) * density(1.0) * signal(1.0) * speed(50/50=1.0)
        assert!((cost - 1.5).abs() < 1e-9);
    }

    #[test]
    fn red_light_multiplies_cost_by_five() {
        let mut g = simple_road_grid();
        g.add_traffic_light(5, 5);
        g.lights[0].state = SignalState::Red;
        let near = g.dynamic_cost(5, 6);
        let far = g.dynamic_cost(5, 9);
        assert!((near - 7.5).abs() < 1e-9);
        assert!((far - 1.5).abs() < 1e-9);
    }

    #[test]
    fn signal_cycles_green_yellow_red_green() {
        let mut light = TrafficLight::new(0, 0);
        assert_eq!(light.state, SignalState::Green);
        light.advance(30.0);
        assert_eq!(light.state, SignalState::Yellow);
        light.advance(3.0);
        assert_eq!(light.state, SignalState::Red);
        light.advance(25.0);
        assert_eq!(light.state, SignalState::Green);
    }

    #[test]
    fn detect_changes_respects_threshold() {
        let mut g = simple_road_grid();
        assert!(!g.detect_changes().is_empty()); // first call: inf -> finite everywhere
        assert!(g.detect_changes().is_empty()); // nothing moved since
    }
}

//! The D* Lite incremental search engine.
//!
//! Generalizes `algorithms/d_star_lite.rs` (tombstone-based
//! lazy deletion, `g`/`rhs` maps, the `km` key-modifier trick) from a
//! 4-connected, integer-cost, grid-only implementation into an
//! 8-connected, floating-point-cost engine parameterized over any
//! [`CostProvider`], generalizing the earlier per-algorithm dispatch into
//! one generic engine.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::cost::CostProvider;
use crate::error::PlannerError;
use crate::grid::Position;
use crate::queue::{Key, PriorityQueue};
use crate::stats::PlannerStats;

/// Where a `Planner` instance sits in its own lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerPhase {
    /// No `plan_path` call has succeeded yet.
    Uninitialized,
    /// The open set is empty, or its head no longer dominates `start`'s key:
    /// `g`/`rhs` are consistent with the current costs everywhere that
    /// matters.
    Converged,
    /// `update_obstacles` has marked cells inconsistent since the last
    /// convergence; a `replan_path` (or another `update_obstacles`) is
    /// needed to re-converge.
    Dirty,
}

/// Per-cell search-node state: the committed cost-to-goal (`g`) and the
/// one-step lookahead cost-to-goal (`rhs`). Stored densely, one slot per
/// grid cell; dense storage is worthwhile up to roughly `W*H <= 10^6`.
struct NodeTable {
    width: i32,
    g: Vec<f64>,
    rhs: Vec<f64>,
}

impl NodeTable {
    fn new(width: i32, height: i32) -> Self {
        let len = (width as usize) * (height as usize);
        NodeTable {
            width,
            g: vec![f64::INFINITY; len],
            rhs: vec![f64::INFINITY; len],
        }
    }

    fn idx(&self, pos: Position) -> usize {
        (pos.y as usize) * (self.width as usize) + (pos.x as usize)
    }

    fn g(&self, pos: Position) -> f64 {
        self.g[self.idx(pos)]
    }

    fn rhs(&self, pos: Position) -> f64 {
        self.rhs[self.idx(pos)]
    }

    fn set_g(&mut self, pos: Position, value: f64) {
        let i = self.idx(pos);
        self.g[i] = value;
    }

    fn set_rhs(&mut self, pos: Position, value: f64) {
        let i = self.idx(pos);
        self.rhs[i] = value;
    }

    fn reset(&mut self) {
        self.g.iter_mut().for_each(|v| *v = f64::INFINITY);
        self.rhs.iter_mut().for_each(|v| *v = f64::INFINITY);
    }
}

/// An incremental D* Lite planner over a [`CostProvider`] `C`. Owns `C`
/// exclusively: mutate the underlying map through [`Planner::grid_mut`] so
/// the planner always sees its own changes before the next `replan_path` /
/// `update_obstacles` call.
pub struct Planner<C: CostProvider> {
    grid: C,
    heuristic_weight: f64,
    nodes: NodeTable,
    queue: PriorityQueue,
    km: f64,
    s_start: Position,
    s_goal: Position,
    phase: PlannerPhase,
    stats: PlannerStats,
}

impl<C: CostProvider> Planner<C> {
    /// Creates a planner over `grid` with heuristic weight `heuristic_weight`
    /// (`w >= 1.0`; `w == 1.0` is the admissible, optimal-path setting).
    pub fn new(grid: C, heuristic_weight: f64) -> Self {
        let (width, height) = grid.dims();
        Planner {
            grid,
            heuristic_weight,
            nodes: NodeTable::new(width, height),
            queue: PriorityQueue::new(),
            km: 0.0,
            s_start: Position::new(0, 0),
            s_goal: Position::new(0, 0),
            phase: PlannerPhase::Uninitialized,
            stats: PlannerStats::new(),
        }
    }

    pub fn grid(&self) -> &C {
        &self.grid
    }

    /// Exclusive access to the underlying cost provider, for mutation.
    /// Changes made here are picked up by the next `update_obstacles` /
    /// `replan_path` call, not retroactively.
    pub fn grid_mut(&mut self) -> &mut C {
        &mut self.grid
    }

    pub fn stats(&self) -> &PlannerStats {
        &self.stats
    }

    pub fn phase(&self) -> PlannerPhase {
        self.phase
    }

    pub fn heuristic_weight(&self) -> f64 {
        self.heuristic_weight
    }

    fn validate_endpoint(&self, pos: Position) -> Result<(), PlannerError> {
        let (w, h) = self.grid.dims();
        let in_bounds = pos.x >= 0 && pos.x < w && pos.y >= 0 && pos.y < h;
        if !in_bounds || self.grid.is_obstacle(pos.x, pos.y) {
            warn!(x = pos.x, y = pos.y, "invalid endpoint: out of bounds or obstacle");
            return Err(PlannerError::InvalidEndpoint { x: pos.x, y: pos.y });
        }
        Ok(())
    }

    fn h(&self, a: Position, b: Position) -> f64 {
        self.heuristic_weight * self.grid.heuristic(a.into(), b.into())
    }

    fn calculate_key(&self, s: Position) -> Key {
        let g = self.nodes.g(s);
        let rhs = self.nodes.rhs(s);
        let min_val = g.min(rhs);
        if !min_val.is_finite() {
            return Key::infinite();
        }
        Key {
            k1: min_val + self.h(s, self.s_start) + self.km,
            k2: min_val,
        }
    }

    fn neighbors(&self, pos: Position) -> Vec<Position> {
        self.grid
            .neighbors(pos.into())
            .into_iter()
            .map(Position::from)
            .collect()
    }

    /// UpdateVertex(u).
    fn update_vertex(&mut self, u: Position) {
        if u != self.s_goal {
            let mut min_rhs = f64::INFINITY;
            for n in self.neighbors(u) {
                let cost = self.grid.edge_cost(u.into(), n.into());
                if cost.is_finite() {
                    let candidate = cost + self.nodes.g(n);
                    if candidate < min_rhs {
                        min_rhs = candidate;
                    }
                }
            }
            self.nodes.set_rhs(u, min_rhs);
        }

        if self.queue.contains(u) {
            self.queue.remove(u);
        }
        if self.nodes.g(u) != self.nodes.rhs(u) {
            let key = self.calculate_key(u);
            self.queue.insert(u, key);
        }
    }

    /// ComputeShortestPath.
    fn compute_shortest_path(&mut self) {
        loop {
            let start_key = self.calculate_key(self.s_start);
            let start_inconsistent = self.nodes.g(self.s_start) != self.nodes.rhs(self.s_start);
            if self.queue.is_empty() {
                break;
            }
            if self.queue.top_key() >= start_key && !start_inconsistent {
                break;
            }

            let u = match self.queue.pop() {
                Some(u) => u,
                None => break,
            };
            self.stats.nodes_expanded += 1;
            trace!(x = u.x, y = u.y, expanded = self.stats.nodes_expanded, "vertex expanded");

            let g_u = self.nodes.g(u);
            let rhs_u = self.nodes.rhs(u);

            if g_u > rhs_u {
                self.nodes.set_g(u, rhs_u);
                for n in self.neighbors(u) {
                    if n != self.s_goal {
                        let candidate = self.grid.edge_cost(n.into(), u.into()) + self.nodes.g(u);
                        if candidate < self.nodes.rhs(n) {
                            self.nodes.set_rhs(n, candidate);
                        }
                    }
                    self.update_vertex(n);
                }
            } else {
                self.nodes.set_g(u, f64::INFINITY);
                let mut to_update = self.neighbors(u);
                to_update.push(u);
                for n in to_update {
                    self.update_vertex(n);
                }
            }
        }
    }

    /// Greedy descent from `start` to `goal` through `g`.
    /// Empty if `g(start)` is non-finite (no path) or the descent gets
    /// stuck.
    fn extract_path(&self) -> Vec<(i32, i32)> {
        if !self.nodes.g(self.s_start).is_finite() {
            return Vec::new();
        }

        let mut path = vec![self.s_start];
        let mut current = self.s_start;
        let (w, h) = self.grid.dims();
        let budget = (w as i64 * h as i64 * 2).max(16) as usize;

        while current != self.s_goal {
            let next = self
                .neighbors(current)
                .into_iter()
                .filter_map(|n| {
                    let cost = self.grid.edge_cost(current.into(), n.into());
                    if cost.is_finite() && self.nodes.g(n).is_finite() {
                        Some((n, cost + self.nodes.g(n)))
                    } else {
                        None
                    }
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            match next {
                Some((n, _)) => {
                    path.push(n);
                    current = n;
                }
                None => return Vec::new(),
            }

            if path.len() > budget {
                return Vec::new();
            }
        }

        path.into_iter().map(Position::into).collect()
    }

    /// `plan_path(start, goal)`. Reinitializes all search
    /// state and runs `ComputeShortestPath` from scratch. `start == goal`
    /// short-circuits to `[start]` with zero expansions.
    pub fn plan_path(
        &mut self,
        start: (i32, i32),
        goal: (i32, i32),
    ) -> Result<Vec<(i32, i32)>, PlannerError> {
        let start = Position::from(start);
        let goal = Position::from(goal);
        self.validate_endpoint(start)?;
        self.validate_endpoint(goal)?;

        let started = Instant::now();

        self.nodes.reset();
        self.queue.clear();
        self.km = 0.0;
        self.s_start = start;
        self.s_goal = goal;

        if start == goal {
            self.nodes.set_g(start, 0.0);
            self.nodes.set_rhs(start, 0.0);
        } else {
            self.nodes.set_rhs(goal, 0.0);
            let key = self.calculate_key(goal);
            self.queue.insert(goal, key);
            self.compute_shortest_path();
        }

        self.stats.total_planning_time += started.elapsed();
        self.phase = PlannerPhase::Converged;
        let path = self.extract_path();
        debug!(
            nodes_expanded = self.stats.nodes_expanded,
            path_len = path.len(),
            "plan_path converged"
        );
        if path.is_empty() {
            warn!(start = ?self.s_start, goal = ?self.s_goal, "no path found");
        }
        Ok(path)
    }

    /// Like `plan_path`, but reports unreachability as `Err(NoPath)` instead
    /// of an empty vector, for callers who prefer `?`-style error handling
    /// over checking for an empty path.
    pub fn plan_path_strict(
        &mut self,
        start: (i32, i32),
        goal: (i32, i32),
    ) -> Result<Vec<(i32, i32)>, PlannerError> {
        match self.plan_path(start, goal)? {
            path if path.is_empty() => Err(PlannerError::NoPath),
            path => Ok(path),
        }
    }

    /// `update_obstacles(changes)`. For each change,
    /// `UpdateVertex`s every passable 8-neighbor of the changed cell and the
    /// cell itself, then reconverges. Does not return a path. Out-of-bounds
    /// coordinates are silently ignored; the `now_blocked` flag is
    /// documentation only.
    pub fn update_obstacles(&mut self, changes: &[(i32, i32, bool)]) -> Result<(), PlannerError> {
        if self.phase == PlannerPhase::Uninitialized {
            return Err(PlannerError::StalePlannerUsage);
        }

        let started = Instant::now();
        self.phase = PlannerPhase::Dirty;

        let (w, h) = self.grid.dims();
        for &(x, y, _now_blocked) in changes {
            if x < 0 || x >= w || y < 0 || y >= h {
                continue;
            }
            let pos = Position::new(x, y);
            for n in self.neighbors(pos) {
                self.update_vertex(n);
            }
            self.update_vertex(pos);
        }

        self.compute_shortest_path();
        self.stats.replanning_count += 1;
        self.stats.total_planning_time += started.elapsed();
        self.phase = PlannerPhase::Converged;
        debug!(
            changes = changes.len(),
            replanning_count = self.stats.replanning_count,
            "update_obstacles reconverged"
        );
        Ok(())
    }

    /// `replan_path(new_start)`. Optionally moves the
    /// cached start (bumping `km` by `h(old_start, new_start)`), reconverges,
    /// and extracts a path.
    pub fn replan_path(
        &mut self,
        new_start: Option<(i32, i32)>,
    ) -> Result<Vec<(i32, i32)>, PlannerError> {
        if self.phase == PlannerPhase::Uninitialized {
            return Err(PlannerError::StalePlannerUsage);
        }

        let started = Instant::now();

        if let Some(new_start) = new_start {
            let new_start = Position::from(new_start);
            self.validate_endpoint(new_start)?;
            if new_start != self.s_start {
                self.km += self.h(self.s_start, new_start);
                self.s_start = new_start;
            }
        }

        self.compute_shortest_path();
        self.stats.replanning_count += 1;
        self.stats.total_planning_time += started.elapsed();
        self.phase = PlannerPhase::Converged;
        let path = self.extract_path();
        debug!(
            replanning_count = self.stats.replanning_count,
            path_len = path.len(),
            "replan_path reconverged"
        );
        if path.is_empty() {
            warn!(start = ?self.s_start, goal = ?self.s_goal, "no path found");
        }
        Ok(path)
    }

    /// Like `replan_path`, but reports unreachability as `Err(NoPath)`.
    pub fn replan_path_strict(
        &mut self,
        new_start: Option<(i32, i32)>,
    ) -> Result<Vec<(i32, i32)>, PlannerError> {
        match self.replan_path(new_start)? {
            path if path.is_empty() => Err(PlannerError::NoPath),
            path => Ok(path),
        }
    }

    /// Current `km` value. Monotonically non-decreasing across the
    /// lifetime of a planner instance.
    pub fn key_modifier(&self) -> f64 {
        self.km
    }

    /// `g(start)`, the committed cost from the current start to the goal.
    /// `+inf` if unreachable.
    pub fn start_cost(&self) -> f64 {
        self.nodes.g(self.s_start)
    }
}

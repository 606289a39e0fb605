//! A* over dense-index graphs.

use crate::grid::PassabilityGrid;
use crate::heap::IndexedMinHeap;

const PARENT_NONE: usize = usize::MAX;

/// A graph searchable by [`FlatSearch`]: nodes are dense indices in
/// `0..len()`, some of which may be empty slots.
pub trait FlatGraph {
    /// Number of node slots.
    fn len(&self) -> usize;

    /// Whether the slot at `index` holds a searchable node.
    fn is_node(&self, index: usize) -> bool;

    /// Append the successors of `index` to `buf`. The caller clears `buf`.
    fn successors(&self, index: usize, buf: &mut Vec<usize>);

    /// Cost of the step between two adjacent nodes.
    fn edge_cost(&self, from: usize, to: usize) -> f32;

    /// Estimated remaining cost from `from` to `to`.
    fn heuristic(&self, from: usize, to: usize) -> f32;
}

/// The plain footprint graph: passable cells, 8-way adjacency.
impl FlatGraph for PassabilityGrid {
    fn len(&self) -> usize {
        self.len()
    }

    fn is_node(&self, index: usize) -> bool {
        let p = self.coords(index);
        self.is_passable(p.x, p.z)
    }

    fn successors(&self, index: usize, buf: &mut Vec<usize>) {
        self.successors(index, buf);
    }

    fn edge_cost(&self, from: usize, to: usize) -> f32 {
        self.edge_cost(from, to)
    }

    fn heuristic(&self, from: usize, to: usize) -> f32 {
        self.heuristic(from, to)
    }
}

/// Reusable A* state for searches over [`FlatGraph`]s.
///
/// One instance amortizes its open list, cost and parent arrays across many
/// queries; `search` resets them to the graph's size each call. The resulting
/// index path is read back with [`path_indices`](Self::path_indices) in
/// goal → start order.
pub struct FlatSearch {
    open: IndexedMinHeap,
    g: Vec<f32>,
    parent: Vec<usize>,
    closed: Vec<bool>,
    succ: Vec<usize>,
    path: Vec<usize>,
    cost: f32,
}

impl Default for FlatSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatSearch {
    pub fn new() -> Self {
        Self {
            open: IndexedMinHeap::new(),
            g: Vec::new(),
            parent: Vec::new(),
            closed: Vec::new(),
            succ: Vec::new(),
            path: Vec::new(),
            cost: 0.0,
        }
    }

    /// Find a cheapest path from `start` to `goal` (node indices).
    ///
    /// Returns whether a path exists; on success the route is available via
    /// [`path_indices`](Self::path_indices) and [`cost`](Self::cost). Both
    /// endpoints must be nodes for a search to succeed.
    pub fn search<G: FlatGraph>(&mut self, graph: &G, start: usize, goal: usize) -> bool {
        self.path.clear();
        self.cost = 0.0;

        if !graph.is_node(start) || !graph.is_node(goal) {
            return false;
        }

        let n = graph.len();
        self.open.clear();
        self.g.clear();
        self.g.resize(n, f32::INFINITY);
        self.parent.clear();
        self.parent.resize(n, PARENT_NONE);
        self.closed.clear();
        self.closed.resize(n, false);

        self.g[start] = 0.0;
        self.open.insert(start, graph.heuristic(start, goal));

        while let Some(current) = self.open.remove_min() {
            if current == goal {
                self.reconstruct(goal);
                return true;
            }
            self.closed[current] = true;

            self.succ.clear();
            graph.successors(current, &mut self.succ);
            // successors() borrows the buffer, so walk it by index here.
            for i in 0..self.succ.len() {
                let next = self.succ[i];
                if self.closed[next] {
                    continue;
                }
                let tentative = self.g[current] + graph.edge_cost(current, next);
                if tentative >= self.g[next] {
                    continue;
                }
                self.g[next] = tentative;
                self.parent[next] = current;
                let f = tentative + graph.heuristic(next, goal);
                if self.open.contains(next) {
                    self.open.update(next, f);
                } else {
                    self.open.insert(next, f);
                }
            }
        }
        false
    }

    fn reconstruct(&mut self, goal: usize) {
        self.cost = self.g[goal];
        let mut cur = goal;
        loop {
            self.path.push(cur);
            if self.parent[cur] == PARENT_NONE {
                break;
            }
            cur = self.parent[cur];
        }
    }

    /// The last found path as flat indices, goal first. Empty if the last
    /// search failed.
    pub fn path_indices(&self) -> &[usize] {
        &self.path
    }

    /// Total cost of the last found path.
    pub fn cost(&self) -> f32 {
        self.cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{DIAGONAL_COST, ORTHO_COST};
    use std::collections::VecDeque;

    fn open_grid(width: usize, depth: usize) -> PassabilityGrid {
        let mut g = PassabilityGrid::new(width, depth);
        for z in 0..depth {
            for x in 0..width {
                g.set(x, z, true);
            }
        }
        g
    }

    /// Uniform-cost BFS step count (diagonals allowed), as an independent
    /// reachability and hop-count oracle.
    fn bfs_hops(grid: &PassabilityGrid, start: usize, goal: usize) -> Option<usize> {
        let mut dist = vec![usize::MAX; grid.len()];
        let mut queue = VecDeque::new();
        dist[start] = 0;
        queue.push_back(start);
        let mut buf = Vec::new();
        while let Some(cur) = queue.pop_front() {
            if cur == goal {
                return Some(dist[cur]);
            }
            buf.clear();
            grid.successors(cur, &mut buf);
            for &n in &buf {
                if dist[n] == usize::MAX {
                    dist[n] = dist[cur] + 1;
                    queue.push_back(n);
                }
            }
        }
        None
    }

    #[test]
    fn trivial_path_is_single_cell() {
        let g = open_grid(4, 4);
        let mut s = FlatSearch::new();
        let cell = g.index(2, 2);
        assert!(s.search(&g, cell, cell));
        assert_eq!(s.path_indices(), &[cell]);
        assert_eq!(s.cost(), 0.0);
    }

    #[test]
    fn straight_line_uses_ortho_steps() {
        let g = open_grid(6, 1);
        let mut s = FlatSearch::new();
        assert!(s.search(&g, g.index(0, 0), g.index(5, 0)));
        assert_eq!(s.path_indices().len(), 6);
        assert!((s.cost() - 5.0 * ORTHO_COST).abs() < 1e-6);
        assert_eq!(s.path_indices()[0], g.index(5, 0));
        assert_eq!(*s.path_indices().last().unwrap(), g.index(0, 0));
    }

    #[test]
    fn diagonal_run_is_cheaper_than_dog_leg() {
        let g = open_grid(5, 5);
        let mut s = FlatSearch::new();
        assert!(s.search(&g, g.index(0, 0), g.index(4, 4)));
        // Four diagonal steps beat any orthogonal route.
        assert_eq!(s.path_indices().len(), 5);
        assert!((s.cost() - 4.0 * DIAGONAL_COST).abs() < 1e-5);
    }

    #[test]
    fn detours_around_walls() {
        let mut g = open_grid(5, 5);
        // Vertical wall with a gap at the bottom.
        for z in 0..4 {
            g.set(2, z, false);
        }
        let mut s = FlatSearch::new();
        assert!(s.search(&g, g.index(0, 0), g.index(4, 0)));
        let hops = bfs_hops(&g, g.index(0, 0), g.index(4, 0)).unwrap();
        assert_eq!(s.path_indices().len(), hops + 1);
        for w in s.path_indices().windows(2) {
            assert!(g.edge_cost(w[0], w[1]) > 0.0, "non-adjacent step in path");
        }
    }

    #[test]
    fn unreachable_goal_fails() {
        let mut g = open_grid(5, 1);
        g.set(2, 0, false);
        let mut s = FlatSearch::new();
        assert!(!s.search(&g, g.index(0, 0), g.index(4, 0)));
        assert!(s.path_indices().is_empty());
    }

    #[test]
    fn impassable_endpoints_fail() {
        let mut g = open_grid(3, 3);
        g.set(0, 0, false);
        let mut s = FlatSearch::new();
        assert!(!s.search(&g, g.index(0, 0), g.index(2, 2)));
        assert!(!s.search(&g, g.index(2, 2), g.index(0, 0)));
    }

    #[test]
    fn reuse_across_grids_of_different_size() {
        let big = open_grid(16, 16);
        let small = open_grid(3, 3);
        let mut s = FlatSearch::new();
        assert!(s.search(&big, big.index(0, 0), big.index(15, 15)));
        assert!(s.search(&small, small.index(0, 0), small.index(2, 0)));
        assert_eq!(s.path_indices().len(), 3);
        assert!((s.cost() - 2.0 * ORTHO_COST).abs() < 1e-6);
    }

    #[test]
    fn cost_matches_recomputed_edge_sum() {
        let mut g = open_grid(8, 8);
        for z in 1..8 {
            g.set(3, z, false);
        }
        let mut s = FlatSearch::new();
        assert!(s.search(&g, g.index(0, 7), g.index(7, 7)));
        let recomputed: f32 = s
            .path_indices()
            .windows(2)
            .map(|w| g.edge_cost(w[0], w[1]))
            .sum();
        assert!((s.cost() - recomputed).abs() < 1e-5);
    }

    #[test]
    fn reaches_everything_bfs_reaches() {
        // Pseudo-random obstacle field; A* and BFS must agree on
        // reachability from the fixed start to every cell.
        let mut g = open_grid(12, 12);
        let mut state: u64 = 0x51ab_3c47;
        for z in 0..12 {
            for x in 0..12 {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                if (state >> 33) % 4 == 0 {
                    g.set(x, z, false);
                }
            }
        }
        g.set(0, 0, true);
        let start = g.index(0, 0);
        let mut s = FlatSearch::new();
        for goal in 0..g.len() {
            let p = g.coords(goal);
            if !g.is_passable(p.x, p.z) {
                continue;
            }
            assert_eq!(
                s.search(&g, start, goal),
                bfs_hops(&g, start, goal).is_some(),
                "disagreement on cell {goal}"
            );
        }
    }
}

//! Hierarchical A* across chunks and floors.
//!
//! On the start and goal floors the search walks real surface links, cell by
//! cell. Everywhere in between it routes floor-to-floor: a node on an
//! intermediate floor expands only to that floor's entrance representatives
//! (via memoized flat paths) and to directly linked surfaces of other
//! floors, so interior branching collapses to boundary size.

use std::collections::HashMap;

use strata_core::Point3;

use crate::chunk::{ChunkMap, ChunkSearchSpace};
use crate::flat::FlatSearch;
use crate::grid::{DIAGONAL_COST, ORTHO_COST};
use crate::heap::IndexedMinHeap;
use crate::path::Path;
use crate::surface::{SurfaceId, SurfaceRef};

const PARENT_NONE: usize = usize::MAX;

/// Counters from the most recent search, logged at debug level.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped and expanded from the open list.
    pub nodes_expanded: usize,
    /// Flat sub-paths answered from a chunk's cache instead of re-solved.
    pub cache_hits: usize,
    /// Cached sub-paths spliced into the final route.
    pub subpaths_spliced: usize,
}

/// Reusable hierarchical search state.
///
/// Nodes are discovered lazily: every [`SurfaceRef`] touched during the
/// search is interned into a dense arena, and the open list, cost and parent
/// arrays index that arena. Discovery is bounded by a hard node cap; hitting
/// it aborts the query with the invalid path (the bounded-latency substitute
/// for a timeout).
pub struct HierarchicalSearch {
    max_nodes: usize,
    flat: FlatSearch,
    nodes: Vec<SurfaceRef>,
    index: HashMap<SurfaceRef, usize>,
    g: Vec<f32>,
    parent: Vec<usize>,
    closed: Vec<bool>,
    open: IndexedMinHeap,
    succ: Vec<(SurfaceRef, Option<f32>)>,
    stats: SearchStats,
}

impl HierarchicalSearch {
    /// `max_nodes` caps how many distinct surfaces one query may discover.
    pub fn new(max_nodes: usize) -> Self {
        Self {
            max_nodes,
            flat: FlatSearch::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
            g: Vec::new(),
            parent: Vec::new(),
            closed: Vec::new(),
            open: IndexedMinHeap::new(),
            succ: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    /// Counters from the most recent [`search`](Self::search).
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Route from `start` to `goal` across the chunk map. Missing chunks,
    /// exhaustion, and the node cap all yield the invalid path.
    pub fn search(&mut self, chunks: &mut ChunkMap, start: SurfaceRef, goal: SurfaceRef) -> Path {
        self.reset();

        if start == goal {
            return Path::new(vec![start]);
        }
        let (Some(start_chunk), Some(goal_chunk)) =
            (chunks.get(&start.chunk), chunks.get(&goal.chunk))
        else {
            return Path::invalid();
        };
        let start_floor = start_chunk.floor_ref(start.id);
        let goal_floor = goal_chunk.floor_ref(goal.id);
        let goal_pos = goal_chunk.surface(goal.id).pos;

        let si = self.intern(start).expect("cap is at least one node");
        self.g[si] = 0.0;
        self.open.insert(si, heuristic(start_chunk.surface(start.id).pos, goal_pos));

        while let Some(cur) = self.open.remove_min() {
            let cref = self.nodes[cur];
            if cref == goal {
                let path = self.reconstruct(chunks, cur);
                log::debug!(
                    "hierarchical search {start:?} -> {goal:?}: cost {:.2}, {:?}",
                    self.g[cur],
                    self.stats
                );
                return path;
            }
            self.closed[cur] = true;
            self.stats.nodes_expanded += 1;

            let Some(chunk) = chunks.get_mut(&cref.chunk) else {
                continue;
            };
            let own = chunk.floor_ref(cref.id);
            let from_pos = chunk.surface(cref.id).pos;

            self.succ.clear();
            if own == start_floor || own == goal_floor {
                for (_, r) in chunk.surface(cref.id).links() {
                    self.succ.push((r, None));
                }
            } else {
                self.expand_via_entrances(chunk, cref.id);
                for (_, r) in chunk.surface(cref.id).links() {
                    let foreign = r.chunk != cref.chunk;
                    if foreign || chunk.surface(r.id).floor != own.id {
                        self.succ.push((r, None));
                    }
                }
            }

            for i in 0..self.succ.len() {
                let (r, precomputed) = self.succ[i];
                let cost = match precomputed {
                    Some(c) => c,
                    None => {
                        let Some(to_pos) = surface_pos(chunks, r) else {
                            continue;
                        };
                        if from_pos.column().is_diagonal_to(to_pos.column()) {
                            DIAGONAL_COST
                        } else {
                            ORTHO_COST
                        }
                    }
                };
                let Some(idx) = self.intern(r) else {
                    log::warn!(
                        "hierarchical search aborted: node cap {} reached",
                        self.max_nodes
                    );
                    return Path::invalid();
                };
                if self.closed[idx] {
                    continue;
                }
                let tentative = self.g[cur] + cost;
                if tentative >= self.g[idx] {
                    continue;
                }
                self.g[idx] = tentative;
                self.parent[idx] = cur;
                let to_pos = surface_pos(chunks, r).expect("interned node's chunk is loaded");
                let f = tentative + heuristic(to_pos, goal_pos);
                if self.open.contains(idx) {
                    self.open.update(idx, f);
                } else {
                    self.open.insert(idx, f);
                }
            }
        }
        log::debug!("hierarchical search {start:?} -> {goal:?}: no route, {:?}", self.stats);
        Path::invalid()
    }

    /// Flat hops from a surface to every entrance representative of its
    /// floor, costed by the memoized floor-footprint solver.
    fn expand_via_entrances(&mut self, chunk: &mut ChunkSearchSpace, from: SurfaceId) {
        let floor = chunk.surface(from).floor;
        let reps: Vec<SurfaceId> = chunk
            .floor(floor)
            .entrances
            .iter()
            .map(|e| e.rep)
            .filter(|&rep| rep != from)
            .collect();
        for rep in reps {
            let hit = chunk.cache().peek(from, rep).is_some();
            let sub = chunk.flat_path(&mut self.flat, from, rep);
            if !sub.is_valid() {
                continue;
            }
            if hit {
                self.stats.cache_hits += 1;
            }
            let cost = sub.cost_with(|s| chunk.surface(s.id).pos);
            self.succ.push((
                SurfaceRef {
                    chunk: chunk.pos(),
                    id: rep,
                },
                Some(cost),
            ));
        }
    }

    /// Walk parent pointers from the goal node, splicing the memoized flat
    /// path back in wherever a hop jumped across a floor. The cache may hold
    /// a hop's path in either orientation; the endpoints disambiguate.
    fn reconstruct(&mut self, chunks: &mut ChunkMap, goal_idx: usize) -> Path {
        let mut steps = vec![self.nodes[goal_idx]];
        let mut cur = goal_idx;
        while self.parent[cur] != PARENT_NONE {
            let par = self.parent[cur];
            let (cref, pref) = (self.nodes[cur], self.nodes[par]);
            let direct = chunks
                .get(&cref.chunk)
                .is_some_and(|c| c.surface(cref.id).links().any(|(_, r)| r == pref));
            if direct {
                steps.push(pref);
            } else {
                debug_assert_eq!(cref.chunk, pref.chunk, "flat hop spans chunks");
                let chunk = chunks.get_mut(&cref.chunk).expect("hop chunk is loaded");
                let sub = chunk.flat_path(&mut self.flat, cref.id, pref.id);
                debug_assert!(sub.is_valid(), "spliced hop lost its sub-path");
                if sub.goal().map(|s| s.id) == Some(cref.id) {
                    steps.extend_from_slice(&sub.steps()[1..]);
                } else {
                    steps.extend(sub.steps().iter().rev().skip(1).copied());
                }
                self.stats.subpaths_spliced += 1;
            }
            cur = par;
        }
        Path::new(steps)
    }

    fn intern(&mut self, r: SurfaceRef) -> Option<usize> {
        if let Some(&i) = self.index.get(&r) {
            return Some(i);
        }
        if self.nodes.len() >= self.max_nodes {
            return None;
        }
        let i = self.nodes.len();
        self.nodes.push(r);
        self.g.push(f32::INFINITY);
        self.parent.push(PARENT_NONE);
        self.closed.push(false);
        self.index.insert(r, i);
        Some(i)
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.g.clear();
        self.parent.clear();
        self.closed.clear();
        self.open.clear();
        self.succ.clear();
        self.stats = SearchStats::default();
    }
}

fn heuristic(from: Point3, to: Point3) -> f32 {
    from.column().manhattan(to.column()) as f32
}

fn surface_pos(chunks: &ChunkMap, r: SurfaceRef) -> Option<Point3> {
    chunks.get(&r.chunk).map(|c| c.surface(r.id).pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::refresh_contours;
    use crate::testutil::AsciiWorld;
    use strata_core::{Point, VoxelWorld, WorldDims};

    /// Build chunks at `positions`, connect orthogonal neighbors, and
    /// settle contours, the way the facade does.
    fn build_map(world: &AsciiWorld, dims: WorldDims, positions: &[Point]) -> ChunkMap {
        let mut map = ChunkMap::new();
        for &p in positions {
            map.insert(p, ChunkSearchSpace::new(world, dims, p));
        }
        for &a in positions {
            for d in [Point::new(1, 0), Point::new(0, 1)] {
                let b = a + d;
                if !map.contains_key(&b) {
                    continue;
                }
                let mut ca = map.remove(&a).unwrap();
                let mut cb = map.remove(&b).unwrap();
                ChunkSearchSpace::connect(&mut ca, &mut cb);
                map.insert(a, ca);
                map.insert(b, cb);
            }
        }
        refresh_contours(&mut map, positions.iter().copied());
        map
    }

    fn resolve(map: &ChunkMap, p: Point3) -> SurfaceRef {
        let chunk = &map[&map[&Point::ZERO].dims().chunk_of(p)];
        SurfaceRef {
            chunk: chunk.pos(),
            id: chunk.resolve(p).expect("standable cell"),
        }
    }

    fn assert_continuous(map: &ChunkMap, path: &Path) {
        for w in path.steps().windows(2) {
            let linked = map[&w[1].chunk]
                .surface(w[1].id)
                .links()
                .any(|(_, r)| r == w[0]);
            assert!(linked, "path step {:?} -> {:?} is not a link", w[1], w[0]);
        }
    }

    #[test]
    fn cross_seam_straight_line_is_optimal() {
        // Two flat 16x16 chunks; a straight x run through the seam.
        let rows: Vec<String> = (0..16).map(|_| "X".repeat(32)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let world = AsciiWorld::new(&rows);
        let dims = WorldDims {
            chunk_width: 16,
            chunk_depth: 16,
            height: world.height(),
        };
        let mut map = build_map(&world, dims, &[Point::ZERO, Point::new(1, 0)]);

        let start = resolve(&map, Point3::new(1, 0, 1));
        let goal = resolve(&map, Point3::new(30, 0, 1));
        let mut search = HierarchicalSearch::new(4096);
        let path = search.search(&mut map, start, goal);

        assert!(path.is_valid());
        assert_eq!(path.start(), Some(start));
        assert_eq!(path.goal(), Some(goal));
        assert_eq!(path.len(), 30);
        let cost = path.cost_with(|r| map[&r.chunk].surface(r.id).pos);
        assert!((cost - 29.0).abs() < 1e-4);
        assert_continuous(&map, &path);
    }

    #[test]
    fn diagonal_run_is_optimal() {
        let rows: Vec<String> = (0..8).map(|_| "X".repeat(8)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let world = AsciiWorld::new(&rows);
        let dims = WorldDims {
            chunk_width: 8,
            chunk_depth: 8,
            height: world.height(),
        };
        let mut map = build_map(&world, dims, &[Point::ZERO]);
        let start = resolve(&map, Point3::new(0, 0, 0));
        let goal = resolve(&map, Point3::new(7, 0, 7));
        let mut search = HierarchicalSearch::new(4096);
        let path = search.search(&mut map, start, goal);
        assert!(path.is_valid());
        let cost = path.cost_with(|r| map[&r.chunk].surface(r.id).pos);
        assert!((cost - 7.0 * DIAGONAL_COST).abs() < 1e-4);
    }

    #[test]
    fn intermediate_floor_routes_through_entrances() {
        // Three flat 4x4 chunks in a row: the middle chunk's floor is
        // neither the start nor the goal floor, so its nodes expand through
        // entrance representatives and spliced flat paths.
        let rows: Vec<String> = (0..4).map(|_| "X".repeat(12)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let world = AsciiWorld::new(&rows);
        let dims = WorldDims {
            chunk_width: 4,
            chunk_depth: 4,
            height: world.height(),
        };
        let mut map = build_map(
            &world,
            dims,
            &[Point::ZERO, Point::new(1, 0), Point::new(2, 0)],
        );

        let start = resolve(&map, Point3::new(0, 0, 2));
        let goal = resolve(&map, Point3::new(11, 0, 2));
        let mut search = HierarchicalSearch::new(4096);
        let path = search.search(&mut map, start, goal);

        assert!(path.is_valid());
        assert_eq!(path.start(), Some(start));
        assert_eq!(path.goal(), Some(goal));
        assert_continuous(&map, &path);
        // The middle floor was crossed via at least one memoized sub-path.
        assert!(search.stats().subpaths_spliced >= 1);
        // Every chunk is visited along the way.
        for c in [Point::ZERO, Point::new(1, 0), Point::new(2, 0)] {
            assert!(path.steps().iter().any(|r| r.chunk == c));
        }
    }

    #[test]
    fn repeat_query_hits_sub_path_cache() {
        let rows: Vec<String> = (0..4).map(|_| "X".repeat(12)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let world = AsciiWorld::new(&rows);
        let dims = WorldDims {
            chunk_width: 4,
            chunk_depth: 4,
            height: world.height(),
        };
        let mut map = build_map(
            &world,
            dims,
            &[Point::ZERO, Point::new(1, 0), Point::new(2, 0)],
        );
        let start = resolve(&map, Point3::new(0, 0, 0));
        let goal = resolve(&map, Point3::new(11, 0, 3));
        let mut search = HierarchicalSearch::new(4096);
        assert!(search.search(&mut map, start, goal).is_valid());
        let first_hits = search.stats().cache_hits;
        assert!(search.search(&mut map, start, goal).is_valid());
        assert!(search.stats().cache_hits > first_hits);
    }

    #[test]
    fn disconnected_chunks_are_unreachable() {
        // Two chunks with a gap between them: registered but never linked.
        let rows: Vec<String> = (0..4)
            .map(|_| format!("{}    {}", "X".repeat(4), "X".repeat(4)))
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let world = AsciiWorld::new(&rows);
        let dims = WorldDims {
            chunk_width: 4,
            chunk_depth: 4,
            height: world.height(),
        };
        // Chunks (0,0) and (2,0); the empty middle chunk is not registered.
        let mut map = build_map(&world, dims, &[Point::ZERO, Point::new(2, 0)]);
        let start = resolve(&map, Point3::new(0, 0, 0));
        let goal = resolve(&map, Point3::new(8, 0, 0));
        let mut search = HierarchicalSearch::new(4096);
        let path = search.search(&mut map, start, goal);
        assert!(!path.is_valid());
    }

    #[test]
    fn node_cap_aborts_with_invalid_path() {
        let rows: Vec<String> = (0..16).map(|_| "X".repeat(16)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let world = AsciiWorld::new(&rows);
        let dims = WorldDims {
            chunk_width: 16,
            chunk_depth: 16,
            height: world.height(),
        };
        let mut map = build_map(&world, dims, &[Point::ZERO]);
        let start = resolve(&map, Point3::new(0, 0, 0));
        let goal = resolve(&map, Point3::new(15, 0, 15));
        let mut search = HierarchicalSearch::new(4);
        assert!(!search.search(&mut map, start, goal).is_valid());
    }

    #[test]
    fn start_equals_goal_is_trivial() {
        let world = AsciiWorld::new(&["XXX", "XXX"]);
        let dims = WorldDims {
            chunk_width: 3,
            chunk_depth: 2,
            height: world.height(),
        };
        let mut map = build_map(&world, dims, &[Point::ZERO]);
        let s = resolve(&map, Point3::new(1, 0, 1));
        let mut search = HierarchicalSearch::new(64);
        let path = search.search(&mut map, s, s);
        assert!(path.is_valid());
        assert_eq!(path.steps(), &[s]);
    }
}

//! The pathfinding facade: chunk lifecycle plus cached world-level queries.

use std::rc::Rc;

use strata_core::{ORTHO_4, Point, Point3, VoxelWorld, WorldDims};

use crate::cache::SubPathCache;
use crate::chunk::{ChunkMap, ChunkSearchSpace, refresh_contours};
use crate::hastar::{HierarchicalSearch, SearchStats};
use crate::path::Path;
use crate::surface::SurfaceRef;

/// Tuning knobs for the navigation service. Constructed explicitly and
/// injected; there is no global configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavConfig {
    /// Chunk footprint and world height.
    pub dims: WorldDims,
    /// Hard cap on surfaces one hierarchical query may discover. Hitting it
    /// aborts the query with the invalid path.
    pub max_search_nodes: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            dims: WorldDims::default(),
            max_search_nodes: 50_000,
        }
    }
}

/// Service object tying the pieces together: owns the world capability, the
/// chunk map, the hierarchical search state, and a cache of whole query
/// results.
///
/// Every mutating operation takes `&mut self`; callers that share a
/// `Pathfinder` across threads must serialize access externally (the borrow
/// rules already enforce this in-process).
pub struct Pathfinder<W> {
    world: W,
    config: NavConfig,
    chunks: ChunkMap,
    search: HierarchicalSearch,
    results: SubPathCache<SurfaceRef>,
}

impl<W: VoxelWorld> Pathfinder<W> {
    pub fn new(world: W, config: NavConfig) -> Self {
        Self {
            world,
            config,
            chunks: ChunkMap::new(),
            search: HierarchicalSearch::new(config.max_search_nodes),
            results: SubPathCache::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> NavConfig {
        self.config
    }

    #[inline]
    pub fn chunk(&self, pos: Point) -> Option<&ChunkSearchSpace> {
        self.chunks.get(&pos)
    }

    #[inline]
    pub fn is_registered(&self, pos: Point) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Counters from the most recent hierarchical query.
    pub fn last_stats(&self) -> SearchStats {
        self.search.stats()
    }

    // -----------------------------------------------------------------------
    // Chunk lifecycle
    // -----------------------------------------------------------------------

    /// Build the chunk at `pos` if absent and seam it to every registered
    /// orthogonal neighbor. Idempotent.
    pub fn register_chunk(&mut self, pos: Point) {
        if self.chunks.contains_key(&pos) {
            return;
        }
        log::debug!("registering chunk {pos}");
        let chunk = ChunkSearchSpace::new(&self.world, self.config.dims, pos);
        self.chunks.insert(pos, chunk);
        self.connect_neighbors(pos);
        self.refresh_around(pos);
        self.results.clear();
    }

    /// Discard and re-derive the chunk at `pos` — the hook for block edits.
    /// No-op if the chunk is not registered.
    pub fn invalidate_chunk(&mut self, pos: Point) {
        if !self.chunks.contains_key(&pos) {
            return;
        }
        log::debug!("invalidating chunk {pos}");
        self.sever_neighbors(pos);
        self.chunks.remove(&pos);
        let chunk = ChunkSearchSpace::new(&self.world, self.config.dims, pos);
        self.chunks.insert(pos, chunk);
        self.connect_neighbors(pos);
        self.refresh_around(pos);
        self.results.clear();
    }

    /// Drop the chunk at `pos` entirely, unlinking the surviving neighbors.
    pub fn unregister_chunk(&mut self, pos: Point) {
        if !self.chunks.contains_key(&pos) {
            return;
        }
        log::debug!("unregistering chunk {pos}");
        self.sever_neighbors(pos);
        self.chunks.remove(&pos);
        self.refresh_around(pos);
        self.results.clear();
    }

    fn connect_neighbors(&mut self, pos: Point) {
        for d in ORTHO_4 {
            let n = pos + d;
            if !self.chunks.contains_key(&n) {
                continue;
            }
            let mut a = self.chunks.remove(&pos).expect("registered above");
            let mut b = self.chunks.remove(&n).expect("checked present");
            ChunkSearchSpace::connect(&mut a, &mut b);
            self.chunks.insert(pos, a);
            self.chunks.insert(n, b);
        }
    }

    fn sever_neighbors(&mut self, pos: Point) {
        for d in ORTHO_4 {
            let n = pos + d;
            if !self.chunks.contains_key(&n) {
                continue;
            }
            let mut a = self.chunks.remove(&pos).expect("caller checked");
            let mut b = self.chunks.remove(&n).expect("checked present");
            ChunkSearchSpace::disconnect(&mut a, &mut b);
            self.chunks.insert(pos, a);
            self.chunks.insert(n, b);
        }
    }

    /// Settle contours and entrances for `pos` and its registered neighbors
    /// after a topology change.
    fn refresh_around(&mut self, pos: Point) {
        let mut targets = vec![pos];
        for d in ORTHO_4 {
            targets.push(pos + d);
        }
        refresh_contours(&mut self.chunks, targets);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The canonical surface for a world cell: the exact standable cell if
    /// there is one, else the highest surface at or below it in that column
    /// (an agent's cell is one above its supporting block).
    pub fn resolve_surface(&self, p: Point3) -> Option<SurfaceRef> {
        let chunk = self.chunks.get(&self.config.dims.chunk_of(p))?;
        let id = chunk.resolve(p).or_else(|| chunk.resolve_below(p))?;
        Some(SurfaceRef {
            chunk: chunk.pos(),
            id,
        })
    }

    /// Route between two world cells. Unresolvable endpoints, unloaded
    /// chunks, and exhausted searches all yield the invalid path; results
    /// (including invalid ones) are cached until the next topology change.
    pub fn find_path(&mut self, start: Point3, goal: Point3) -> Rc<Path> {
        let (Some(s), Some(g)) = (self.resolve_surface(start), self.resolve_surface(goal)) else {
            return Rc::new(Path::invalid());
        };
        self.find_surface_path(s, g)
    }

    /// Route between two surfaces. The refs are validated against current
    /// chunk state first — handles from before a rebuild may no longer
    /// exist.
    pub fn find_surface_path(&mut self, start: SurfaceRef, goal: SurfaceRef) -> Rc<Path> {
        let (Some(start), Some(goal)) = (self.canonical(start), self.canonical(goal)) else {
            return Rc::new(Path::invalid());
        };
        if let Some(hit) = self.results.lookup(start, goal) {
            // The cache shares one path per unordered pair; orient it for
            // this query direction.
            if hit.is_valid() && hit.start() != Some(start) {
                return Rc::new(hit.reversed());
            }
            return hit;
        }
        let path = self.search.search(&mut self.chunks, start, goal);
        self.results.insert(start, goal, path)
    }

    fn canonical(&self, r: SurfaceRef) -> Option<SurfaceRef> {
        let chunk = self.chunks.get(&r.chunk)?;
        (r.id.index() < chunk.table().len()).then_some(r)
    }
}

//! Per-chunk search space: surfaces, floors, seam links to neighboring
//! chunks, contour bookkeeping, and the memoized flat solver entry point.

use std::collections::HashMap;
use std::rc::Rc;

use strata_core::{Point, Point3, VoxelWorld, WorldDims, opposite_dir};

use crate::cache::SubPathCache;
use crate::flat::{FlatGraph, FlatSearch};
use crate::floor::{Entrance, Floor, FloorId, FloorRef, build_floors};
use crate::grid::{DIAGONAL_COST, ORTHO_COST, PassabilityGrid};
use crate::path::Path;
use crate::surface::{SurfaceId, SurfaceRef, SurfaceTable, WalkableSurface, WalkableSurfaceFinder, dir_index};

/// Chunk storage keyed by chunk coordinate.
pub type ChunkMap = HashMap<Point, ChunkSearchSpace>;

/// Recompute contours and entrances for the `targets` against the map's
/// current floor assignments. Chunks are taken out of the map one at a time
/// so the resolver can read the others; unregistered targets are skipped.
pub(crate) fn refresh_contours<I>(map: &mut ChunkMap, targets: I)
where
    I: IntoIterator<Item = Point>,
{
    for k in targets {
        let Some(mut chunk) = map.remove(&k) else {
            continue;
        };
        chunk.recompute_contours(|r| {
            map.get(&r.chunk).map(|c| FloorRef {
                chunk: r.chunk,
                id: c.surface(r.id).floor,
            })
        });
        map.insert(k, chunk);
    }
}

/// The navigation state of one chunk column: its walkable surfaces, their
/// floor decomposition, and a cache of flat paths solved inside it.
///
/// All state is derived from block data and rebuilt wholesale on edit; only
/// the chunk coordinate and dimensions survive a [`rebuild`](Self::rebuild).
/// Cross-chunk seam links are grafted on afterwards by
/// [`connect`](Self::connect) and must be re-established by the owner after
/// any rebuild.
pub struct ChunkSearchSpace {
    pos: Point,
    dims: WorldDims,
    table: SurfaceTable,
    floors: Vec<Floor>,
    walkable: PassabilityGrid,
    cache: SubPathCache<SurfaceId>,
}

impl ChunkSearchSpace {
    /// Build the search space for the chunk at `pos` from block data.
    pub fn new<W: VoxelWorld>(world: &W, dims: WorldDims, pos: Point) -> Self {
        let mut space = Self {
            pos,
            dims,
            table: SurfaceTable::empty(),
            floors: Vec::new(),
            walkable: PassabilityGrid::new(0, 0),
            cache: SubPathCache::new(),
        };
        space.rebuild(world);
        space
    }

    /// Re-derive everything from block data: surfaces, links, floors. Drops
    /// all cross-chunk links and the path cache; contours are reset to the
    /// isolated-chunk state.
    pub fn rebuild<W: VoxelWorld>(&mut self, world: &W) {
        self.table = WalkableSurfaceFinder::new(self.dims, self.pos).find(world);
        let origin = self.dims.origin(self.pos);
        self.floors = build_floors(&mut self.table, self.pos, origin);

        let (w, d) = (self.table.width(), self.table.depth());
        self.walkable = PassabilityGrid::new(w, d);
        for z in 0..d {
            for x in 0..w {
                if !self.table.column(x, z).is_empty() {
                    self.walkable.set(x, z, true);
                }
            }
        }

        self.cache.clear();
        // No foreign links can exist on a fresh table.
        self.recompute_contours(|_| None);
        log::debug!(
            "chunk {}: rebuilt with {} surfaces, {} floors",
            self.pos,
            self.table.len(),
            self.floors.len()
        );
    }

    #[inline]
    pub fn pos(&self) -> Point {
        self.pos
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    #[inline]
    pub fn table(&self) -> &SurfaceTable {
        &self.table
    }

    #[inline]
    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    #[inline]
    pub fn floor(&self, id: FloorId) -> &Floor {
        &self.floors[id.index()]
    }

    #[inline]
    pub fn surface(&self, id: SurfaceId) -> &WalkableSurface {
        self.table.surface(id)
    }

    /// Columns with at least one standable surface.
    #[inline]
    pub fn walkable(&self) -> &PassabilityGrid {
        &self.walkable
    }

    #[inline]
    pub fn cache(&self) -> &SubPathCache<SurfaceId> {
        &self.cache
    }

    /// Resolve a world cell to the surface standing exactly on it, if the
    /// cell lies in this chunk and is standable.
    pub fn resolve(&self, p: Point3) -> Option<SurfaceId> {
        if self.dims.chunk_of(p) != self.pos {
            return None;
        }
        let (lx, lz) = self.dims.local(p);
        self.table
            .column(lx, lz)
            .iter()
            .copied()
            .find(|&s| self.table.surface(s).pos == p)
    }

    /// The highest surface at or below the queried cell in its column, for
    /// mapping an agent position (standing one cell above its support) to a
    /// surface.
    pub fn resolve_below(&self, p: Point3) -> Option<SurfaceId> {
        if self.dims.chunk_of(p) != self.pos {
            return None;
        }
        let (lx, lz) = self.dims.local(p);
        self.table
            .column(lx, lz)
            .iter()
            .copied()
            .rev()
            .find(|&s| self.table.surface(s).pos.y <= p.y)
    }

    /// The floor owning a surface, as a qualified reference.
    pub fn floor_ref(&self, id: SurfaceId) -> FloorRef {
        FloorRef {
            chunk: self.pos,
            id: self.table.surface(id).floor,
        }
    }

    fn surface_on_floor(&self, local: Point, floor: FloorId) -> Option<SurfaceId> {
        self.table
            .column(local.x as usize, local.z as usize)
            .iter()
            .copied()
            .find(|&s| self.table.surface(s).floor == floor)
    }

    // -----------------------------------------------------------------------
    // Contours and entrances
    // -----------------------------------------------------------------------

    /// Re-derive contour flags, per-floor contour lists, and entrances.
    ///
    /// `resolve_foreign` maps a link into another chunk to that surface's
    /// floor; it returns `None` if the chunk is unknown, in which case the
    /// link is ignored. Must be re-run on this chunk and all its connected
    /// neighbors whenever floor topology changes on either side of a seam.
    pub fn recompute_contours<F>(&mut self, resolve_foreign: F)
    where
        F: Fn(SurfaceRef) -> Option<FloorRef>,
    {
        let here = self.pos;
        let foreign_or_local = |table: &SurfaceTable, r: SurfaceRef| -> Option<FloorRef> {
            if r.chunk == here {
                Some(FloorRef {
                    chunk: here,
                    id: table.surface(r.id).floor,
                })
            } else {
                resolve_foreign(r)
            }
        };

        for id in self.table.ids() {
            let own = self.table.surface(id).floor;
            let contour = self.table.surface(id).links().any(|(_, r)| {
                foreign_or_local(&self.table, r)
                    .is_some_and(|fr| fr.chunk != here || fr.id != own)
            });
            self.table.surface_mut(id).contour = contour;
        }

        for f in &mut self.floors {
            f.contour.clear();
            f.entrances.clear();
        }

        // Scan order (z then x) keeps entrance runs contiguous so absorb
        // can grow them cell by cell.
        for z in 0..self.table.depth() {
            for x in 0..self.table.width() {
                for ci in 0..self.table.column(x, z).len() {
                    let id = self.table.column(x, z)[ci];
                    let (own, is_contour) = {
                        let s = self.table.surface(id);
                        (s.floor, s.contour)
                    };
                    if !is_contour {
                        continue;
                    }
                    let cell = Point::new(x as i32, z as i32);
                    self.floors[own.index()].contour.push(id);

                    let mut others = std::collections::BTreeSet::new();
                    for (_, r) in self.table.surface(id).links() {
                        if let Some(fr) = foreign_or_local(&self.table, r) {
                            if fr.chunk != here || fr.id != own {
                                others.insert(fr);
                            }
                        }
                    }
                    let floor = &mut self.floors[own.index()];
                    for other in others {
                        let absorbed = floor
                            .entrances
                            .iter_mut()
                            .any(|e| e.other == other && e.try_absorb(cell));
                        if !absorbed {
                            floor.entrances.push(Entrance::new(cell, other));
                        }
                    }
                }
            }
        }

        // Pin each entrance to the surface at its rectangle's center.
        for fi in 0..self.floors.len() {
            for ei in 0..self.floors[fi].entrances.len() {
                let center = self.floors[fi].entrances[ei].rect.center();
                let rep = self
                    .surface_on_floor(center, FloorId(fi as u32))
                    .expect("entrance center lies on its own floor");
                self.floors[fi].entrances[ei].rep = rep;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Seams
    // -----------------------------------------------------------------------

    /// Link the facing borders of two orthogonally adjacent chunks.
    ///
    /// Surfaces pair up when their height difference is at most one cell;
    /// seam links are orthogonal only. Paired floors become neighbors on
    /// both sides and both path caches are dropped. Contours are *not*
    /// recomputed here: the owner does that once all seams are settled.
    pub fn connect(a: &mut ChunkSearchSpace, b: &mut ChunkSearchSpace) {
        let delta = b.pos - a.pos;
        let dir = dir_index(delta)
            .filter(|&d| d % 2 == 0)
            .unwrap_or_else(|| panic!("chunks {} and {} are not adjacent", a.pos, b.pos));
        let back = opposite_dir(dir);

        let (w, d) = (a.table.width(), a.table.depth());
        assert_eq!((w, d), (b.table.width(), b.table.depth()));

        let edge = |len: usize, sign: i32| if sign > 0 { len - 1 } else { 0 };
        if delta.x != 0 {
            let (ax, bx) = (edge(w, delta.x), edge(w, -delta.x));
            for z in 0..d {
                Self::link_seam_columns(a, b, (ax, z), (bx, z), dir, back);
            }
        } else {
            let (az, bz) = (edge(d, delta.z), edge(d, -delta.z));
            for x in 0..w {
                Self::link_seam_columns(a, b, (x, az), (x, bz), dir, back);
            }
        }

        a.cache.clear();
        b.cache.clear();
        log::debug!("connected chunks {} and {}", a.pos, b.pos);
    }

    fn link_seam_columns(
        a: &mut ChunkSearchSpace,
        b: &mut ChunkSearchSpace,
        (ax, az): (usize, usize),
        (bx, bz): (usize, usize),
        dir: usize,
        back: usize,
    ) {
        for ci in 0..a.table.column(ax, az).len() {
            let sa = a.table.column(ax, az)[ci];
            let ya = a.table.surface(sa).pos.y;
            let paired = b
                .table
                .column(bx, bz)
                .iter()
                .copied()
                .find(|&sb| (b.table.surface(sb).pos.y - ya).abs() <= 1);
            let Some(sb) = paired else { continue };

            a.table.surface_mut(sa).neighbors[dir] = Some(SurfaceRef { chunk: b.pos, id: sb });
            b.table.surface_mut(sb).neighbors[back] = Some(SurfaceRef { chunk: a.pos, id: sa });

            let fa = a.table.surface(sa).floor;
            let fb = b.table.surface(sb).floor;
            a.floors[fa.index()].neighbors.insert(FloorRef { chunk: b.pos, id: fb });
            b.floors[fb.index()].neighbors.insert(FloorRef { chunk: a.pos, id: fa });
        }
    }

    /// Sever every link between two chunks: surface links, floor neighbor
    /// relations, and both path caches. Contour recomputation is left to
    /// the owner, as with [`connect`](Self::connect).
    pub fn disconnect(a: &mut ChunkSearchSpace, b: &mut ChunkSearchSpace) {
        a.drop_links_to(b.pos);
        b.drop_links_to(a.pos);
        log::debug!("disconnected chunks {} and {}", a.pos, b.pos);
    }

    fn drop_links_to(&mut self, other: Point) {
        for id in self.table.ids() {
            let s = self.table.surface_mut(id);
            for n in s.neighbors.iter_mut() {
                if n.is_some_and(|r| r.chunk == other) {
                    *n = None;
                }
            }
        }
        for f in &mut self.floors {
            f.neighbors.retain(|r| r.chunk != other);
        }
        self.cache.clear();
    }

    // -----------------------------------------------------------------------
    // Flat paths
    // -----------------------------------------------------------------------

    /// Cheapest route between two surfaces of the same floor, memoized.
    ///
    /// Solved over the floor's surface-link graph, so every step of the
    /// result is a walkable link (vertically stacked or steeply offset
    /// columns of one floor never short-circuit through the 2D footprint).
    /// The returned path is shared with the cache and may be stored in
    /// either orientation: a hit on the reversed key yields the path solved
    /// for the opposite query. Callers check [`Path::start`] to orient it.
    /// Unreachable surfaces yield (and cache) the invalid path.
    pub fn flat_path(
        &mut self,
        search: &mut FlatSearch,
        from: SurfaceId,
        to: SurfaceId,
    ) -> Rc<Path> {
        if let Some(hit) = self.cache.lookup(from, to) {
            return hit;
        }

        let floor = self.table.surface(from).floor;
        debug_assert_eq!(
            floor,
            self.table.surface(to).floor,
            "flat query spans floors"
        );

        let walk = FloorWalk {
            table: &self.table,
            chunk: self.pos,
            floor,
        };
        let path = if search.search(&walk, from.index(), to.index()) {
            let steps = search
                .path_indices()
                .iter()
                .map(|&i| SurfaceRef {
                    chunk: self.pos,
                    id: SurfaceId(i as u32),
                })
                .collect();
            Path::new(steps)
        } else {
            Path::invalid()
        };
        self.cache.insert(from, to, path)
    }
}

/// One floor's surfaces as a search graph: nodes are arena indices, edges
/// are the intra-chunk links between surfaces of that floor.
struct FloorWalk<'a> {
    table: &'a SurfaceTable,
    chunk: Point,
    floor: FloorId,
}

impl FloorWalk<'_> {
    fn column_of(&self, index: usize) -> Point {
        self.table.surface(SurfaceId(index as u32)).pos.column()
    }
}

impl FlatGraph for FloorWalk<'_> {
    fn len(&self) -> usize {
        self.table.len()
    }

    fn is_node(&self, index: usize) -> bool {
        self.table.surface(SurfaceId(index as u32)).floor == self.floor
    }

    fn successors(&self, index: usize, buf: &mut Vec<usize>) {
        for (_, r) in self.table.surface(SurfaceId(index as u32)).links() {
            if r.chunk == self.chunk && self.table.surface(r.id).floor == self.floor {
                buf.push(r.id.index());
            }
        }
    }

    fn edge_cost(&self, from: usize, to: usize) -> f32 {
        if self.column_of(from).is_diagonal_to(self.column_of(to)) {
            DIAGONAL_COST
        } else {
            ORTHO_COST
        }
    }

    fn heuristic(&self, from: usize, to: usize) -> f32 {
        self.column_of(from).manhattan(self.column_of(to)) as f32
    }
}

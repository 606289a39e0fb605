//! Walkable surfaces: extraction from block data and 8-direction adjacency.
//!
//! Surfaces are arena-allocated per chunk and addressed by dense
//! [`SurfaceId`] handles; cross-chunk references carry the owning chunk
//! coordinate ([`SurfaceRef`]). Handles, not object references: a chunk
//! rebuild discards the whole arena wholesale.

use strata_core::{DIRECTIONS_8, Point, Point3, VoxelWorld, WorldDims};

use crate::floor::FloorId;

/// Direction index of north (0, -1) in [`DIRECTIONS_8`].
pub const NORTH: usize = 0;
/// Direction index of east (1, 0).
pub const EAST: usize = 2;
/// Direction index of south (0, 1).
pub const SOUTH: usize = 4;
/// Direction index of west (-1, 0).
pub const WEST: usize = 6;

/// Index into [`DIRECTIONS_8`] for a unit step, if it is one.
pub fn dir_index(step: Point) -> Option<usize> {
    DIRECTIONS_8.iter().position(|&d| d == step)
}

/// Dense handle to a surface within one chunk's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A surface handle qualified by its owning chunk coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceRef {
    pub chunk: Point,
    pub id: SurfaceId,
}

/// A single standable cell: solid block with two penetrable cells of
/// headroom above it.
#[derive(Clone, Debug)]
pub struct WalkableSurface {
    /// World cell of the supporting solid block.
    pub pos: Point3,
    /// Directional links to standable neighbors, indexed by
    /// [`DIRECTIONS_8`]. Symmetric outside connect/disconnect transitions.
    pub neighbors: [Option<SurfaceRef>; 8],
    /// The floor owning this surface. Every surface belongs to exactly one
    /// floor once floor construction has run.
    pub floor: FloorId,
    /// Whether any neighbor belongs to a different floor.
    pub contour: bool,
    /// Whether the surface sits on the chunk's outer column ring.
    pub border: bool,
}

impl WalkableSurface {
    fn new(pos: Point3, border: bool) -> Self {
        Self {
            pos,
            neighbors: [None; 8],
            floor: FloorId::NONE,
            contour: false,
            border,
        }
    }

    /// Iterate the present neighbor links.
    pub fn links(&self) -> impl Iterator<Item = (usize, SurfaceRef)> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .filter_map(|(d, n)| n.map(|r| (d, r)))
    }
}

/// One chunk's surfaces plus the per-column stacking index.
///
/// `columns[z * width + x]` lists the surfaces stacked at footprint column
/// (x, z), ordered by ascending height (a floor and a bridge above it are two
/// entries).
pub struct SurfaceTable {
    width: usize,
    depth: usize,
    surfaces: Vec<WalkableSurface>,
    columns: Vec<Vec<SurfaceId>>,
}

impl SurfaceTable {
    /// A zero-sized placeholder table, replaced on the first rebuild.
    pub(crate) fn empty() -> Self {
        Self::new(0, 0)
    }

    fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            surfaces: Vec::new(),
            columns: vec![Vec::new(); width * depth],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    #[inline]
    pub fn surface(&self, id: SurfaceId) -> &WalkableSurface {
        &self.surfaces[id.index()]
    }

    #[inline]
    pub fn surface_mut(&mut self, id: SurfaceId) -> &mut WalkableSurface {
        &mut self.surfaces[id.index()]
    }

    /// The surfaces stacked at chunk-local column (x, z), ascending height.
    #[inline]
    pub fn column(&self, x: usize, z: usize) -> &[SurfaceId] {
        &self.columns[z * self.width + x]
    }

    /// Iterate `(id, surface)` pairs in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &WalkableSurface)> {
        self.surfaces
            .iter()
            .enumerate()
            .map(|(i, s)| (SurfaceId(i as u32), s))
    }

    pub fn ids(&self) -> impl Iterator<Item = SurfaceId> + use<> {
        (0..self.surfaces.len() as u32).map(SurfaceId)
    }

    fn push(&mut self, x: usize, z: usize, surface: WalkableSurface) -> SurfaceId {
        let id = SurfaceId(self.surfaces.len() as u32);
        self.surfaces.push(surface);
        self.columns[z * self.width + x].push(id);
        id
    }
}

/// Scans raw block data into a [`SurfaceTable`] for one chunk column.
pub struct WalkableSurfaceFinder {
    dims: WorldDims,
    chunk: Point,
}

impl WalkableSurfaceFinder {
    pub fn new(dims: WorldDims, chunk: Point) -> Self {
        Self { dims, chunk }
    }

    /// Extract all walkable surfaces and their intra-chunk adjacency.
    pub fn find<W: VoxelWorld>(&self, world: &W) -> SurfaceTable {
        let mut table = SurfaceTable::new(
            self.dims.chunk_width as usize,
            self.dims.chunk_depth as usize,
        );
        self.find_surfaces(world, &mut table);
        self.link_neighbors(world, &mut table);
        table
    }

    fn find_surfaces<W: VoxelWorld>(&self, world: &W, table: &mut SurfaceTable) {
        let origin = self.dims.origin(self.chunk);
        let (w, d) = (table.width, table.depth);
        for z in 0..d {
            for x in 0..w {
                let border = x == 0 || z == 0 || x == w - 1 || z == d - 1;
                let (wx, wz) = (origin.x + x as i32, origin.z + z as i32);
                for y in 0..world.height() {
                    let pos = Point3::new(wx, y, wz);
                    if world.is_solid(pos)
                        && world.is_penetrable(pos.shift(0, 1, 0))
                        && world.is_penetrable(pos.shift(0, 2, 0))
                    {
                        table.push(x, z, WalkableSurface::new(pos, border));
                    }
                }
            }
        }
    }

    /// Two candidates link only if their height difference is at most one
    /// cell and, for diagonal travel, both orthogonal corner cells above the
    /// higher surface are penetrable (no clipping through a wall corner).
    fn link_neighbors<W: VoxelWorld>(&self, world: &W, table: &mut SurfaceTable) {
        let (w, d) = (table.width as i32, table.depth as i32);
        for z in 0..d {
            for x in 0..w {
                for ci in 0..table.column(x as usize, z as usize).len() {
                    let id = table.column(x as usize, z as usize)[ci];
                    let pos = table.surface(id).pos;
                    for (dir, step) in DIRECTIONS_8.iter().enumerate() {
                        let (nx, nz) = (x + step.x, z + step.z);
                        if nx < 0 || nz < 0 || nx >= w || nz >= d {
                            continue;
                        }
                        let target = table
                            .column(nx as usize, nz as usize)
                            .iter()
                            .copied()
                            .find(|&n| {
                                let npos = table.surface(n).pos;
                                (npos.y - pos.y).abs() <= 1
                                    && step_is_clear(world, pos, npos, *step)
                            });
                        table.surface_mut(id).neighbors[dir] = target.map(|n| SurfaceRef {
                            chunk: self.chunk,
                            id: n,
                        });
                    }
                }
            }
        }
    }
}

/// Headroom check for the travel direction between two height-compatible
/// surfaces. Orthogonal steps are always clear (guaranteed by each surface's
/// own headroom); diagonal steps need both corner cells open at head height.
pub(crate) fn step_is_clear<W: VoxelWorld>(
    world: &W,
    from: Point3,
    to: Point3,
    step: Point,
) -> bool {
    if step.x == 0 || step.z == 0 {
        return true;
    }
    let head = from.y.max(to.y) + 1;
    world.is_penetrable(Point3::new(from.x + step.x, head, from.z))
        && world.is_penetrable(Point3::new(from.x, head, from.z + step.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::AsciiWorld;
    use strata_core::Point;

    fn dims(world: &AsciiWorld) -> WorldDims {
        WorldDims {
            chunk_width: world.width(),
            chunk_depth: world.depth(),
            height: world.height(),
        }
    }

    fn find(world: &AsciiWorld) -> SurfaceTable {
        WalkableSurfaceFinder::new(dims(world), Point::ZERO).find(world)
    }

    #[test]
    fn flat_ground_one_surface_per_column() {
        let world = AsciiWorld::new(&["XXX", "XXX", "XXX"]);
        let table = find(&world);
        assert_eq!(table.len(), 9);
        for z in 0..3 {
            for x in 0..3 {
                assert_eq!(table.column(x, z).len(), 1);
            }
        }
        // Center cell links in all 8 directions.
        let center = table.column(1, 1)[0];
        assert_eq!(table.surface(center).links().count(), 8);
        // Corner cell links in 3.
        let corner = table.column(0, 0)[0];
        assert_eq!(table.surface(corner).links().count(), 3);
    }

    #[test]
    fn headroom_of_two_required() {
        // Level 0 ground everywhere, level 2 ceiling over the middle column:
        // the ground there has only one cell of clearance, so the standable
        // spot moves up to the ceiling block (open sky above it).
        let world = AsciiWorld::new(&["XXX|   | X ", "XXX|   |   "]);
        let table = find(&world);
        let col = table.column(1, 0);
        assert_eq!(col.len(), 1);
        assert_eq!(table.surface(col[0]).pos.y, 2);
        assert_eq!(table.surface(table.column(0, 0)[0]).pos.y, 0);
    }

    #[test]
    fn stacked_surfaces_in_one_column() {
        // Ground at level 0 and a bridge at level 3 in the same column.
        let world = AsciiWorld::new(&["X| | |X| | "]);
        let table = find(&world);
        let col = table.column(0, 0);
        assert_eq!(col.len(), 2);
        let lower = table.surface(col[0]).pos.y;
        let upper = table.surface(col[1]).pos.y;
        assert!(lower < upper);
        assert_eq!((lower, upper), (0, 3));
    }

    #[test]
    fn step_links_within_one_cell_height() {
        // A two-column stair: ground at level 0, step at level 1.
        let world = AsciiWorld::new(&["XX| X|  |  "]);
        let table = find(&world);
        let low = table.column(0, 0)[0];
        let high = table.column(1, 0)[0];
        assert_eq!(table.surface(low).pos.y, 0);
        assert_eq!(table.surface(high).pos.y, 1);
        assert_eq!(
            table.surface(low).neighbors[EAST],
            Some(SurfaceRef {
                chunk: Point::ZERO,
                id: high
            })
        );
        assert_eq!(
            table.surface(high).neighbors[WEST],
            Some(SurfaceRef {
                chunk: Point::ZERO,
                id: low
            })
        );
    }

    #[test]
    fn no_link_across_two_cell_drop() {
        let world = AsciiWorld::new(&["XX|  | X|  |  "]);
        let table = find(&world);
        let low = table.column(0, 0)[0];
        let high = table.column(1, 0)[0];
        assert_eq!(table.surface(high).pos.y - table.surface(low).pos.y, 2);
        assert!(table.surface(low).neighbors[EAST].is_none());
        assert!(table.surface(high).neighbors[WEST].is_none());
    }

    #[test]
    fn diagonal_blocked_by_wall_corner() {
        // Walkable at (0,0) and (1,1); wall columns at (1,0) and (0,1) rise
        // through head height, so the diagonal would clip a corner.
        let world = AsciiWorld::new(&[
            "XX| X| X|  ", //
            "XX|X |X |  ",
        ]);
        let table = find(&world);
        let a = table.column(0, 0)[0];
        let b = table.column(1, 1)[0];
        let se = dir_index(Point::new(1, 1)).unwrap();
        assert!(table.surface(a).neighbors[se].is_none());
        let nw = dir_index(Point::new(-1, -1)).unwrap();
        assert!(table.surface(b).neighbors[nw].is_none());
    }

    #[test]
    fn diagonal_open_corner_links() {
        let world = AsciiWorld::new(&["XX|  |  ", "XX|  |  "]);
        let table = find(&world);
        let a = table.column(0, 0)[0];
        let se = dir_index(Point::new(1, 1)).unwrap();
        assert!(table.surface(a).neighbors[se].is_some());
    }

    #[test]
    fn border_flags_on_outer_ring() {
        let world = AsciiWorld::new(&["XXX", "XXX", "XXX"]);
        let table = find(&world);
        let inner = table.column(1, 1)[0];
        assert!(!table.surface(inner).border);
        for (x, z) in [(0, 0), (2, 0), (0, 2), (2, 2), (1, 0), (0, 1)] {
            let id = table.column(x, z)[0];
            assert!(table.surface(id).border);
        }
    }

    #[test]
    fn links_are_symmetric() {
        let world = AsciiWorld::new(&["XXXX| X  |    |    ", "XXXX|    |    |    "]);
        let table = find(&world);
        for (id, s) in table.iter() {
            for (dir, r) in s.links() {
                let back = table.surface(r.id).neighbors[strata_core::opposite_dir(dir)];
                assert_eq!(
                    back,
                    Some(SurfaceRef {
                        chunk: Point::ZERO,
                        id
                    }),
                    "asymmetric link {id:?} dir {dir}"
                );
            }
        }
    }
}

//! Floor decomposition: sweep-built regions, greedy floor merging, and
//! entrance collapse.
//!
//! Regions are the transient product of a single row-sweep connected
//! component labelling over the walkable surfaces; they exist only inside
//! [`build_floors`]. Floors are the persistent, non-self-overlapping groups
//! the hierarchical search routes between.

use std::collections::BTreeSet;

use strata_core::{DIRECTIONS_8, Point, Range};

use crate::grid::PassabilityGrid;
use crate::surface::{EAST, SurfaceId, SurfaceTable};

/// Dense handle to a floor within one chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloorId(pub u32);

impl FloorId {
    /// Sentinel for "not yet assigned to any floor".
    pub const NONE: FloorId = FloorId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A floor handle qualified by its owning chunk coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloorRef {
    pub chunk: Point,
    pub id: FloorId,
}

/// An axis-aligned run of contiguous contour surfaces between two specific
/// floors, collapsed to one representative surface for coarse search.
#[derive(Clone, Debug)]
pub struct Entrance {
    /// Chunk-local footprint cells of the run; always a 1-wide horizontal or
    /// vertical line.
    pub rect: Range,
    /// The floor on the far side.
    pub other: FloorRef,
    /// The surface at the bounding rectangle's center.
    pub rep: SurfaceId,
}

impl Entrance {
    pub(crate) fn new(cell: Point, other: FloorRef) -> Self {
        Self {
            rect: Range::single(cell),
            other,
            rep: SurfaceId(u32::MAX),
        }
    }

    /// Try to grow the run to include `cell`, keeping it a contiguous
    /// 1-wide line. Returns false if the cell does not extend the run.
    pub(crate) fn try_absorb(&mut self, cell: Point) -> bool {
        if self.rect.contains(cell) {
            return true;
        }
        let grown = self.rect.extend(cell);
        if grown.len() == self.rect.len() + 1 && (grown.width() == 1 || grown.height() == 1) {
            self.rect = grown;
            true
        } else {
            false
        }
    }
}

/// A persistent, non-self-overlapping group of walkable surfaces covering
/// one 2D passability footprint.
#[derive(Clone, Debug)]
pub struct Floor {
    pub id: FloorId,
    /// Chunk-local footprint of the floor's columns.
    pub footprint: PassabilityGrid,
    /// Floors reachable in one step, in this chunk or a connected neighbor.
    pub neighbors: BTreeSet<FloorRef>,
    /// Surfaces of this floor adjacent to a different floor.
    pub contour: Vec<SurfaceId>,
    /// Contour runs collapsed per neighboring floor.
    pub entrances: Vec<Entrance>,
}

// ---------------------------------------------------------------------------
// Phase 1: regions (ephemeral)
// ---------------------------------------------------------------------------

/// A simply-connected surface group produced by the row sweep. Never
/// persisted.
struct Region {
    footprint: PassabilityGrid,
    surfaces: Vec<SurfaceId>,
    neighbors: BTreeSet<usize>,
}

const UNASSIGNED: u32 = u32::MAX;

/// Single-pass connected-component labelling over the surface table,
/// restricted to 2D footprints.
///
/// Sweeps row by row (fixed z, increasing x). A contiguous run of
/// east-linked surfaces that maps cleanly to exactly one previous-row region
/// — and is the first run to continue that region this row — merges into it;
/// any split or merge of vertical connectivity starts a new region and
/// records adjacency instead.
fn build_regions(table: &SurfaceTable, origin: Point) -> Vec<Region> {
    let (width, depth) = (table.width(), table.depth());
    let mut regions: Vec<Region> = Vec::new();
    let mut region_of: Vec<u32> = vec![UNASSIGNED; table.len()];

    // Directions pointing into the previous row (NW, N, NE).
    const UP_DIRS: [usize; 3] = [7, 0, 1];

    for z in 0..depth {
        let mut continued: BTreeSet<usize> = BTreeSet::new();
        for x in 0..width {
            for &seed in table.column(x, z) {
                if region_of[seed.index()] != UNASSIGNED {
                    continue;
                }

                // Collect the run of east-linked surfaces starting here.
                let mut run = vec![seed];
                let mut cur = seed;
                while let Some(next) = table.surface(cur).neighbors[EAST] {
                    if region_of[next.id.index()] != UNASSIGNED {
                        break;
                    }
                    run.push(next.id);
                    cur = next.id;
                }

                // Previous-row regions the run is walkably connected to.
                let mut above: BTreeSet<usize> = BTreeSet::new();
                for &s in &run {
                    for dir in UP_DIRS {
                        if let Some(n) = table.surface(s).neighbors[dir] {
                            let r = region_of[n.id.index()];
                            if r != UNASSIGNED {
                                above.insert(r as usize);
                            }
                        }
                    }
                }

                let target = if above.len() == 1 {
                    let r = *above.iter().next().expect("single element");
                    // A region may only be continued by one run per row; a
                    // second run re-reaching it is a split.
                    continued.insert(r).then_some(r)
                } else {
                    None
                };

                let rid = match target {
                    Some(r) => r,
                    None => {
                        let rid = regions.len();
                        regions.push(Region {
                            footprint: PassabilityGrid::new(width, depth),
                            surfaces: Vec::new(),
                            neighbors: BTreeSet::new(),
                        });
                        for &a in &above {
                            regions[a].neighbors.insert(rid);
                            regions[rid].neighbors.insert(a);
                        }
                        continued.insert(rid);
                        rid
                    }
                };

                for &s in &run {
                    region_of[s.index()] = rid as u32;
                    let pos = table.surface(s).pos;
                    regions[rid].footprint.set(
                        (pos.x - origin.x) as usize,
                        (pos.z - origin.z) as usize,
                        true,
                    );
                    regions[rid].surfaces.push(s);
                }
            }
        }
    }
    regions
}

// ---------------------------------------------------------------------------
// Phase 2: floors
// ---------------------------------------------------------------------------

/// Decompose the chunk's surfaces into floors, writing each surface's owner
/// back into the table.
///
/// Regions form an adjacency graph; a stack-based traversal greedily merges
/// a neighbor region into the growing floor unless the merge would overlap
/// territory the floor already claims (which would let the footprint
/// self-intersect, e.g. a ramp looping back over its own base).
pub(crate) fn build_floors(table: &mut SurfaceTable, chunk: Point, origin: Point) -> Vec<Floor> {
    let (width, depth) = (table.width(), table.depth());
    let regions = build_regions(table, origin);

    let mut floor_of_region: Vec<u32> = vec![UNASSIGNED; regions.len()];
    let mut floors: Vec<Floor> = Vec::new();

    for start in 0..regions.len() {
        if floor_of_region[start] != UNASSIGNED {
            continue;
        }
        let fid = floors.len();
        let mut footprint = PassabilityGrid::new(width, depth);
        let mut members: Vec<SurfaceId> = Vec::new();
        let mut stack = vec![start];
        while let Some(r) = stack.pop() {
            if floor_of_region[r] != UNASSIGNED {
                continue;
            }
            if footprint.overlaps(&regions[r].footprint) {
                // Merging would revisit claimed territory; this region goes
                // to another floor.
                continue;
            }
            floor_of_region[r] = fid as u32;
            footprint.merge(&regions[r].footprint);
            members.extend_from_slice(&regions[r].surfaces);
            for &n in &regions[r].neighbors {
                if floor_of_region[n] == UNASSIGNED {
                    stack.push(n);
                }
            }
        }
        let id = FloorId(fid as u32);
        for &s in &members {
            table.surface_mut(s).floor = id;
        }
        floors.push(Floor {
            id,
            footprint,
            neighbors: BTreeSet::new(),
            contour: Vec::new(),
            entrances: Vec::new(),
        });
    }

    // Region adjacencies crossing floor boundaries become floor neighbors.
    for (r, region) in regions.iter().enumerate() {
        let fa = floor_of_region[r] as usize;
        for &n in &region.neighbors {
            let fb = floor_of_region[n] as usize;
            if fa != fb {
                floors[fa].neighbors.insert(FloorRef {
                    chunk,
                    id: FloorId(fb as u32),
                });
                floors[fb].neighbors.insert(FloorRef {
                    chunk,
                    id: FloorId(fa as u32),
                });
            }
        }
    }

    debug_assert!(
        table.iter().all(|(_, s)| s.floor != FloorId::NONE),
        "surface left without a floor after decomposition"
    );
    floors
}

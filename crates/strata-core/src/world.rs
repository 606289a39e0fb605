//! The world-access seam: [`VoxelWorld`] and [`WorldDims`].
//!
//! The navigation crates never own block storage. They consume a capability
//! to ask whether a world cell is solid, injected explicitly wherever it is
//! needed (there is no implicit world singleton).

use crate::geom::{Point, Point3};

/// Capability to query the voxel world's block data.
///
/// Implementors report, for any integer world cell, whether the cell is
/// occupied by a solid block. Everything the navigation layer derives
/// (walkable surfaces, floors, passability) is a pure function of this
/// predicate and the world dimensions.
pub trait VoxelWorld {
    /// Whether the cell at `p` is solid. Cells outside the vertical bounds
    /// must report non-solid.
    fn is_solid(&self, p: Point3) -> bool;

    /// Whether an agent body can occupy the cell at `p`.
    #[inline]
    fn is_penetrable(&self, p: Point3) -> bool {
        !self.is_solid(p)
    }

    /// World height in cells. Cells with `y` in `0..height()` are scanned
    /// for walkable surfaces.
    fn height(&self) -> i32;
}

impl<W: VoxelWorld + ?Sized> VoxelWorld for &W {
    fn is_solid(&self, p: Point3) -> bool {
        (**self).is_solid(p)
    }
    fn height(&self) -> i32 {
        (**self).height()
    }
}

/// Chunk dimensions, as reported by the world collaborator.
///
/// A chunk here is the streaming unit's footprint: `chunk_width × chunk_depth`
/// columns spanning the full world height. Chunk coordinates are 2D
/// ([`Point`]), matching the 4-directional neighbor topology used by the
/// chunk lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldDims {
    pub chunk_width: i32,
    pub chunk_depth: i32,
    pub height: i32,
}

impl Default for WorldDims {
    fn default() -> Self {
        Self {
            chunk_width: 16,
            chunk_depth: 16,
            height: 64,
        }
    }
}

impl WorldDims {
    /// Number of footprint columns per chunk.
    #[inline]
    pub fn columns(&self) -> usize {
        (self.chunk_width as usize) * (self.chunk_depth as usize)
    }

    /// The chunk coordinate owning the world cell `p` (floor division, so
    /// negative coordinates map correctly).
    #[inline]
    pub fn chunk_of(&self, p: Point3) -> Point {
        Point::new(
            p.x.div_euclid(self.chunk_width),
            p.z.div_euclid(self.chunk_depth),
        )
    }

    /// Chunk-local column of the world cell `p`.
    #[inline]
    pub fn local(&self, p: Point3) -> (usize, usize) {
        (
            p.x.rem_euclid(self.chunk_width) as usize,
            p.z.rem_euclid(self.chunk_depth) as usize,
        )
    }

    /// World x/z of the chunk's minimum corner.
    #[inline]
    pub fn origin(&self, chunk: Point) -> Point {
        Point::new(chunk.x * self.chunk_width, chunk.z * self.chunk_depth)
    }
}

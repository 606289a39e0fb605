//! Bit-per-cell passability footprints.

use bitvec::prelude::{BitVec, bitvec};
use strata_core::{DIRECTIONS_8, Point};

/// Cost of an orthogonal grid step.
pub const ORTHO_COST: f32 = 1.0;
/// Cost of a diagonal grid step.
pub const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// A `width × depth` bitmap of walkable footprint columns.
///
/// One bit per (x, z) column, row-major. Floors carry one of these as their
/// footprint; the flat solver searches directly over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassabilityGrid {
    width: usize,
    depth: usize,
    bits: BitVec,
}

impl PassabilityGrid {
    /// Create an all-impassable grid.
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            bits: bitvec![0; width * depth],
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

    /// Number of cells (passable or not).
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of passable cells.
    #[inline]
    pub fn count_passable(&self) -> usize {
        self.bits.count_ones()
    }

    /// Flat index of (x, z). Callers must pass in-bounds coordinates.
    #[inline]
    pub fn index(&self, x: usize, z: usize) -> usize {
        z * self.width + x
    }

    /// (x, z) coordinates of a flat index.
    #[inline]
    pub fn coords(&self, index: usize) -> Point {
        Point::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Whether (x, z) is passable. Out-of-range coordinates are not.
    #[inline]
    pub fn is_passable(&self, x: i32, z: i32) -> bool {
        if x < 0 || z < 0 || x as usize >= self.width || z as usize >= self.depth {
            return false;
        }
        self.bits[self.index(x as usize, z as usize)]
    }

    /// Mark (x, z) passable or not.
    #[inline]
    pub fn set(&mut self, x: usize, z: usize, passable: bool) {
        let i = self.index(x, z);
        self.bits.set(i, passable);
    }

    /// Append the passable 8-neighborhood of `index` to `buf` as flat
    /// indices. The caller clears `buf` beforehand.
    pub fn successors(&self, index: usize, buf: &mut Vec<usize>) {
        let p = self.coords(index);
        for d in DIRECTIONS_8 {
            let n = p + d;
            if self.is_passable(n.x, n.z) {
                buf.push(self.index(n.x as usize, n.z as usize));
            }
        }
    }

    /// Cost of the step between two cells: 1 for orthogonal adjacency, √2
    /// for diagonal, 0 otherwise. Only meaningful for adjacent cells.
    pub fn edge_cost(&self, from: usize, to: usize) -> f32 {
        let a = self.coords(from);
        let b = self.coords(to);
        let dx = (a.x - b.x).abs();
        let dz = (a.z - b.z).abs();
        match (dx, dz) {
            (1, 0) | (0, 1) => ORTHO_COST,
            (1, 1) => DIAGONAL_COST,
            _ => 0.0,
        }
    }

    /// Manhattan-distance heuristic between two cells.
    ///
    /// With √2-cost diagonal steps this overestimates in diagonal-heavy
    /// cases, i.e. it is not strictly admissible; the behavior is kept for
    /// parity with the system this module reimplements.
    pub fn heuristic(&self, from: usize, to: usize) -> f32 {
        let a = self.coords(from);
        let b = self.coords(to);
        a.manhattan(b) as f32
    }

    /// Whether any cell is passable in both grids (bitwise AND non-empty).
    /// Grids must have identical dimensions.
    pub fn overlaps(&self, other: &PassabilityGrid) -> bool {
        debug_assert_eq!((self.width, self.depth), (other.width, other.depth));
        self.bits
            .as_raw_slice()
            .iter()
            .zip(other.bits.as_raw_slice())
            .any(|(a, b)| a & b != 0)
    }

    /// Merge `other` into `self` (bitwise OR). Grids must have identical
    /// dimensions.
    pub fn merge(&mut self, other: &PassabilityGrid) {
        debug_assert_eq!((self.width, self.depth), (other.width, other.depth));
        for (a, b) in self
            .bits
            .as_raw_mut_slice()
            .iter_mut()
            .zip(other.bits.as_raw_slice())
        {
            *a |= *b;
        }
    }

    /// Iterator over the passable cells as flat indices.
    pub fn iter_passable(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

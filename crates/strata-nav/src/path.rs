//! Path values returned by the searches.

use strata_core::Point3;

use crate::grid::{DIAGONAL_COST, ORTHO_COST};
use crate::surface::SurfaceRef;

/// An ordered sequence of surfaces **from goal back to start**, or the
/// distinguished invalid value meaning "unreachable".
///
/// Unreachable is data, not an error: searches and caches hand it around
/// like any other result (negative results are cached too).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Path {
    steps: Vec<SurfaceRef>,
    valid: bool,
}

impl Path {
    /// A valid path. `steps` runs goal → start; a degenerate one-element
    /// path means start and goal coincide.
    pub fn new(steps: Vec<SurfaceRef>) -> Self {
        Self { steps, valid: true }
    }

    /// The "no route exists" marker.
    pub fn invalid() -> Self {
        Self {
            steps: Vec::new(),
            valid: false,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Steps in goal → start order. Empty for the invalid path.
    #[inline]
    pub fn steps(&self) -> &[SurfaceRef] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The goal surface (first step), if any.
    #[inline]
    pub fn goal(&self) -> Option<SurfaceRef> {
        self.steps.first().copied()
    }

    /// The start surface (last step), if any.
    #[inline]
    pub fn start(&self) -> Option<SurfaceRef> {
        self.steps.last().copied()
    }

    /// The same route walked the other way (start → goal becomes
    /// goal → start for the reversed query).
    pub fn reversed(&self) -> Path {
        Path {
            steps: self.steps.iter().rev().copied().collect(),
            valid: self.valid,
        }
    }

    /// Sum of grid edge costs along the path: 1 per orthogonal step, √2 per
    /// diagonal step. `pos` resolves each surface to its world cell.
    pub fn cost_with(&self, pos: impl Fn(SurfaceRef) -> Point3) -> f32 {
        self.steps
            .windows(2)
            .map(|w| {
                let a = pos(w[0]);
                let b = pos(w[1]);
                if a.x != b.x && a.z != b.z {
                    DIAGONAL_COST
                } else {
                    ORTHO_COST
                }
            })
            .sum()
    }
}

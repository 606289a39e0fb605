//! Hierarchical pathfinding over chunked, mutable voxel worlds.
//!
//! The navigation structure is derived per chunk from raw block data and
//! queried at two levels:
//!
//! - **Surface extraction** finds every standable cell and its 8-direction
//!   step links ([`WalkableSurfaceFinder`])
//! - **Floor decomposition** groups linked surfaces into floors with
//!   contours and [`Entrance`]s between them
//! - **Flat A\*** solves routes inside one floor ([`FlatSearch`]), memoized
//!   per chunk in a [`SubPathCache`]
//! - **Hierarchical A\*** stitches floors and chunks together
//!   ([`HierarchicalSearch`]), splicing cached sub-paths into the result
//!
//! [`Pathfinder`] is the entry point: it owns the chunk map, reacts to chunk
//! loads and block edits, and answers world-cell queries with shared
//! [`Path`] values. Failed queries return the invalid path rather than an
//! error; only broken internal invariants panic.

pub mod cache;
pub mod chunk;
pub mod flat;
pub mod floor;
pub mod grid;
pub mod hastar;
pub mod heap;
pub mod path;
pub mod pathfinder;
pub mod surface;

#[cfg(test)]
mod testutil;

pub use cache::SubPathCache;
pub use chunk::{ChunkMap, ChunkSearchSpace};
pub use flat::{FlatGraph, FlatSearch};
pub use floor::{Entrance, Floor, FloorId, FloorRef};
pub use grid::{DIAGONAL_COST, ORTHO_COST, PassabilityGrid};
pub use hastar::{HierarchicalSearch, SearchStats};
pub use heap::IndexedMinHeap;
pub use path::Path;
pub use pathfinder::{NavConfig, Pathfinder};
pub use surface::{
    SurfaceId, SurfaceRef, SurfaceTable, WalkableSurface, WalkableSurfaceFinder,
};

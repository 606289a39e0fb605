//! **strata-core** — Core types for voxel-world navigation.
//!
//! This crate provides the foundational pieces shared across the *strata*
//! ecosystem: integer geometry for footprint columns and world cells, and the
//! [`VoxelWorld`] capability seam through which the navigation layer reads
//! block data.

pub mod geom;
pub mod world;

pub use geom::{DIRECTIONS_8, ORTHO_4, Point, Point3, Range, opposite_dir};
pub use world::{VoxelWorld, WorldDims};

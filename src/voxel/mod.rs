//! Voxel data structures and operations

pub mod voxel;
pub mod grid;
pub mod builder;
pub mod visibility;

pub use voxel::{FaceSet, Voxel};
pub use grid::{Bounds, GridStats, VoxelGrid};
pub use builder::{build_grid, FillMode};
pub use visibility::optimize;

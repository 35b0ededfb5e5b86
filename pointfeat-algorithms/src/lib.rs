//! # pointfeat algorithms
//!
//! The local geometric descriptor pipeline for point cloud tiles.
//!
//! This crate builds k-nearest-neighbor graphs, estimates surface normals and
//! curvature with interchangeable strategies, computes moment statistics over
//! neighbor sets, and assembles everything into a fixed-column feature table.

pub mod nearest_neighbor;
pub mod normals;
pub mod moments;
pub mod features;
pub mod pipeline;

// Re-export commonly used items
pub use nearest_neighbor::*;
pub use normals::*;
pub use moments::*;
pub use features::*;
pub use pipeline::*;

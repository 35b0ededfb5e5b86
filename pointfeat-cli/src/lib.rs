//! Batch feature extraction over directories of point cloud tiles
//!
//! Each tile file yields one feature CSV. Tiles run in parallel on a
//! fixed-size worker pool and fail or are skipped independently.

pub mod batch;
pub mod parallel;

pub use batch::*;
pub use parallel::{parallel_map_in, WorkerPoolConfig};

//! Core data structures and traits for pointfeat
//!
//! This crate provides the fundamental types for per-point descriptor
//! extraction: tile points, tiles, channel subsets, descriptor records,
//! configuration, and the search/estimation traits.

pub mod point;
pub mod tile;
pub mod channel;
pub mod descriptor;
pub mod config;
pub mod traits;
pub mod error;

pub use point::*;
pub use tile::*;
pub use channel::*;
pub use descriptor::*;
pub use config::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3};

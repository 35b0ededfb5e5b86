//! Per-point descriptor records

use crate::point::Vector3d;
use serde::{Deserialize, Serialize};

/// Local surface shape at a point.
///
/// The sign of `normal` is not defined; consumers must treat it as an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub normal: Vector3d,
    pub curvature: f64,
}

impl Descriptor {
    pub fn new(normal: Vector3d, curvature: f64) -> Self {
        Self { normal, curvature }
    }
}

/// Moment statistics of a point's neighbor set.
///
/// `std`, `skewness` and `excess` hold one value per channel of the
/// `ChannelSet` they were computed with, in its iteration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MomentSet {
    pub std: Vec<f64>,
    pub skewness: Vec<f64>,
    pub excess: Vec<f64>,
    /// `z(p)` minus the lowest neighbor elevation
    pub dz_min: f64,
    /// `z(p)` minus the highest neighbor elevation
    pub dz_max: f64,
}

//! Core traits for pointfeat

use crate::{descriptor::Descriptor, error::Result, point::*};

/// Trait for nearest neighbor search over the points of one tile.
///
/// Queries are made by tile index; the query point itself is never part of
/// the result. Results are ordered by non-decreasing distance, ties broken by
/// lower index.
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors of the point at `query`
    fn find_k_nearest(&self, query: usize, k: usize) -> Vec<(usize, f64)>;
}

/// Trait for estimating a local surface descriptor from a neighborhood.
///
/// Implementations accept the same input shape and return the same output
/// shape so they can be swapped without touching feature assembly.
pub trait SurfaceEstimator {
    fn estimate(&self, query: &Point3d, neighbors: &[Point3d]) -> Result<Descriptor>;
}

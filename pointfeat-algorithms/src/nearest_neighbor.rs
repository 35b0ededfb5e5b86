//! Nearest neighbor search and per-tile neighbor graphs

use log::debug;
use pointfeat_core::{Error, NearestNeighborSearch, Point3d, Result, Tile};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Total order on `(index, distance)` candidates: distance first, then index.
fn compare_candidates(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}

/// Brute force nearest neighbor search for tile-sized datasets.
///
/// Every query scans one full row of the pairwise distance matrix, so a
/// complete neighbor graph costs O(N²). Tiles keep N at a few thousand.
pub struct BruteForceSearch {
    points: Vec<Point3d>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3d]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distances from `query` to every other point, self excluded
    fn distance_row(&self, query: usize) -> Vec<(usize, f64)> {
        let q = &self.points[query];
        self.points
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != query)
            .map(|(idx, point)| {
                let dx = point.x - q.x;
                let dy = point.y - q.y;
                let dz = point.z - q.z;
                (idx, (dx * dx + dy * dy + dz * dz).sqrt())
            })
            .collect()
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: usize, k: usize) -> Vec<(usize, f64)> {
        if k == 0 || query >= self.points.len() {
            return Vec::new();
        }

        let mut distances = self.distance_row(query);
        if k < distances.len() {
            // Partition so the k smallest lead, then order only those.
            distances.select_nth_unstable_by(k - 1, compare_candidates);
            distances.truncate(k);
        }
        distances.sort_by(compare_candidates);
        distances
    }
}

/// The k nearest neighbors of every point in a tile.
///
/// Neighbors are stored as tile indices, row `i` holding the neighbor set of
/// point `i` ordered by non-decreasing distance.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborGraph {
    k: usize,
    indices: Vec<usize>,
    distances: Vec<f64>,
}

impl NeighborGraph {
    /// Neighbors per point
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of points in the graph
    pub fn len(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.indices.len() / self.k
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Neighbor indices of point `i`
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.indices[i * self.k..(i + 1) * self.k]
    }

    /// Neighbor distances of point `i`, aligned with [`NeighborGraph::neighbors`]
    pub fn distances(&self, i: usize) -> &[f64] {
        &self.distances[i * self.k..(i + 1) * self.k]
    }

    /// Coordinates of the neighbors of point `i`
    pub fn neighbor_positions(&self, tile: &Tile, i: usize) -> Vec<Point3d> {
        self.neighbors(i).iter().map(|&j| tile[j].position).collect()
    }
}

/// Build the k-nearest-neighbor graph of a tile over its `x,y,z` coordinates.
///
/// # Arguments
/// * `tile` - Input tile
/// * `k` - Neighbors per point, `1 <= k <= tile.len() - 1`
///
/// # Returns
/// * `Result<NeighborGraph>` - `InsufficientPoints` if the tile holds fewer
///   than `k + 1` points
pub fn build_neighbor_graph(tile: &Tile, k: usize) -> Result<NeighborGraph> {
    if k == 0 {
        return Err(Error::InvalidConfig(
            "k_neighbors must be greater than 0".to_string(),
        ));
    }
    tile.require_neighbors(k)?;

    let search = BruteForceSearch::new(&tile.positions());
    let rows: Vec<Vec<(usize, f64)>> = (0..tile.len())
        .into_par_iter()
        .map(|i| search.find_k_nearest(i, k))
        .collect();

    let mut indices = Vec::with_capacity(tile.len() * k);
    let mut distances = Vec::with_capacity(tile.len() * k);
    for row in rows {
        for (idx, distance) in row {
            indices.push(idx);
            distances.push(distance);
        }
    }

    debug!("Built neighbor graph: {} points, k = {}", tile.len(), k);
    Ok(NeighborGraph {
        k,
        indices,
        distances,
    })
}

//! Statistical moment features over neighbor sets
//!
//! For every channel the neighbor values are centered on their mean and
//! summarized as:
//!
//! - `std`: population standard deviation, `sqrt(mean(c²))`
//! - `skewness`: `mean(c³)`
//! - `excess`: `mean(c⁴) − 3`
//!
//! `skewness` and `excess` are raw central moments, not divided by `std³` or
//! `std⁴`.

use crate::nearest_neighbor::NeighborGraph;
use pointfeat_core::{ChannelSet, Error, MomentSet, Result, Tile};
use rayon::prelude::*;

/// `(std, skewness, excess)` of a sample using the raw central moment convention
pub fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let c = v - mean;
        let c2 = c * c;
        m2 += c2;
        m3 += c2 * c;
        m4 += c2 * c2;
    }

    ((m2 / n).sqrt(), m3 / n, m4 / n - 3.0)
}

/// Compute the moment set of one point from its neighbor indices
///
/// The point's own values never enter the statistics; `dz_min` and `dz_max`
/// compare its elevation against the neighbors only.
pub fn compute_moments(
    tile: &Tile,
    point: usize,
    neighbors: &[usize],
    channels: &ChannelSet,
) -> Result<MomentSet> {
    if neighbors.is_empty() {
        return Err(Error::InvalidData(format!(
            "point {} has no neighbors",
            point
        )));
    }
    if point >= tile.len() {
        return Err(Error::InvalidData(format!(
            "point {} is outside a tile of {} points",
            point,
            tile.len()
        )));
    }
    if let Some(&j) = neighbors.iter().find(|&&j| j >= tile.len()) {
        return Err(Error::InvalidData(format!(
            "neighbor {} of point {} is outside a tile of {} points",
            j,
            point,
            tile.len()
        )));
    }

    let mut moments = MomentSet {
        std: Vec::with_capacity(channels.len()),
        skewness: Vec::with_capacity(channels.len()),
        excess: Vec::with_capacity(channels.len()),
        ..MomentSet::default()
    };

    let mut values = Vec::with_capacity(neighbors.len());
    for channel in channels.iter() {
        values.clear();
        values.extend(neighbors.iter().map(|&j| tile.channel_value(j, channel)));
        let (std, skewness, excess) = central_moments(&values);
        moments.std.push(std);
        moments.skewness.push(skewness);
        moments.excess.push(excess);
    }

    let (z_min, z_max) = neighbors
        .iter()
        .map(|&j| tile[j].position.z)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| {
            (lo.min(z), hi.max(z))
        });
    let z = tile[point].position.z;
    moments.dz_min = z - z_min;
    moments.dz_max = z - z_max;

    Ok(moments)
}

/// Compute the moment set of every point of a tile
///
/// # Arguments
/// * `tile` - Input tile
/// * `graph` - Neighbor graph built from `tile`
/// * `channels` - Channels to summarize
///
/// # Returns
/// * `Result<Vec<MomentSet>>` - One moment set per point, in tile order
pub fn extract_moments(
    tile: &Tile,
    graph: &NeighborGraph,
    channels: &ChannelSet,
) -> Result<Vec<MomentSet>> {
    if graph.len() != tile.len() {
        return Err(Error::InvalidData(format!(
            "neighbor graph covers {} points but tile has {}",
            graph.len(),
            tile.len()
        )));
    }

    (0..tile.len())
        .into_par_iter()
        .map(|i| compute_moments(tile, i, graph.neighbors(i), channels))
        .collect()
}

//! Single-tile feature extraction pipeline
//!
//! tile → neighbor graph → (surface descriptors ∥ moment statistics) → feature table

use crate::features::{assemble_features, FeatureSchema, FeatureTable};
use crate::moments::extract_moments;
use crate::nearest_neighbor::build_neighbor_graph;
use crate::normals::{estimate_descriptors, Estimator};
use log::debug;
use pointfeat_core::{Error, FeatureConfig, Result, Tile};

/// Run the full descriptor pipeline on one tile.
///
/// Deterministic: the same tile and configuration always produce a
/// bit-identical table.
///
/// # Errors
/// * `InsufficientPoints` when the tile has fewer than `k_neighbors + 1` points
/// * `InvalidData` when the tile size differs from `expected_points`
/// * `InvalidConfig` for an invalid configuration
pub fn extract_features(tile: &Tile, config: &FeatureConfig) -> Result<FeatureTable> {
    config.validate()?;
    if let Some(expected) = config.expected_points {
        if tile.len() != expected {
            return Err(Error::InvalidData(format!(
                "tile has {} points, run expects {}",
                tile.len(),
                expected
            )));
        }
    }

    let graph = build_neighbor_graph(tile, config.k_neighbors)?;
    let estimator = Estimator::from(config.strategy);

    let (descriptors, moments) = rayon::join(
        || estimate_descriptors(tile, &graph, &estimator),
        || extract_moments(tile, &graph, &config.channel_subset),
    );
    let (descriptors, moments) = (descriptors?, moments?);

    let schema = FeatureSchema::new(&config.channel_subset, config.include_class);
    let table = assemble_features(tile, &descriptors, &moments, &schema)?;

    debug!(
        "Extracted {} x {} features ({}, k = {})",
        table.len(),
        schema.width(),
        config.strategy,
        config.k_neighbors
    );
    Ok(table)
}

//! Feature extraction configuration

use crate::channel::ChannelSet;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default neighbor count per point
pub const DEFAULT_K_NEIGHBORS: usize = 64;

/// Surface descriptor estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceStrategy {
    /// Smallest eigenvector of the neighbor covariance, surface variation as curvature
    #[default]
    CovarianceEigen,
    /// Least-squares quadratic height field, Gaussian curvature
    QuadraticFit,
}

impl SurfaceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceStrategy::CovarianceEigen => "covariance_eigen",
            SurfaceStrategy::QuadraticFit => "quadratic_fit",
        }
    }
}

impl fmt::Display for SurfaceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfaceStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "covariance_eigen" | "eigen" => Ok(SurfaceStrategy::CovarianceEigen),
            "quadratic_fit" | "quadratic" => Ok(SurfaceStrategy::QuadraticFit),
            other => Err(Error::InvalidConfig(format!(
                "unknown surface strategy '{}'",
                other
            ))),
        }
    }
}

/// Configuration for per-tile feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of neighbors per point
    pub k_neighbors: usize,
    pub strategy: SurfaceStrategy,
    /// Channels the moment statistics are computed over
    pub channel_subset: ChannelSet,
    /// Worker threads used when fanning out over tiles
    #[serde(alias = "num_processes")]
    pub num_workers: usize,
    /// Append the class label as the last feature column
    pub include_class: bool,
    /// Required tile cardinality, if the run uses a fixed N
    pub expected_points: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            strategy: SurfaceStrategy::default(),
            channel_subset: ChannelSet::all(),
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            include_class: false,
            expected_points: None,
        }
    }
}

impl FeatureConfig {
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors;
        self
    }

    pub fn with_strategy(mut self, strategy: SurfaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_channel_subset(mut self, channel_subset: ChannelSet) -> Self {
        self.channel_subset = channel_subset;
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_include_class(mut self, include_class: bool) -> Self {
        self.include_class = include_class;
        self
    }

    pub fn with_expected_points(mut self, expected_points: Option<usize>) -> Self {
        self.expected_points = expected_points;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k_neighbors == 0 {
            return Err(Error::InvalidConfig(
                "k_neighbors must be greater than 0".to_string(),
            ));
        }
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig(
                "num_workers must be greater than 0".to_string(),
            ));
        }
        if let Some(n) = self.expected_points {
            if n < self.k_neighbors + 1 {
                return Err(Error::InvalidConfig(format!(
                    "expected_points ({}) must be at least k_neighbors + 1 ({})",
                    n,
                    self.k_neighbors + 1
                )));
            }
        }
        Ok(())
    }
}

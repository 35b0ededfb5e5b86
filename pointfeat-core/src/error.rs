//! Error types for pointfeat

use thiserror::Error;

/// Main error type for pointfeat operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tile cannot provide `k` neighbors for every point.
    #[error("Insufficient points: tile has {points} points, at least {required} required")]
    InsufficientPoints { points: usize, required: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

impl Error {
    /// Whether the error means the tile is skipped rather than failed.
    pub fn is_skip(&self) -> bool {
        matches!(self, Error::InsufficientPoints { .. })
    }
}

/// Result type alias for pointfeat operations
pub type Result<T> = std::result::Result<T, Error>;

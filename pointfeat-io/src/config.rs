//! JSON run configuration

use pointfeat_core::{FeatureConfig, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of a batch run over a directory of tiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub input_directory: Option<PathBuf>,
    #[serde(default)]
    pub output_directory: Option<PathBuf>,
    #[serde(flatten)]
    pub features: FeatureConfig,
}

/// Parse and validate a run configuration from JSON text
pub fn parse_config(contents: &str) -> Result<RunConfig> {
    let config: RunConfig = serde_json::from_str(contents)?;
    config.features.validate()?;
    Ok(config)
}

/// Load and validate a run configuration from a JSON file
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

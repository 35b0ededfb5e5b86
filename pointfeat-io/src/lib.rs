//! I/O operations for pointfeat
//!
//! This crate reads tiles from delimited text files, writes feature tables as
//! CSV, and loads JSON run configurations.

pub mod tile_csv;
pub mod feature_csv;
pub mod config;
pub mod error;

pub use error::*;
pub use tile_csv::{Delimiter, TileColumn, TileCsvReader, TileSchema};
pub use feature_csv::FeatureCsvWriter;
pub use config::{load_config, parse_config, RunConfig};

use pointfeat_algorithms::FeatureTable;
use pointfeat_core::{Error, Result, Tile};
use std::path::Path;

/// File extensions recognised as tile files
pub const TILE_EXTENSIONS: [&str; 3] = ["csv", "txt", "xyz"];

/// Whether `path` has a tile file extension
pub fn is_tile_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| TILE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Auto-detect format and read a tile
pub fn read_tile<P: AsRef<Path>>(path: P) -> Result<Tile> {
    let path = path.as_ref();
    if !is_tile_file(path) {
        return Err(Error::InvalidData(format!(
            "Unsupported tile format: {:?}",
            path.extension()
        )));
    }
    TileCsvReader::read_tile(path)
}

/// Write a feature table, replacing any previous file atomically
pub fn write_feature_table<P: AsRef<Path>>(table: &FeatureTable, path: P) -> Result<()> {
    FeatureCsvWriter::write_atomic(table, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointfeat_algorithms::extract_features;
    use pointfeat_core::FeatureConfig;
    use std::fs;

    #[test]
    fn test_is_tile_file() {
        assert!(is_tile_file(Path::new("tile_01.csv")));
        assert!(is_tile_file(Path::new("tile_01.XYZ")));
        assert!(!is_tile_file(Path::new("tile_01.las")));
        assert!(!is_tile_file(Path::new("tile_01")));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(read_tile("tile.las").is_err());
    }

    #[test]
    fn test_tile_to_feature_file() {
        let dir = std::env::temp_dir().join(format!("pointfeat_io_roundtrip_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("tile.txt");
        let output = dir.join("tile.csv");

        let mut content = String::new();
        for i in 0..20 {
            let (x, y) = ((i % 5) as f64, (i / 5) as f64);
            content.push_str(&format!("{} {} {} 10 20 30 {}\n", x, y, 0.1 * x, i % 2));
        }
        fs::write(&input, content).unwrap();

        let tile = read_tile(&input).unwrap();
        let config = FeatureConfig::default().with_k_neighbors(4);
        let table = extract_features(&tile, &config).unwrap();
        write_feature_table(&table, &output).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 21);

        // Writing the same table again produces the same bytes.
        write_feature_table(&table, &output).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), written);

        fs::remove_dir_all(&dir).unwrap();
    }
}

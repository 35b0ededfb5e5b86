//! Feature table CSV output
//!
//! One header row with the schema's column names, then one row per point.
//! Values use the shortest representation that parses back to the same
//! `f64`, so re-running a tile reproduces the file byte for byte.

use itertools::Itertools;
use log::debug;
use pointfeat_algorithms::FeatureTable;
use pointfeat_core::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Feature table writer
pub struct FeatureCsvWriter;

impl FeatureCsvWriter {
    /// Write a feature table to any writer
    pub fn write<W: Write>(table: &FeatureTable, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", table.columns().iter().join(","))?;
        for row in table.rows() {
            writeln!(writer, "{}", row.iter().join(","))?;
        }
        Ok(())
    }

    /// Write a feature table to `path` atomically.
    ///
    /// The table goes to a temporary file next to `path` which is renamed over
    /// it once complete. On failure the temporary file is removed and `path`
    /// is left untouched.
    pub fn write_atomic<P: AsRef<Path>>(table: &FeatureTable, path: P) -> Result<()> {
        let path = path.as_ref();
        let temp = temp_path(path);

        if let Err(e) = Self::write_file(table, &temp) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp, path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        debug!("Wrote {} feature rows to {}", table.len(), path.display());
        Ok(())
    }

    fn write_file(table: &FeatureTable, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write(table, &mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

/// Hidden sibling of `path` used while writing, unique per call
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "features".to_string());
    let id = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointfeat_algorithms::{assemble_features, FeatureSchema};
    use pointfeat_core::{
        ChannelSet, Descriptor, MomentSet, Point3d, Tile, TilePoint, Vector3d,
    };

    fn small_table() -> FeatureTable {
        let tile = Tile::from_points(vec![
            TilePoint::new(Point3d::new(0.1, 2.0, -3.5), [255.0, 0.0, 12.0], 4),
            TilePoint::new(Point3d::new(1.0, 1e-7, 3.0), [1.0, 2.0, 3.0], 1),
        ]);
        let descriptors = vec![
            Descriptor::new(Vector3d::new(0.0, 0.0, 1.0), 0.0),
            Descriptor::new(Vector3d::new(0.0, 1.0, 0.0), 1.0 / 3.0),
        ];
        let moments = vec![
            MomentSet {
                std: vec![0.5],
                skewness: vec![0.0],
                excess: vec![-2.9375],
                dz_min: 1.0,
                dz_max: -1.0,
            };
            2
        ];
        let schema = FeatureSchema::new(&ChannelSet::new([pointfeat_core::Channel::Z]), true);
        assemble_features(&tile, &descriptors, &moments, &schema).unwrap()
    }

    #[test]
    fn test_write_layout() {
        let table = small_table();
        let mut buffer = Vec::new();
        FeatureCsvWriter::write(&table, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "x,y,z,r,g,b,normal_x,normal_y,normal_z,curvature,std_z,skewness_z,excess_z,dz_max,dz_min,class"
        );
        assert_eq!(lines[1], "0.1,2,-3.5,255,0,12,0,0,1,0,0.5,0,-2.9375,-1,1,4");
    }

    #[test]
    fn test_values_round_trip() {
        let table = small_table();
        let mut buffer = Vec::new();
        FeatureCsvWriter::write(&table, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();

        for (line, row) in content.lines().skip(1).zip(table.rows()) {
            let parsed: Vec<f64> = line.split(',').map(|v| v.parse().unwrap()).collect();
            assert_eq!(parsed.as_slice(), row);
        }
    }

    #[test]
    fn test_write_atomic() {
        let dir = std::env::temp_dir().join(format!("pointfeat_features_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tile_0001.csv");

        FeatureCsvWriter::write_atomic(&small_table(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("x,y,z,"));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_atomic_missing_directory() {
        let path = std::env::temp_dir()
            .join(format!("pointfeat_missing_{}", std::process::id()))
            .join("tile.csv");
        assert!(FeatureCsvWriter::write_atomic(&small_table(), &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_path_is_unique_sibling() {
        let first = temp_path(Path::new("/out/tile_7.csv"));
        let second = temp_path(Path::new("/out/tile_7.csv"));

        assert_ne!(first, second);
        for temp in [&first, &second] {
            assert_eq!(temp.parent(), Some(Path::new("/out")));
            let name = temp.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with(".tile_7.csv."), "{}", name);
            assert!(name.ends_with(".tmp"), "{}", name);
        }
    }

    #[test]
    fn test_concurrent_writers_to_one_path() {
        let dir = std::env::temp_dir().join(format!("pointfeat_concurrent_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tile.csv");
        let table = small_table();
        let (shared_table, shared_path) = (&table, &path);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(move || FeatureCsvWriter::write_atomic(shared_table, shared_path)))
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }
        });

        let mut expected = Vec::new();
        FeatureCsvWriter::write(&table, &mut expected).unwrap();
        assert_eq!(fs::read(&path).unwrap(), expected);
        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }
}

//! Batch driver: one feature table per tile file
//!
//! Tiles are independent. A tile that is too small is skipped, any other
//! error fails that tile only, and the rest of the batch carries on.

use crate::parallel::{parallel_map_in, WorkerPoolConfig};
use itertools::Itertools;
use log::{debug, error, info, warn};
use pointfeat_algorithms::extract_features;
use pointfeat_core::{Error, FeatureConfig, Result};
use pointfeat_io::{is_tile_file, read_tile, write_feature_table};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of processing a single tile file
#[derive(Debug, Clone, PartialEq)]
pub enum TileOutcome {
    Written {
        input: PathBuf,
        output: PathBuf,
        rows: usize,
    },
    Skipped {
        input: PathBuf,
        reason: String,
    },
    Failed {
        input: PathBuf,
        error: String,
    },
}

impl TileOutcome {
    pub fn input(&self) -> &Path {
        match self {
            TileOutcome::Written { input, .. }
            | TileOutcome::Skipped { input, .. }
            | TileOutcome::Failed { input, .. } => input,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, TileOutcome::Written { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TileOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TileOutcome::Failed { .. })
    }
}

/// Per-tile outcomes of a batch, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub outcomes: Vec<TileOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// True when no tile failed; skipped tiles do not count as failures
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Output path for `input`: its file stem with a `.csv` extension in `output_dir`
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tile".to_string());
    output_dir.join(format!("{}.csv", stem))
}

/// Read one tile, extract its features and write them atomically.
///
/// Returns the number of rows written.
pub fn process_tile_file(input: &Path, output_dir: &Path, config: &FeatureConfig) -> Result<usize> {
    let output = output_path(input, output_dir);
    if overwrites_input(input, &output) {
        return Err(Error::InvalidConfig(format!(
            "output {} would overwrite its input",
            output.display()
        )));
    }

    let tile = read_tile(input)?;
    let table = extract_features(&tile, config)?;
    write_feature_table(&table, &output)?;
    Ok(table.len())
}

/// Whether writing `output` would replace the file at `input`.
///
/// Both sides are resolved through the filesystem, so `./in`, `in/../in` and
/// symlinked directories all compare equal to `in`.
fn overwrites_input(input: &Path, output: &Path) -> bool {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let resolved_output = fs::canonicalize(dir)
        .ok()
        .zip(output.file_name())
        .map(|(dir, name)| dir.join(name));

    match (fs::canonicalize(input), resolved_output) {
        (Ok(input), Some(output)) => input == output,
        _ => input == output,
    }
}

/// Tile files directly inside `dir`, sorted by path
pub fn collect_tile_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if path.is_file() && !hidden && is_tile_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process `inputs` on a pool of `config.num_workers` threads.
///
/// Only configuration, pool and output directory problems abort the batch;
/// per-tile errors are recorded in the summary.
pub fn process_tiles(inputs: &[PathBuf], output_dir: &Path, config: &FeatureConfig) -> Result<BatchSummary> {
    config.validate()?;
    fs::create_dir_all(output_dir)?;
    let pool = WorkerPoolConfig::from(config).build()?;

    info!(
        "Processing {} tiles with {} workers ({}, k = {})",
        inputs.len(),
        config.num_workers,
        config.strategy,
        config.k_neighbors
    );

    // Inputs that differ only by extension map to the same output file.
    let outputs: Vec<PathBuf> = inputs.iter().map(|input| output_path(input, output_dir)).collect();
    let claims = outputs.iter().counts();

    let outcomes = parallel_map_in(&pool, inputs, |input| {
        let output = output_path(input, output_dir);
        let shared = claims.get(&output).copied().unwrap_or(0) > 1;
        let result = if shared {
            Err(Error::InvalidConfig(format!(
                "output {} is claimed by more than one input tile",
                output.display()
            )))
        } else {
            process_tile_file(input, output_dir, config)
        };

        let outcome = match result {
            Ok(rows) => TileOutcome::Written {
                input: input.clone(),
                output,
                rows,
            },
            Err(e) if e.is_skip() => TileOutcome::Skipped {
                input: input.clone(),
                reason: e.to_string(),
            },
            Err(e) => TileOutcome::Failed {
                input: input.clone(),
                error: e.to_string(),
            },
        };
        match &outcome {
            TileOutcome::Written { output, rows, .. } => {
                debug!("{} -> {} ({} rows)", input.display(), output.display(), rows)
            }
            TileOutcome::Skipped { reason, .. } => warn!("Skipping {}: {}", input.display(), reason),
            TileOutcome::Failed { error, .. } => error!("Failed {}: {}", input.display(), error),
        }
        outcome
    });

    let summary = BatchSummary { outcomes };
    info!(
        "Batch complete: {} written, {} skipped, {} failed",
        summary.written(),
        summary.skipped(),
        summary.failed()
    );
    Ok(summary)
}

/// Process every tile file in `input_dir` into `output_dir`
pub fn process_directory(input_dir: &Path, output_dir: &Path, config: &FeatureConfig) -> Result<BatchSummary> {
    let inputs = collect_tile_files(input_dir)?;
    if inputs.is_empty() {
        warn!("No tile files found in {}", input_dir.display());
    }
    process_tiles(&inputs, output_dir, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir().join(format!("pointfeat_batch_{}_{}", name, std::process::id()));
            let _ = fs::remove_dir_all(&path);
            fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn write_tile(path: &Path, n: usize, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut content = String::from("x,y,z,r,g,b,class\n");
        for _ in 0..n {
            let x: f64 = rng.gen_range(0.0..10.0);
            let y: f64 = rng.gen_range(0.0..10.0);
            let z = 0.05 * x * y + rng.gen_range(-0.01..0.01);
            content.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                x,
                y,
                z,
                rng.gen_range(0..256),
                rng.gen_range(0..256),
                rng.gen_range(0..256),
                rng.gen_range(0..5)
            ));
        }
        fs::write(path, content).unwrap();
    }

    fn config() -> FeatureConfig {
        FeatureConfig::default().with_k_neighbors(8).with_num_workers(2)
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("/in/tile_0003.txt"), Path::new("/out")),
            PathBuf::from("/out/tile_0003.csv")
        );
    }

    #[test]
    fn test_collect_tile_files_sorted() {
        let dir = TempDir::new("collect");
        for name in ["b.csv", "a.txt", "c.xyz", "notes.md", ".a.csv.tmp", ".hidden.csv"] {
            fs::write(dir.0.join(name), "").unwrap();
        }
        fs::create_dir_all(dir.0.join("nested.csv")).unwrap();

        let files = collect_tile_files(&dir.0).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.csv", "c.xyz"]);
    }

    #[test]
    fn test_skip_and_failure_are_isolated() {
        let input = TempDir::new("isolation_in");
        let output = TempDir::new("isolation_out");
        write_tile(&input.0.join("good.txt"), 50, 1);
        write_tile(&input.0.join("small.txt"), 5, 2);
        fs::write(input.0.join("broken.txt"), "x,y,z,r,g,b,class\n1,2,3,4,5\n").unwrap();

        let summary = process_directory(&input.0, &output.0, &config()).unwrap();

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.written(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_success());

        // Outcomes follow the sorted input order.
        assert!(summary.outcomes[0].is_failed());
        assert!(summary.outcomes[1].is_written());
        assert!(summary.outcomes[2].is_skipped());

        let written: Vec<PathBuf> = fs::read_dir(&output.0)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(written, vec![output.0.join("good.csv")]);

        let content = fs::read_to_string(output.0.join("good.csv")).unwrap();
        assert_eq!(content.lines().count(), 51);
    }

    #[test]
    fn test_written_outcome() {
        let input = TempDir::new("written_in");
        let output = TempDir::new("written_out");
        let tile = input.0.join("tile_7.csv");
        write_tile(&tile, 40, 3);

        let summary = process_tiles(&[tile.clone()], &output.0.join("features"), &config()).unwrap();
        assert_eq!(
            summary.outcomes,
            vec![TileOutcome::Written {
                input: tile,
                output: output.0.join("features").join("tile_7.csv"),
                rows: 40,
            }]
        );
    }

    #[test]
    fn test_reruns_are_identical() {
        let input = TempDir::new("rerun_in");
        let output = TempDir::new("rerun_out");
        for i in 0..4 {
            write_tile(&input.0.join(format!("tile_{}.txt", i)), 30, 10 + i);
        }

        process_directory(&input.0, &output.0, &config()).unwrap();
        let first: Vec<String> = (0..4)
            .map(|i| fs::read_to_string(output.0.join(format!("tile_{}.csv", i))).unwrap())
            .collect();

        let single = config().with_num_workers(1);
        process_directory(&input.0, &output.0, &single).unwrap();
        for (i, expected) in first.iter().enumerate() {
            let again = fs::read_to_string(output.0.join(format!("tile_{}.csv", i))).unwrap();
            assert_eq!(&again, expected);
        }
    }

    #[test]
    fn test_refuses_to_overwrite_input() {
        let dir = TempDir::new("overwrite");
        let tile = dir.0.join("tile.csv");
        write_tile(&tile, 20, 4);
        let original = fs::read_to_string(&tile).unwrap();

        let summary = process_directory(&dir.0, &dir.0, &config()).unwrap();
        assert_eq!(summary.failed(), 1);
        assert_eq!(fs::read_to_string(&tile).unwrap(), original);
    }

    #[test]
    fn test_refuses_to_overwrite_input_through_other_spelling() {
        let dir = TempDir::new("respelled");
        let tile = dir.0.join("tile.csv");
        write_tile(&tile, 20, 5);
        let original = fs::read_to_string(&tile).unwrap();

        let respelled = dir.0.join("..").join(dir.0.file_name().unwrap()).join(".");
        let summary = process_directory(&dir.0, &respelled, &config()).unwrap();

        assert_eq!(summary.written(), 0);
        assert_eq!(summary.failed(), 1);
        assert_eq!(fs::read_to_string(&tile).unwrap(), original);
    }

    #[cfg(unix)]
    #[test]
    fn test_refuses_to_overwrite_input_through_symlink() {
        let dir = TempDir::new("symlinked");
        let link = TempDir::new("symlinked_link");
        fs::remove_dir_all(&link.0).unwrap();
        std::os::unix::fs::symlink(&dir.0, &link.0).unwrap();

        let tile = dir.0.join("tile.csv");
        write_tile(&tile, 20, 6);
        let original = fs::read_to_string(&tile).unwrap();

        let summary = process_directory(&dir.0, &link.0, &config()).unwrap();
        assert_eq!(summary.failed(), 1);
        assert_eq!(fs::read_to_string(&tile).unwrap(), original);

        fs::remove_file(&link.0).unwrap();
    }

    #[test]
    fn test_shared_output_name_fails_each_claimant() {
        let input = TempDir::new("shared_in");
        let output = TempDir::new("shared_out");
        write_tile(&input.0.join("tile.txt"), 20, 7);
        write_tile(&input.0.join("tile.xyz"), 30, 8);
        write_tile(&input.0.join("other.txt"), 25, 9);

        let summary = process_directory(&input.0, &output.0, &config()).unwrap();

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.written(), 1);
        assert_eq!(summary.failed(), 2);
        for outcome in &summary.outcomes {
            let name = outcome.input().file_name().unwrap().to_string_lossy().into_owned();
            assert_eq!(outcome.is_written(), name == "other.txt", "{:?}", outcome);
        }

        let on_disk: Vec<PathBuf> = fs::read_dir(&output.0)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(on_disk, vec![output.0.join("other.csv")]);
    }

    #[test]
    fn test_invalid_config_aborts_batch() {
        let input = TempDir::new("invalid_in");
        let output = TempDir::new("invalid_out");
        let result = process_directory(&input.0, &output.0, &config().with_k_neighbors(0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_directory() {
        let input = TempDir::new("empty_in");
        let output = TempDir::new("empty_out");
        let summary = process_directory(&input.0, &output.0, &config()).unwrap();
        assert_eq!(summary.total(), 0);
        assert!(summary.is_success());
    }
}

//! Train/test splitting of emitted tiles.
//!
//! Each item is assigned independently: draw `u` uniformly from `[0, 1)` and
//! put the item in `train` if `u <= ratio`, else in `test`. The expected
//! train fraction is `ratio`, the exact count varies unless a seed is set.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, RngExt, SeedableRng};
use walkdir::WalkDir;

use crate::error::TilerError;

pub const TRAIN_LIST: &str = "train.txt";
pub const TEST_LIST: &str = "test.txt";

/// Split options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitOptions {
    /// Probability of an item landing in `train`, in `(0, 1)`.
    pub ratio: f64,
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            ratio: 0.8,
            seed: None,
        }
    }
}

/// Validate split options before running.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), TilerError> {
    if !(0.0 < opts.ratio && opts.ratio < 1.0) {
        return Err(TilerError::InvalidOptions {
            message: format!("--ratio must be in the interval (0.0, 1.0), got {}", opts.ratio),
        });
    }
    Ok(())
}

/// Two disjoint lists covering every input item exactly once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetSplit<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

impl<T> DatasetSplit<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.test.is_empty()
    }
}

/// Assign every item to train or test. Input order is kept within each list.
pub fn split_items<T: Clone>(items: &[T], opts: &SplitOptions) -> DatasetSplit<T> {
    if let Some(seed) = opts.seed {
        let mut rng = StdRng::seed_from_u64(seed);
        assign(items, opts.ratio, &mut rng)
    } else {
        let mut rng = rand::rng();
        assign(items, opts.ratio, &mut rng)
    }
}

fn assign<T: Clone, R: RngExt + ?Sized>(items: &[T], ratio: f64, rng: &mut R) -> DatasetSplit<T> {
    let mut split = DatasetSplit {
        train: Vec::new(),
        test: Vec::new(),
    };

    for item in items {
        let draw = rng.random::<f64>();
        if draw <= ratio {
            split.train.push(item.clone());
        } else {
            split.test.push(item.clone());
        }
    }

    split
}

/// Writes `train.txt` and `test.txt` into `dir`, one path per line.
pub fn write_split_lists(
    dir: &Path,
    split: &DatasetSplit<PathBuf>,
) -> Result<(PathBuf, PathBuf), TilerError> {
    let train_path = dir.join(TRAIN_LIST);
    let test_path = dir.join(TEST_LIST);

    write_path_list(&train_path, &split.train)?;
    write_path_list(&test_path, &split.test)?;

    Ok((train_path, test_path))
}

fn write_path_list(path: &Path, items: &[PathBuf]) -> Result<(), TilerError> {
    let file = fs::File::create(path).map_err(TilerError::file_io(path))?;
    let mut writer = BufWriter::new(file);

    for item in items {
        writeln!(writer, "{}", item.display()).map_err(TilerError::file_io(path))?;
    }

    writer.flush().map_err(TilerError::file_io(path))
}

/// Lists tile images already present in `dir`, sorted by file name.
///
/// Only direct children with the given extension are returned.
pub fn collect_tile_images(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, TilerError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| TilerError::InputMismatch {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Case-insensitive extension check; `extension` may carry a leading dot.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    ext.eq_ignore_ascii_case(extension.trim_start_matches('.'))
}

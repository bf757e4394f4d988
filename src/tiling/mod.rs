//! Dataset-level tiling: preflight checks, per-image processing and the
//! final train/test split.
//!
//! A run goes through these steps:
//! 1. Validate options, pair every source image with its label file and
//!    check the counts match.
//! 2. Make sure the target (and negative) directories are empty, creating
//!    them if needed, and copy `classes.names` alongside.
//! 3. Tile each image. In lenient mode a bad label line or a broken image
//!    is reported and skipped; in strict mode it aborts the run.
//! 4. Split the saved positive tiles into `train.txt` / `test.txt`.

mod report;

pub use report::{
    BoxCounts, ImageCounts, SplitCounts, SplitReport, TileCounts, TilingIssue, TilingIssueCode,
    TilingReport, TilingSeverity,
};

use std::fs;
use std::path::{Path, PathBuf};

use image::GenericImageView;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::emitter::{OutputDirs, TileEmitter, TileOutcome};
use crate::engine::{BoxIndex, LabeledBox};
use crate::error::TilerError;
use crate::geom::to_absolute;
use crate::grid::Grid;
use crate::label::{read_label_file, LABEL_EXTENSION};
use crate::split::{
    collect_tile_images, split_items, validate_split_options, write_split_lists,
    SplitOptions,
};

/// Name of the class list copied from the source's parent directory.
pub const CLASS_NAMES_FILE: &str = "classes.names";

/// Options for a tiling run.
#[derive(Clone, Debug)]
pub struct TileOptions {
    /// Directory with `name.ext` images and `name.txt` labels.
    pub source: PathBuf,
    /// Directory for positive tiles and their labels.
    pub target: PathBuf,
    /// Image extension, with or without the leading dot.
    pub extension: String,
    /// Directory for tiles without boxes; `None` discards them.
    pub negative_dir: Option<PathBuf>,
    /// Tile side length in pixels.
    pub tile_size: u32,
    pub split: SplitOptions,
    /// Abort on the first malformed box or unreadable image.
    pub strict: bool,
    /// Number of images processed concurrently.
    pub jobs: usize,
}

impl TileOptions {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            extension: ".JPG".to_string(),
            negative_dir: None,
            tile_size: 416,
            split: SplitOptions::default(),
            strict: false,
            jobs: 1,
        }
    }
}

/// Validate tiling options before touching the filesystem.
pub fn validate_tile_options(opts: &TileOptions) -> Result<(), TilerError> {
    if opts.tile_size == 0 {
        return Err(TilerError::InvalidOptions {
            message: "--size must be greater than 0".to_string(),
        });
    }

    if opts.jobs == 0 {
        return Err(TilerError::InvalidOptions {
            message: "--jobs must be greater than 0".to_string(),
        });
    }

    let ext = opts.extension.trim_start_matches('.');
    if ext.is_empty() || ext.eq_ignore_ascii_case(LABEL_EXTENSION) {
        return Err(TilerError::InvalidOptions {
            message: format!(
                "--ext '{}' is not a usable image extension",
                opts.extension
            ),
        });
    }

    validate_split_options(&opts.split)
}

/// A source image and its label file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    pub image: PathBuf,
    pub labels: PathBuf,
    /// File stem shared by the image, its label file and its tiles.
    pub stem: String,
}

/// Pairs images with label files in `source`.
///
/// Fails if there are no images with `extension`, or if the number of
/// images differs from the number of `.txt` files.
pub fn discover_sources(source: &Path, extension: &str) -> Result<Vec<SourceImage>, TilerError> {
    if !source.is_dir() {
        return Err(TilerError::InputMismatch {
            path: source.to_path_buf(),
            message: "source must be a directory".to_string(),
        });
    }

    let mut images = collect_tile_images(source, extension)?;
    let labels = collect_tile_images(source, LABEL_EXTENSION)?;

    if images.is_empty() {
        return Err(TilerError::InputMismatch {
            path: source.to_path_buf(),
            message: format!(
                "source folder should contain some images with extension '{}'",
                extension
            ),
        });
    }

    if images.len() != labels.len() {
        return Err(TilerError::InputMismatch {
            path: source.to_path_buf(),
            message: format!(
                "dataset should contain equal numbers of images and label files; found {} image(s) and {} label file(s)",
                images.len(),
                labels.len()
            ),
        });
    }

    images.sort();
    Ok(images
        .into_iter()
        .map(|image| {
            let stem = image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let labels = image.with_extension(LABEL_EXTENSION);
            SourceImage {
                image,
                labels,
                stem,
            }
        })
        .collect())
}

/// Creates `dir` if needed; fails if it already holds anything.
pub fn prepare_output_dir(dir: &Path) -> Result<(), TilerError> {
    if dir.exists() {
        let mut entries = fs::read_dir(dir).map_err(TilerError::file_io(dir))?;
        if entries.next().is_some() {
            return Err(TilerError::TargetNotEmpty {
                path: dir.to_path_buf(),
            });
        }
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(TilerError::file_io(dir))
}

/// Directory one level above `dir`, resolved against the filesystem.
pub fn parent_dir(dir: &Path) -> Result<PathBuf, TilerError> {
    let resolved = dir.canonicalize().map_err(TilerError::file_io(dir))?;
    Ok(resolved
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(resolved))
}

/// Copies `classes.names` from above `source` to above `target`.
///
/// Returns the destination path, or `None` if there was nothing to copy.
pub fn copy_class_names(source: &Path, target: &Path) -> Result<Option<PathBuf>, TilerError> {
    let from = parent_dir(source)?.join(CLASS_NAMES_FILE);
    if !from.is_file() {
        return Ok(None);
    }

    let to = parent_dir(target)?.join(CLASS_NAMES_FILE);
    if from == to {
        return Ok(Some(to));
    }

    fs::copy(&from, &to).map_err(TilerError::file_io(&to))?;
    Ok(Some(to))
}

/// Result of tiling one source image.
#[derive(Debug, Default)]
pub struct ImageTiles {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub boxes_read: usize,
    pub boxes_emitted: usize,
    /// Crop paths of positive tiles, in grid order.
    pub positive: Vec<PathBuf>,
    pub negative: usize,
    pub discarded: usize,
    /// Label lines that were skipped.
    pub rejected: Vec<TilerError>,
}

/// Tiles one source image into `outputs`.
///
/// In strict mode the first malformed label line is returned as an error.
/// On any error, files already written for this image are removed so the
/// target only ever holds complete images.
pub fn tile_image(
    source: &SourceImage,
    outputs: &OutputDirs,
    tile_size: u32,
    strict: bool,
) -> Result<ImageTiles, TilerError> {
    let mut written = Vec::new();
    let result = tile_image_inner(source, outputs, tile_size, strict, &mut written);

    if result.is_err() {
        for path in &written {
            if let Err(err) = fs::remove_file(path) {
                debug!(path = %path.display(), %err, "could not remove partial output");
            }
        }
    }

    result
}

fn tile_image_inner(
    source: &SourceImage,
    outputs: &OutputDirs,
    tile_size: u32,
    strict: bool,
    written: &mut Vec<PathBuf>,
) -> Result<ImageTiles, TilerError> {
    let label_file = read_label_file(&source.labels)?;

    let image = image::open(&source.image).map_err(|source_err| TilerError::ImageRead {
        path: source.image.clone(),
        source: source_err,
    })?;
    let (width, height) = image.dimensions();

    let mut result = ImageTiles {
        source: source.image.clone(),
        width,
        height,
        boxes_read: label_file.records.len() + label_file.malformed.len(),
        ..Default::default()
    };

    for err in label_file.malformed {
        if strict {
            return Err(err);
        }
        result.rejected.push(err);
    }

    let mut boxes = Vec::with_capacity(label_file.records.len());
    for record in &label_file.records {
        match to_absolute(&record.annotation, width, height) {
            Ok(bounds) => boxes.push(LabeledBox::new(record.annotation.class_id, bounds)),
            Err(rejection) => {
                let err = TilerError::MalformedBox {
                    path: source.labels.clone(),
                    line: record.line,
                    message: rejection.to_string(),
                };
                if strict {
                    return Err(err);
                }
                result.rejected.push(err);
            }
        }
    }

    for err in &result.rejected {
        warn!("{err}");
    }

    let grid = Grid::new(width, height, tile_size)?;
    let index = BoxIndex::new(grid, &boxes);
    let emitter = TileEmitter::new(&image, &source.stem, outputs);

    for tile in grid.iter() {
        match emitter.emit(&tile, index.tile_annotations(&tile))? {
            TileOutcome::Positive {
                image_path,
                label_path,
                boxes,
                ..
            } => {
                result.boxes_emitted += boxes;
                written.push(label_path);
                written.push(image_path.clone());
                result.positive.push(image_path);
            }
            TileOutcome::Negative { image_path, .. } => {
                written.push(image_path);
                result.negative += 1;
            }
            TileOutcome::Discarded { .. } => result.discarded += 1,
        }
    }

    Ok(result)
}

/// Runs a whole tiling job and returns its report.
pub fn tile_dataset(opts: &TileOptions) -> Result<TilingReport, TilerError> {
    validate_tile_options(opts)?;

    let sources = discover_sources(&opts.source, &opts.extension)?;
    prepare_output_dir(&opts.target)?;
    if let Some(negative_dir) = &opts.negative_dir {
        prepare_output_dir(negative_dir)?;
    }

    let mut report = TilingReport::new(
        opts.source.display().to_string(),
        opts.target.display().to_string(),
        opts.tile_size,
    );
    report.images.found = sources.len();

    match copy_class_names(&opts.source, &opts.target)? {
        Some(dest) => report.add(TilingIssue::info(
            TilingIssueCode::ClassNamesCopied,
            format!("{} copied to {}", CLASS_NAMES_FILE, dest.display()),
        )),
        None => {
            warn!(
                "{} not found; it should be located one level above the images",
                CLASS_NAMES_FILE
            );
            report.add(TilingIssue::info(
                TilingIssueCode::ClassNamesMissing,
                format!(
                    "{} not found one level above {}",
                    CLASS_NAMES_FILE,
                    opts.source.display()
                ),
            ));
        }
    }

    preflight_dimensions(&sources, opts, &mut report)?;

    let outputs = OutputDirs {
        target: opts.target.clone(),
        negative: opts.negative_dir.clone(),
        extension: opts.extension.clone(),
    };

    let mut positives = Vec::new();
    for (source, outcome) in sources.iter().zip(run_images(&sources, &outputs, opts)?) {
        match outcome {
            Ok(tiles) => {
                report.images.processed += 1;
                report.tiles.positive += tiles.positive.len();
                report.tiles.negative += tiles.negative;
                report.tiles.discarded += tiles.discarded;
                report.boxes.read += tiles.boxes_read;
                report.boxes.rejected += tiles.rejected.len();
                report.boxes.emitted += tiles.boxes_emitted;
                for err in &tiles.rejected {
                    report.add(TilingIssue::warning(
                        TilingIssueCode::MalformedBox,
                        err.to_string(),
                    ));
                }
                positives.extend(tiles.positive);
            }
            Err(err) => {
                error!(image = %source.image.display(), "skipping image: {err}");
                report.images.skipped += 1;
                report.add(TilingIssue::warning(
                    TilingIssueCode::ImageSkipped,
                    format!("skipped {}: {}", source.image.display(), err),
                ));
            }
        }
    }

    // Concurrent runs finish in any order; sorting keeps seeded splits stable.
    positives.sort();
    let split = split_items(&positives, &opts.split);
    write_split_lists(&parent_dir(&opts.target)?, &split)?;
    report.split = SplitCounts {
        train: split.train.len(),
        test: split.test.len(),
    };
    info!(train = split.train.len(), test = split.test.len(), "split written");

    Ok(report)
}

/// Tiles every source, sequentially or on a thread pool.
///
/// Results come back in `sources` order. In strict mode the first failure
/// (in that order) is returned as the error.
fn run_images(
    sources: &[SourceImage],
    outputs: &OutputDirs,
    opts: &TileOptions,
) -> Result<Vec<Result<ImageTiles, TilerError>>, TilerError> {
    let process = |source: &SourceImage| {
        info!(image = %source.image.display(), "tiling image");
        tile_image(source, outputs, opts.tile_size, opts.strict)
    };

    let results: Vec<Result<ImageTiles, TilerError>> = if opts.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.jobs)
            .build()
            .map_err(|err| TilerError::InvalidOptions {
                message: format!("could not start {} worker threads: {err}", opts.jobs),
            })?;
        pool.install(|| sources.par_iter().map(process).collect())
    } else {
        let mut results = Vec::with_capacity(sources.len());
        for source in sources {
            let outcome = process(source);
            let failed = outcome.is_err();
            results.push(outcome);
            if failed && opts.strict {
                break;
            }
        }
        results
    };

    if opts.strict {
        return results.into_iter().map(|outcome| outcome.map(Ok)).collect();
    }

    Ok(results)
}

/// Reads image headers to flag images that lose pixels to tiling.
fn preflight_dimensions(
    sources: &[SourceImage],
    opts: &TileOptions,
    report: &mut TilingReport,
) -> Result<(), TilerError> {
    let tile = opts.tile_size as usize;

    for source in sources {
        let size = match imagesize::size(&source.image) {
            Ok(size) => size,
            Err(err) => {
                let err = TilerError::ImageDimensionRead {
                    path: source.image.clone(),
                    source: err,
                };
                if opts.strict {
                    return Err(err);
                }
                debug!("{err}");
                report.add(TilingIssue::info(
                    TilingIssueCode::ImageHeaderUnreadable,
                    err.to_string(),
                ));
                continue;
            }
        };

        if size.width < tile || size.height < tile {
            report.add(TilingIssue::info(
                TilingIssueCode::ImageSmallerThanTile,
                format!(
                    "{} is {}x{}, smaller than one {}px tile; it yields no tiles",
                    source.image.display(),
                    size.width,
                    size.height,
                    tile
                ),
            ));
        } else if size.width % tile != 0 || size.height % tile != 0 {
            report.add(TilingIssue::info(
                TilingIssueCode::RemainderDropped,
                format!(
                    "{} is {}x{}; the trailing {}px column strip and {}px row strip are not tiled",
                    source.image.display(),
                    size.width,
                    size.height,
                    size.width % tile,
                    size.height % tile
                ),
            ));
        }
    }

    Ok(())
}

/// Re-splits an already tiled directory.
pub fn split_tiled_dir(
    target: &Path,
    extension: &str,
    opts: &SplitOptions,
) -> Result<SplitReport, TilerError> {
    validate_split_options(opts)?;

    if !target.is_dir() {
        return Err(TilerError::InputMismatch {
            path: target.to_path_buf(),
            message: "target must be a directory".to_string(),
        });
    }

    let tiles = collect_tile_images(target, extension)?;
    let split = split_items(&tiles, opts);
    write_split_lists(&parent_dir(target)?, &split)?;

    Ok(SplitReport {
        target: target.display().to_string(),
        split: SplitCounts {
            train: split.train.len(),
            test: split.test.len(),
        },
    })
}

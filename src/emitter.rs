//! Per-tile output: raster crops and tile-local label files.
//!
//! Each tile runs a two-state machine. It starts [`TileState::Pending`];
//! the first intersecting box writes the crop to the target directory and
//! moves it to [`TileState::Saved`], later boxes only append labels. When
//! all boxes have been tested a saved tile gets its label file, and a tile
//! that never left `Pending` is written to the negative directory if one is
//! configured, or dropped otherwise.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::error::TilerError;
use crate::geom::BoxAnnotation;
use crate::grid::Tile;
use crate::label::{write_label_file, LABEL_EXTENSION};

/// Identity of an emitted tile: `(source stem, row, col)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId {
    pub stem: String,
    pub row: u32,
    pub col: u32,
}

impl TileId {
    pub fn new(stem: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            stem: stem.into(),
            row,
            col,
        }
    }

    /// File name of the tile crop, e.g. `scene_1_2.JPG`.
    ///
    /// `extension` may be given with or without its leading dot.
    pub fn image_file_name(&self, extension: &str) -> String {
        format!("{}.{}", self, extension.trim_start_matches('.'))
    }

    /// File name of the tile label file, e.g. `scene_1_2.txt`.
    pub fn label_file_name(&self) -> String {
        format!("{}.{}", self, LABEL_EXTENSION)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.stem, self.row, self.col)
    }
}

/// Where emitted tiles go.
#[derive(Clone, Debug)]
pub struct OutputDirs {
    /// Positive tiles and their label files.
    pub target: PathBuf,
    /// Tiles without boxes; `None` discards them.
    pub negative: Option<PathBuf>,
    /// Extension for crop files, with or without the leading dot.
    pub extension: String,
}

/// Emission state of one tile.
#[derive(Clone, Debug, PartialEq)]
pub enum TileState {
    Pending,
    Saved(Vec<BoxAnnotation>),
}

/// What happened to a tile once all boxes were tested.
#[derive(Clone, Debug, PartialEq)]
pub enum TileOutcome {
    Positive {
        id: TileId,
        image_path: PathBuf,
        label_path: PathBuf,
        boxes: usize,
    },
    Negative {
        id: TileId,
        image_path: PathBuf,
    },
    Discarded {
        id: TileId,
    },
}

/// Writes the tiles of one decoded source image.
pub struct TileEmitter<'a> {
    image: &'a DynamicImage,
    stem: &'a str,
    outputs: &'a OutputDirs,
}

impl<'a> TileEmitter<'a> {
    pub fn new(image: &'a DynamicImage, stem: &'a str, outputs: &'a OutputDirs) -> Self {
        Self {
            image,
            stem,
            outputs,
        }
    }

    /// Runs the state machine for `tile` over its reprojected boxes.
    pub fn emit<I>(&self, tile: &Tile, hits: I) -> Result<TileOutcome, TilerError>
    where
        I: IntoIterator<Item = BoxAnnotation>,
    {
        let id = TileId::new(self.stem, tile.row(), tile.col());
        let image_path = self
            .outputs
            .target
            .join(id.image_file_name(&self.outputs.extension));

        let mut state = TileState::Pending;
        for ann in hits {
            state = match state {
                TileState::Pending => {
                    self.save_crop(tile, &image_path)?;
                    TileState::Saved(vec![ann])
                }
                TileState::Saved(mut labels) => {
                    labels.push(ann);
                    TileState::Saved(labels)
                }
            };
        }

        match state {
            TileState::Saved(labels) => {
                let label_path = self.outputs.target.join(id.label_file_name());
                if let Err(err) = write_label_file(&label_path, &labels) {
                    // a crop without its label file would read as a negative sample
                    let _ = fs::remove_file(&image_path);
                    return Err(err);
                }
                debug!(tile = %id, boxes = labels.len(), "saved positive tile");
                Ok(TileOutcome::Positive {
                    id,
                    image_path,
                    label_path,
                    boxes: labels.len(),
                })
            }
            TileState::Pending => match &self.outputs.negative {
                Some(negative_dir) => {
                    let negative_path =
                        negative_dir.join(id.image_file_name(&self.outputs.extension));
                    self.save_crop(tile, &negative_path)?;
                    debug!(tile = %id, "saved tile without boxes");
                    Ok(TileOutcome::Negative {
                        id,
                        image_path: negative_path,
                    })
                }
                None => Ok(TileOutcome::Discarded { id }),
            },
        }
    }

    fn save_crop(&self, tile: &Tile, path: &Path) -> Result<(), TilerError> {
        let (x, y, width, height) = tile.crop_rect();
        self.image
            .crop_imm(x, y, width, height)
            .save(path)
            .map_err(|source| TilerError::ImageWrite {
                path: path.to_path_buf(),
                source,
            })
    }
}

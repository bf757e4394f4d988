//! Fixed-size, non-overlapping tile grid.
//!
//! Tiles are enumerated row-major from the top of the image. Each axis holds
//! `floor(dimension / slice_size)` tiles; a trailing strip narrower than one
//! tile is never covered.

use std::iter::FusedIterator;
use std::ops::RangeInclusive;

use crate::error::TilerError;
use crate::geom::{AbsoluteBox, Raster, Rect};

/// Grid layout for one source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    slice_size: u32,
}

impl Grid {
    /// Creates a grid for an image of `width` x `height` pixels.
    pub fn new(width: u32, height: u32, slice_size: u32) -> Result<Self, TilerError> {
        if slice_size == 0 {
            return Err(TilerError::InvalidOptions {
                message: "tile size must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            width,
            height,
            slice_size,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn slice_size(&self) -> u32 {
        self.slice_size
    }

    /// Number of tile rows (`height / slice_size`, floored).
    pub fn rows(&self) -> u32 {
        self.height / self.slice_size
    }

    /// Number of tile columns (`width / slice_size`, floored).
    pub fn cols(&self) -> u32 {
        self.width / self.slice_size
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tile at `(row, col)`, or `None` outside the grid.
    pub fn tile(&self, row: u32, col: u32) -> Option<Tile> {
        (row < self.rows() && col < self.cols()).then(|| Tile::new(row, col, *self))
    }

    /// Lazily enumerates all tiles, row-major. Every call starts over.
    pub fn iter(&self) -> Tiles {
        Tiles {
            grid: *self,
            next: 0,
            end: self.len(),
        }
    }
}

impl IntoIterator for &Grid {
    type Item = Tile;
    type IntoIter = Tiles;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    row: u32,
    col: u32,
    slice_size: u32,
    bounds: AbsoluteBox,
}

impl Tile {
    fn new(row: u32, col: u32, grid: Grid) -> Self {
        let size = grid.slice_size;
        // Continuous pixel edges rather than the inclusive last pixel `(j+1)*s - 1`.
        let raster: Rect<Raster> = Rect::from_xyxy(
            f64::from(col * size),
            f64::from(row * size),
            f64::from((col + 1) * size),
            f64::from((row + 1) * size),
        );

        Self {
            row,
            col,
            slice_size: size,
            bounds: raster.to_geometric(f64::from(grid.height)),
        }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// Continuous extent of the tile in the geometric frame.
    ///
    /// Edges sit on pixel boundaries, so the extent is exactly
    /// `slice_size` wide and tall and neighbouring tiles share an edge.
    pub fn bounds(&self) -> &AbsoluteBox {
        &self.bounds
    }

    /// Raster pixel columns covered by the tile: `j*s ..= (j+1)*s - 1`.
    pub fn pixel_columns(&self) -> RangeInclusive<u32> {
        self.col * self.slice_size..=(self.col + 1) * self.slice_size - 1
    }

    /// Raster pixel rows covered by the tile: `i*s ..= (i+1)*s - 1`.
    pub fn pixel_rows(&self) -> RangeInclusive<u32> {
        self.row * self.slice_size..=(self.row + 1) * self.slice_size - 1
    }

    /// Top-left raster pixel and side length, as needed for cropping.
    pub fn crop_rect(&self) -> (u32, u32, u32, u32) {
        (
            *self.pixel_columns().start(),
            *self.pixel_rows().start(),
            self.slice_size,
            self.slice_size,
        )
    }
}

/// Iterator over the tiles of a [`Grid`].
#[derive(Clone, Debug)]
pub struct Tiles {
    grid: Grid,
    next: usize,
    end: usize,
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let cols = self.grid.cols() as usize;
        let row = (self.next / cols) as u32;
        let col = (self.next % cols) as u32;
        self.next += 1;

        Some(Tile::new(row, col, self.grid))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tiles {}

impl FusedIterator for Tiles {}

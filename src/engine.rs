//! Intersection and reprojection of image boxes into tile-local labels.
//!
//! Everything here is a pure function of a tile and the boxes of its source
//! image. File output is the emitter's job.

use crate::geom::{to_normalized_local, AbsoluteBox, BoxAnnotation};
use crate::grid::{Grid, Tile};

/// An image-level box already converted to the geometric frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledBox {
    pub class_id: usize,
    pub bounds: AbsoluteBox,
}

impl LabeledBox {
    pub fn new(class_id: usize, bounds: AbsoluteBox) -> Self {
        Self { class_id, bounds }
    }
}

/// Overlaps thinner than this many pixels on either axis count as touching.
///
/// Scaling a normalized label back to pixels can leave an edge that sits on
/// a seam a few ulps inside the neighbouring tile.
pub const SEAM_TOLERANCE: f64 = 1e-6;

/// True if the box and the tile share a region of positive area.
///
/// A box that only touches a tile edge does not count, which keeps
/// zero-size boxes out of the tiles on either side of a seam. Overlaps
/// narrower than [`SEAM_TOLERANCE`] are treated as touching.
pub fn intersects(tile: &Tile, bounds: &AbsoluteBox) -> bool {
    let tile_bounds = tile.bounds();
    if !tile_bounds.intersects(bounds) {
        return false;
    }

    let overlap = bounds.clamp_to(tile_bounds);
    overlap.width() > SEAM_TOLERANCE && overlap.height() > SEAM_TOLERANCE
}

/// Clips a box to the tile by elementwise max/min.
///
/// Only meaningful when [`intersects`] holds.
pub fn clip(tile: &Tile, bounds: &AbsoluteBox) -> AbsoluteBox {
    bounds.clamp_to(tile.bounds())
}

/// Converts a clipped box into a label in the tile's local frame.
pub fn reproject(
    clipped: &AbsoluteBox,
    tile: &Tile,
    slice_size: u32,
    class_id: usize,
) -> BoxAnnotation {
    let (cx, cy, w, h) = to_normalized_local(clipped, tile.bounds(), slice_size);
    BoxAnnotation::new(class_id, cx, cy, w, h)
}

fn reproject_hit(tile: &Tile, labeled: &LabeledBox, slice_size: u32) -> Option<BoxAnnotation> {
    intersects(tile, &labeled.bounds).then(|| {
        let clipped = clip(tile, &labeled.bounds);
        reproject(&clipped, tile, slice_size, labeled.class_id)
    })
}

/// Tests every box against the tile, in the order the boxes were read.
pub fn tile_annotations(tile: &Tile, boxes: &[LabeledBox], slice_size: u32) -> Vec<BoxAnnotation> {
    boxes
        .iter()
        .filter_map(|labeled| reproject_hit(tile, labeled, slice_size))
        .collect()
}

/// Grid-bucket index from tiles to the boxes that may overlap them.
///
/// Each box is registered in every cell its extent reaches, edges included,
/// so a bucket is a superset of the true hits; the exact overlap test still
/// runs on each candidate. Buckets keep boxes in read order, so
/// [`BoxIndex::tile_annotations`] returns exactly what the full scan in
/// [`tile_annotations`] would.
#[derive(Clone, Debug)]
pub struct BoxIndex<'a> {
    grid: Grid,
    boxes: &'a [LabeledBox],
    buckets: Vec<Vec<usize>>,
}

impl<'a> BoxIndex<'a> {
    pub fn new(grid: Grid, boxes: &'a [LabeledBox]) -> Self {
        let mut buckets = vec![Vec::new(); grid.len()];
        let cols = grid.cols() as usize;

        for (index, labeled) in boxes.iter().enumerate() {
            let Some((rows, col_range)) = cell_span(&grid, &labeled.bounds) else {
                continue;
            };
            for row in rows.0..=rows.1 {
                for col in col_range.0..=col_range.1 {
                    buckets[row * cols + col].push(index);
                }
            }
        }

        Self {
            grid,
            boxes,
            buckets,
        }
    }

    /// Indices of boxes that may overlap the tile, in read order.
    pub fn candidates(&self, tile: &Tile) -> &[usize] {
        let index = tile.row() as usize * self.grid.cols() as usize + tile.col() as usize;
        self.buckets.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tile_annotations(&self, tile: &Tile) -> Vec<BoxAnnotation> {
        let slice_size = self.grid.slice_size();
        self.candidates(tile)
            .iter()
            .filter_map(|&index| reproject_hit(tile, &self.boxes[index], slice_size))
            .collect()
    }
}

type CellRange = (usize, usize);

/// Inclusive row and column ranges of grid cells a box reaches.
fn cell_span(grid: &Grid, bounds: &AbsoluteBox) -> Option<(CellRange, CellRange)> {
    if grid.is_empty() || !bounds.is_finite() {
        return None;
    }

    let size = f64::from(grid.slice_size());
    let raster = bounds.to_raster(f64::from(grid.height()));

    let cols = axis_span(raster.xmin(), raster.xmax(), size, grid.cols())?;
    let rows = axis_span(raster.ymin(), raster.ymax(), size, grid.rows())?;
    Some((rows, cols))
}

fn axis_span(lo: f64, hi: f64, size: f64, count: u32) -> Option<CellRange> {
    let last = f64::from(count) - 1.0;
    let first_cell = (lo / size).floor();
    let last_cell = (hi / size).floor();

    if last_cell < 0.0 || first_cell > last {
        return None;
    }

    Some((first_cell.max(0.0) as usize, last_cell.min(last) as usize))
}

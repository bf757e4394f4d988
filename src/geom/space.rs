//! Coordinate frame marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! the two vertical conventions a tiler has to juggle. Mixing them up flips
//! boxes upside down without any error, so they are kept apart at compile
//! time.

use std::fmt;

/// Marker type for raster pixel coordinates.
///
/// The origin is the top-left corner of the image and `y` grows downwards,
/// following row order in the pixel buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Raster {}

/// Marker type for geometric pixel coordinates.
///
/// The origin is the bottom-left corner of the image and `y` grows upwards,
/// so `y_geometric = image_height - y_raster`. All intersection tests run in
/// this frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometric {}

impl fmt::Debug for Raster {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Geometric {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

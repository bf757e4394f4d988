//! Geometry types for the tiler.
//!
//! # Design Principles
//!
//! 1. **Frame Safety**: Raster (top-down) and geometric (bottom-up)
//!    coordinates are distinct types. Converting between them requires the
//!    image height, so a forgotten flip is a compile error rather than a
//!    mirrored label file.
//!
//! 2. **Rectangles Only**: Both tiles and boxes are axis-aligned, so the
//!    intersection of two of them is again a rectangle. [`Rect`] carries
//!    explicit `intersects` / `intersection` / `union` helpers instead of a
//!    general polygon type.
//!
//! 3. **Permissive Construction**: Rectangles allow malformed extents so a
//!    bad label line can be reported instead of panicking during parsing.
//!
//! # Example
//!
//! ```
//! use yolotile::geom::{to_absolute, to_normalized_local, AbsoluteBox, BoxAnnotation};
//!
//! let ann = BoxAnnotation::new(0, 0.25, 0.25, 0.1, 0.1);
//! let abs = to_absolute(&ann, 800, 800).unwrap();
//!
//! let tile = AbsoluteBox::from_xyxy(0.0, 400.0, 400.0, 800.0);
//! let (cx, cy, w, h) = to_normalized_local(&abs, &tile, 400);
//! assert!((cx - 0.5).abs() < 1e-9 && (cy - 0.5).abs() < 1e-9);
//! assert!((w - 0.2).abs() < 1e-9 && (h - 0.2).abs() < 1e-9);
//! ```

mod annotation;
mod convert;
mod coord;
mod rect;
mod space;

pub use annotation::{BoxAnnotation, BoxRejection};
pub use convert::{to_absolute, to_normalized_local};
pub use coord::Coord;
pub use rect::{AbsoluteBox, Rect};
pub use space::{Geometric, Raster};

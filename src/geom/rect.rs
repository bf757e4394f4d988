//! Axis-aligned rectangles in canonical XYXY format.

use super::coord::Coord;
use super::{Geometric, Raster};

/// An axis-aligned rectangle in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter should be either [`Raster`] or [`Geometric`].
///
/// Note: the constructor does NOT enforce that min < max, so a rectangle
/// built from a bad label line can still be represented and rejected later
/// with a useful message.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

/// An absolute-pixel box in the geometric (bottom-up) frame.
pub type AbsoluteBox = Rect<Geometric>;

impl<TSpace> Rect<TSpace> {
    /// Creates a new rectangle from min and max corners.
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    /// Creates a new rectangle from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Creates a rectangle from its center point and full extents.
    #[inline]
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Returns the width of the rectangle.
    ///
    /// May be negative if the rectangle is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Returns the height of the rectangle.
    ///
    /// May be negative if the rectangle is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point of the rectangle.
    #[inline]
    pub fn center(&self) -> Coord<TSpace> {
        self.min.midpoint(&self.max)
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Returns true if the rectangle has strictly positive extent on both axes.
    #[inline]
    pub fn is_proper(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y
    }

    /// Returns true if `other` lies fully inside `self` (edges included).
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Returns true if the two rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge or at a corner do not
    /// intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Elementwise max/min of the corners.
    ///
    /// The result is only meaningful when [`Rect::intersects`] holds;
    /// otherwise it is an improper rectangle.
    pub fn clamp_to(&self, other: &Self) -> Self {
        Self::from_xyxy(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        )
    }

    /// Intersection of two rectangles, or `None` for zero-area overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.intersects(other).then(|| self.clamp_to(other))
    }

    /// Smallest rectangle containing both inputs.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_xyxy(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }
}

impl Rect<Raster> {
    /// Re-expresses a raster rectangle in the geometric frame of an image
    /// `image_height` pixels tall.
    pub fn to_geometric(&self, image_height: f64) -> Rect<Geometric> {
        Rect::from_xyxy(
            self.min.x,
            image_height - self.max.y,
            self.max.x,
            image_height - self.min.y,
        )
    }
}

impl Rect<Geometric> {
    /// Re-expresses a geometric rectangle in the raster frame of an image
    /// `image_height` pixels tall.
    pub fn to_raster(&self, image_height: f64) -> Rect<Raster> {
        Rect::from_xyxy(
            self.min.x,
            image_height - self.max.y,
            self.max.x,
            image_height - self.min.y,
        )
    }
}

impl<TSpace> std::fmt::Debug for Rect<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rect")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for Rect<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

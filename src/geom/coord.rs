//! Typed points using PhantomData for compile-time frame safety.

use std::marker::PhantomData;

/// A 2D point with a type-level marker for its coordinate frame.
///
/// The `TSpace` parameter should be either [`Raster`](super::Raster) or
/// [`Geometric`](super::Geometric).
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    /// Creates a new point with the given x and y values.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point halfway between `self` and `other`.
    #[inline]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<TSpace> Default for Coord<TSpace> {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

//! Normalized center-format box annotations.

use thiserror::Error;

/// One `class cx cy w h` record.
///
/// All geometric values are fractions of the frame the box belongs to: the
/// whole image for source labels, a single tile for emitted labels. `cy`
/// follows the label convention where 0 is the top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxAnnotation {
    pub class_id: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoxAnnotation {
    pub fn new(class_id: usize, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    /// Checks that every geometric field is a finite value in `[0, 1]`.
    pub fn check_normalized(&self) -> Result<(), BoxRejection> {
        for (field, value) in [
            ("x_center", self.cx),
            ("y_center", self.cy),
            ("width", self.w),
            ("height", self.h),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(BoxRejection::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Why a box annotation cannot be mapped into pixel space.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BoxRejection {
    #[error("{field} {value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("box has non-positive size {width}x{height} px")]
    EmptyExtent { width: f64, height: f64 },
}

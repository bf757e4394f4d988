//! Conversions between normalized annotations and absolute geometric boxes.
//!
//! This is the only place where the vertical axis gets flipped. Labels
//! measure `cy` from the top edge while intersection tests run in the
//! bottom-up [`Geometric`](super::Geometric) frame, so the flip happens once
//! on the way in ([`to_absolute`]) and once on the way out
//! ([`to_normalized_local`]).

use super::annotation::{BoxAnnotation, BoxRejection};
use super::rect::AbsoluteBox;

/// Maps a normalized image-level annotation to an absolute geometric box.
///
/// `x = cx*W -/+ w*W/2`. For `y`, the center is first scaled to raster
/// pixels (`cy*H`, measured from the top) and then flipped to
/// `H - cy*H` before extending by `h*H/2` on either side.
pub fn to_absolute(
    ann: &BoxAnnotation,
    image_width: u32,
    image_height: u32,
) -> Result<AbsoluteBox, BoxRejection> {
    ann.check_normalized()?;

    let width = f64::from(image_width);
    let height = f64::from(image_height);

    let box_w = ann.w * width;
    let box_h = ann.h * height;
    if box_w <= 0.0 || box_h <= 0.0 {
        return Err(BoxRejection::EmptyExtent {
            width: box_w,
            height: box_h,
        });
    }

    let center_x = ann.cx * width;
    let center_y = height - ann.cy * height;

    Ok(AbsoluteBox::from_center(center_x, center_y, box_w, box_h))
}

/// Normalizes a clipped envelope into a tile's local frame.
///
/// Returns `(cx, cy, w, h)` with `cy` measured from the tile's top edge,
/// i.e. the same convention as the source labels.
pub fn to_normalized_local(
    envelope: &AbsoluteBox,
    tile_bounds: &AbsoluteBox,
    slice_size: u32,
) -> (f64, f64, f64, f64) {
    let size = f64::from(slice_size);
    let center = envelope.center();

    let cx = (center.x - tile_bounds.xmin()) / size;
    // tile_bounds.ymax() is the tile's top edge in the geometric frame
    let cy = (tile_bounds.ymax() - center.y) / size;
    let w = envelope.width() / size;
    let h = envelope.height() / size;

    (cx, cy, w, h)
}

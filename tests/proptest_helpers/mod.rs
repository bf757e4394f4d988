#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use yolotile::engine::LabeledBox;
use yolotile::geom::{to_absolute, BoxAnnotation};

/// Slack for values that went through a couple of float operations.
pub const EPS: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// `(width, height, slice_size)` with up to one tile's worth of remainder.
pub fn arb_layout() -> impl Strategy<Value = (u32, u32, u32)> {
    (1u32..=48, 1u32..=6, 1u32..=6).prop_flat_map(|(size, cols, rows)| {
        (0..size, 0..size).prop_map(move |(extra_w, extra_h)| {
            (cols * size + extra_w, rows * size + extra_h, size)
        })
    })
}

/// A normalized box with positive extent.
pub fn arb_annotation() -> impl Strategy<Value = BoxAnnotation> {
    (0usize..10, 0.0f64..=1.0, 0.0f64..=1.0, 0.001f64..=1.0, 0.001f64..=1.0)
        .prop_map(|(class_id, cx, cy, w, h)| BoxAnnotation::new(class_id, cx, cy, w, h))
}

pub fn arb_annotations(max: usize) -> impl Strategy<Value = Vec<BoxAnnotation>> {
    prop::collection::vec(arb_annotation(), 0..=max)
}

pub fn to_labeled(anns: &[BoxAnnotation], width: u32, height: u32) -> Vec<LabeledBox> {
    anns.iter()
        .map(|ann| {
            LabeledBox::new(
                ann.class_id,
                to_absolute(ann, width, height).expect("generated boxes are valid"),
            )
        })
        .collect()
}

/// A box whose edges lie exactly on tile seams of a `cols x rows` grid.
#[derive(Clone, Debug)]
pub struct AlignedBox {
    pub size: u32,
    pub cols: u32,
    pub rows: u32,
    /// Half-open tile column range covered by the box.
    pub col_span: (u32, u32),
    /// Half-open tile row range covered by the box.
    pub row_span: (u32, u32),
    pub annotation: BoxAnnotation,
}

fn arb_span(count: u32) -> impl Strategy<Value = (u32, u32)> {
    (0..count).prop_flat_map(move |start| (Just(start), start + 1..=count))
}

/// Seam-aligned boxes, with label values computed as `k * s / dimension`
/// the way an annotation tool would write them.
pub fn arb_aligned_box() -> impl Strategy<Value = AlignedBox> {
    (
        prop::sample::select(vec![32u32, 100, 416, 600, 640]),
        1u32..=8,
        1u32..=8,
    )
        .prop_flat_map(|(size, cols, rows)| {
            (Just(size), Just(cols), Just(rows), arb_span(cols), arb_span(rows))
        })
        .prop_map(|(size, cols, rows, col_span, row_span)| {
            let width = f64::from(cols * size);
            let height = f64::from(rows * size);
            let s = f64::from(size);
            let cx = f64::from(col_span.0 + col_span.1) * s / 2.0 / width;
            let cy = f64::from(row_span.0 + row_span.1) * s / 2.0 / height;
            let w = f64::from(col_span.1 - col_span.0) * s / width;
            let h = f64::from(row_span.1 - row_span.0) * s / height;

            AlignedBox {
                size,
                cols,
                rows,
                col_span,
                row_span,
                annotation: BoxAnnotation::new(0, cx, cy, w, h),
            }
        })
}

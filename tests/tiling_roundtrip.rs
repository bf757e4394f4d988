//! End-to-end tests for dataset tiling through the library API.

use std::fs;
use std::path::Path;

use image::GenericImageView;
use yolotile::split::SplitOptions;
use yolotile::tiling::{tile_dataset, TileOptions, TilingIssueCode, TilingReport};
use yolotile::TilerError;

mod common;
use common::{file_names, parse_line, read_lines, Layout};

fn options(layout: &Layout, seed: u64) -> TileOptions {
    let mut opts = TileOptions::new(&layout.source, &layout.target);
    opts.extension = ".png".to_string();
    opts.tile_size = 40;
    opts.split = SplitOptions {
        ratio: 0.5,
        seed: Some(seed),
    };
    opts
}

fn has_issue(report: &TilingReport, code: TilingIssueCode) -> bool {
    report.issues.iter().any(|issue| issue.code == code)
}

fn listed_names(out: &Path) -> (Vec<String>, Vec<String>) {
    let names = |list: &str| {
        read_lines(&out.join(list))
            .iter()
            .map(|line| {
                Path::new(line)
                    .file_name()
                    .expect("file name")
                    .to_string_lossy()
                    .into_owned()
            })
            .collect::<Vec<_>>()
    };
    (names("train.txt"), names("test.txt"))
}

#[test]
fn box_on_a_seam_is_split_between_tiles() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image("scene", 80, 80, &["1 0.5 0.25 0.2 0.1"]);

    let report = tile_dataset(&options(&layout, 1)).expect("tile dataset");
    assert_eq!(report.tiles.positive, 2);
    assert_eq!(report.boxes.emitted, 2);

    assert_eq!(
        read_lines(&layout.target.join("scene_0_0.txt")),
        vec!["1 0.900000 0.500000 0.200000 0.200000".to_string()]
    );
    assert_eq!(
        read_lines(&layout.target.join("scene_0_1.txt")),
        vec!["1 0.100000 0.500000 0.200000 0.200000".to_string()]
    );
}

#[test]
fn box_covering_a_whole_tile_fills_it() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image("full", 40, 40, &["0 0.5 0.5 1 1"]);

    tile_dataset(&options(&layout, 1)).expect("tile dataset");

    assert_eq!(
        read_lines(&layout.target.join("full_0_0.txt")),
        vec!["0 0.500000 0.500000 1.000000 1.000000".to_string()]
    );
}

#[test]
fn bottom_boxes_stay_at_the_bottom() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    // Raster y 70 of 80: bottom row of tiles, near the bottom of that tile.
    layout.add_image("scene", 80, 80, &["2 0.125 0.875 0.05 0.05"]);

    tile_dataset(&options(&layout, 1)).expect("tile dataset");

    let lines = read_lines(&layout.target.join("scene_1_0.txt"));
    assert_eq!(lines.len(), 1);
    let (class_id, cx, cy, w, h) = parse_line(&lines[0]);
    assert_eq!(class_id, 2);
    assert!((cx - 0.25).abs() < 1e-6);
    assert!((cy - 0.75).abs() < 1e-6);
    assert!((w - 0.1).abs() < 1e-6);
    assert!((h - 0.1).abs() < 1e-6);
}

#[test]
fn crops_come_from_the_matching_region() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image("scene", 80, 80, &["0 0.75 0.75 0.1 0.1"]);

    tile_dataset(&options(&layout, 1)).expect("tile dataset");

    let crop = image::open(layout.target.join("scene_1_1.png")).expect("open crop");
    assert_eq!(crop.dimensions(), (40, 40));
    let corner = crop.get_pixel(0, 0);
    assert_eq!((corner[0], corner[1]), (40, 40));
    let far = crop.get_pixel(39, 39);
    assert_eq!((far[0], far[1]), (79, 79));
}

#[test]
fn boxes_keep_read_order_within_a_tile() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image(
        "scene",
        40,
        40,
        &["3 0.8 0.8 0.1 0.1", "1 0.2 0.2 0.1 0.1", "2 0.5 0.5 0.1 0.1"],
    );

    tile_dataset(&options(&layout, 1)).expect("tile dataset");

    let classes: Vec<usize> = read_lines(&layout.target.join("scene_0_0.txt"))
        .iter()
        .map(|line| parse_line(line).0)
        .collect();
    assert_eq!(classes, vec![3, 1, 2]);
}

#[test]
fn remainder_strip_is_reported_and_not_tiled() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    // The only box sits in the 20px strip to the right of the last column.
    layout.add_image("wide", 100, 40, &["0 0.9 0.5 0.1 0.1"]);

    let report = tile_dataset(&options(&layout, 1)).expect("tile dataset");

    assert_eq!(report.tiles.positive, 0);
    assert_eq!(report.tiles.discarded, 2);
    assert!(has_issue(&report, TilingIssueCode::RemainderDropped));
    assert!(file_names(&layout.target).is_empty());
    assert!(read_lines(&layout.out_dir().join("train.txt")).is_empty());
}

#[test]
fn image_smaller_than_a_tile_yields_nothing() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image("tiny", 30, 30, &["0 0.5 0.5 0.5 0.5"]);

    let report = tile_dataset(&options(&layout, 1)).expect("tile dataset");

    assert_eq!(report.images.processed, 1);
    assert_eq!(report.tiles.positive + report.tiles.discarded, 0);
    assert!(has_issue(&report, TilingIssueCode::ImageSmallerThanTile));
}

#[test]
fn lenient_mode_skips_bad_lines_and_images() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image(
        "good",
        80,
        80,
        &["0 0.25 0.25 0.1 0.1", "0 0.5", "1 0.5 0.5 0 0.1", "1 1.2 0.5 0.1 0.1"],
    );
    fs::write(layout.source.join("broken.png"), b"definitely not a png").expect("write junk");
    common::write_labels(&layout.source.join("broken.txt"), &["0 0.5 0.5 0.1 0.1"]);

    let report = tile_dataset(&options(&layout, 1)).expect("tile dataset");

    assert_eq!(report.images.found, 2);
    assert_eq!(report.images.processed, 1);
    assert_eq!(report.images.skipped, 1);
    assert_eq!(report.boxes.read, 4);
    assert_eq!(report.boxes.rejected, 3);
    assert_eq!(report.tiles.positive, 1);
    assert!(!report.is_complete());
    assert!(has_issue(&report, TilingIssueCode::ImageSkipped));
    assert!(has_issue(&report, TilingIssueCode::MalformedBox));

    let (train, test) = listed_names(&layout.out_dir());
    let mut all: Vec<String> = train.into_iter().chain(test).collect();
    all.sort();
    assert_eq!(all, vec!["good_0_0.png".to_string()]);
}

#[test]
fn strict_mode_aborts_on_broken_image() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image("good", 80, 80, &["0 0.25 0.25 0.1 0.1"]);
    fs::write(layout.source.join("broken.png"), b"definitely not a png").expect("write junk");
    common::write_labels(&layout.source.join("broken.txt"), &["0 0.5 0.5 0.1 0.1"]);

    let mut opts = options(&layout, 1);
    opts.strict = true;

    assert!(tile_dataset(&opts).is_err());
    assert!(!layout.out_dir().join("train.txt").exists());
}

#[test]
fn strict_mode_aborts_on_out_of_range_box() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image("good", 80, 80, &["0 0.25 0.25 0.1 0.1", "0 0.5 0.5 1.5 0.1"]);

    let mut opts = options(&layout, 1);
    opts.strict = true;

    let err = tile_dataset(&opts).unwrap_err();
    assert!(matches!(err, TilerError::MalformedBox { line: 2, .. }));
    assert!(file_names(&layout.target).is_empty());
}

#[test]
fn split_covers_exactly_the_positive_tiles() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    layout.add_image(
        "scene",
        160,
        160,
        &[
            "0 0.1 0.1 0.05 0.05",
            "0 0.4 0.1 0.05 0.05",
            "0 0.6 0.6 0.05 0.05",
            "0 0.9 0.9 0.05 0.05",
            "0 0.1 0.9 0.05 0.05",
        ],
    );

    let mut opts = options(&layout, 11);
    opts.negative_dir = Some(layout.negative.clone());
    let report = tile_dataset(&opts).expect("tile dataset");

    assert_eq!(report.tiles.positive, 5);
    assert_eq!(report.tiles.negative, 11);

    let (train, test) = listed_names(&layout.out_dir());
    assert_eq!(train.len() + test.len(), 5);
    assert!(train.iter().all(|name| !test.contains(name)));

    let mut all: Vec<String> = train.into_iter().chain(test).collect();
    all.sort();
    let positives: Vec<String> = file_names(&layout.target)
        .into_iter()
        .filter(|name| name.ends_with(".png"))
        .collect();
    assert_eq!(all, positives);
}

#[test]
fn seeded_runs_are_reproducible() {
    let labels = [
        "0 0.1 0.1 0.05 0.05",
        "0 0.4 0.1 0.05 0.05",
        "0 0.6 0.4 0.05 0.05",
        "0 0.9 0.6 0.05 0.05",
        "0 0.4 0.9 0.05 0.05",
        "0 0.9 0.9 0.05 0.05",
    ];
    let run = |jobs: usize| {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = Layout::new(temp.path());
        layout.add_image("a", 160, 160, &labels);
        layout.add_image("b", 160, 160, &labels[..3]);
        layout.add_image("c", 80, 80, &labels[3..]);

        let mut opts = options(&layout, 42);
        opts.jobs = jobs;
        let report = tile_dataset(&opts).expect("tile dataset");

        let labels: Vec<(String, String)> = file_names(&layout.target)
            .into_iter()
            .filter(|name| name.ends_with(".txt"))
            .map(|name| {
                let content = fs::read_to_string(layout.target.join(&name)).expect("read label");
                (name, content)
            })
            .collect();
        (report.tiles.positive, labels, listed_names(&layout.out_dir()))
    };

    let sequential = run(1);
    assert_eq!(sequential, run(1));
    assert_eq!(sequential, run(3));
}

#[test]
fn box_ending_on_a_seam_yields_one_tile() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let layout = Layout::new(temp.path());
    // Bottom edge at raster y = 0.543*300 + 0.114*300/2 = 180, the seam above row 3.
    layout.add_image("seam", 300, 300, &["0 0.5 0.543 0.1 0.114"]);

    let mut opts = options(&layout, 1);
    opts.tile_size = 60;
    let report = tile_dataset(&opts).expect("tile dataset");

    assert_eq!(report.tiles.positive, 1);
    assert_eq!(
        file_names(&layout.target),
        vec!["seam_2_2.png".to_string(), "seam_2_2.txt".to_string()]
    );
    let lines = read_lines(&layout.target.join("seam_2_2.txt"));
    assert_eq!(lines, vec!["0 0.500000 0.715000 0.500000 0.570000".to_string()]);
}

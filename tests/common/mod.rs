#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

/// Writes an RGB image whose red/green channels encode the pixel position,
/// so crops can be traced back to where they came from.
pub fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 0]))
        .save(path)
        .expect("write image");
}

pub fn write_labels(path: &Path, lines: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).expect("write label file");
}

/// Dataset layout used by the tests:
///
/// ```text
/// root/
///   data/classes.names
///   data/images/<name>.png + <name>.txt
///   out/tiles/
/// ```
pub struct Layout {
    pub root: PathBuf,
    pub source: PathBuf,
    pub target: PathBuf,
    pub negative: PathBuf,
}

impl Layout {
    pub fn new(root: &Path) -> Self {
        let source = root.join("data/images");
        fs::create_dir_all(&source).expect("create source dir");
        Self {
            root: root.to_path_buf(),
            source,
            target: root.join("out/tiles"),
            negative: root.join("out/empty"),
        }
    }

    pub fn add_image(&self, stem: &str, width: u32, height: u32, labels: &[&str]) {
        write_image(&self.source.join(format!("{stem}.png")), width, height);
        write_labels(&self.source.join(format!("{stem}.txt")), labels);
    }

    pub fn write_class_names(&self, content: &str) {
        fs::write(self.root.join("data/classes.names"), content).expect("write class names");
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }
}

/// Lines of a text file, without empty trailing lines.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read text file")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Parses an emitted label line into `(class, cx, cy, w, h)`.
pub fn parse_line(line: &str) -> (usize, f64, f64, f64, f64) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    assert_eq!(parts.len(), 5, "unexpected label line '{line}'");
    (
        parts[0].parse().expect("class id"),
        parts[1].parse().expect("cx"),
        parts[2].parse().expect("cy"),
        parts[3].parse().expect("w"),
        parts[4].parse().expect("h"),
    )
}

/// Sorted file names in a directory.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("list dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

//! YOLO label file reader and writer.
//!
//! One box per line, `class_id x_center y_center width height`, geometric
//! values normalized to `[0, 1]`. Emitted files use 6 decimal places and no
//! header.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::TilerError;
use crate::geom::BoxAnnotation;

pub const LABEL_EXTENSION: &str = "txt";

/// A successfully tokenized label line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub annotation: BoxAnnotation,
}

/// Contents of one label file.
///
/// Lines that fail to tokenize are kept as `MalformedBox` errors so the
/// caller can decide whether to skip them or abort.
#[derive(Debug, Default)]
pub struct LabelFile {
    pub path: PathBuf,
    pub records: Vec<LabelRecord>,
    pub malformed: Vec<TilerError>,
}

/// Reads and tokenizes a label file. Blank lines are ignored.
pub fn read_label_file(path: &Path) -> Result<LabelFile, TilerError> {
    let content = fs::read_to_string(path).map_err(TilerError::file_io(path))?;
    Ok(parse_label_str(&content, path))
}

/// Tokenizes label text; `path` is only used for error context.
pub fn parse_label_str(content: &str, path: &Path) -> LabelFile {
    let mut file = LabelFile {
        path: path.to_path_buf(),
        ..Default::default()
    };

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        match parse_label_line(line, path, line_num) {
            Ok(Some(annotation)) => file.records.push(LabelRecord {
                line: line_num,
                annotation,
            }),
            Ok(None) => {}
            Err(err) => file.malformed.push(err),
        }
    }

    file
}

/// Formats a box as one output line (without the newline).
pub fn format_label_line(ann: &BoxAnnotation) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        ann.class_id, ann.cx, ann.cy, ann.w, ann.h
    )
}

/// Writes boxes in the given order, one per line.
pub fn write_label_file(path: &Path, boxes: &[BoxAnnotation]) -> Result<(), TilerError> {
    let file = fs::File::create(path).map_err(TilerError::file_io(path))?;
    let mut writer = BufWriter::new(file);

    for ann in boxes {
        writeln!(writer, "{}", format_label_line(ann)).map_err(TilerError::file_io(path))?;
    }

    writer.flush().map_err(TilerError::file_io(path))
}

fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<BoxAnnotation>, TilerError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() < 5 {
        return Err(TilerError::MalformedBox {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {}", tokens.len()),
        });
    }

    if tokens.len() > 5 {
        return Err(TilerError::MalformedBox {
            path: file_path.to_path_buf(),
            line: line_num,
            message: "segmentation/pose annotations not supported; only `class cx cy w h` boxes can be tiled"
                .to_string(),
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| TilerError::MalformedBox {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(BoxAnnotation::new(class_id, cx, cy, w, h)))
}

/// Fuzz-only entrypoint for single-line label parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), TilerError> {
    if let Some(ann) = parse_label_line(input, Path::new("<fuzz>"), 1)? {
        let _ = crate::geom::to_absolute(&ann, 640, 480);
    }
    Ok(())
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, TilerError> {
    raw.parse::<f64>().map_err(|_| TilerError::MalformedBox {
        path: file_path.to_path_buf(),
        line: line_num,
        message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
    })
}

//! Run summaries for the tile and split commands.
//!
//! Reports print as text via `Display` and as JSON via `Serialize`.

use serde::Serialize;
use std::fmt;

/// Summary of a `tile` run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TilingReport {
    pub source: String,
    pub target: String,
    pub tile_size: u32,
    pub images: ImageCounts,
    pub tiles: TileCounts,
    pub boxes: BoxCounts,
    pub split: SplitCounts,
    pub issues: Vec<TilingIssue>,
}

impl TilingReport {
    pub fn new(source: impl Into<String>, target: impl Into<String>, tile_size: u32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            tile_size,
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: TilingIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (skipped records or images).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == TilingSeverity::Warning)
            .count()
    }

    /// Count of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == TilingSeverity::Info)
            .count()
    }

    /// True if nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.images.skipped == 0 && self.boxes.rejected == 0
    }
}

impl fmt::Display for TilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Tiled {} -> {} ({}px tiles)",
            self.source, self.target, self.tile_size
        )?;
        writeln!(
            f,
            "  images: {} found, {} processed, {} skipped",
            self.images.found, self.images.processed, self.images.skipped
        )?;
        writeln!(
            f,
            "  tiles: {} with boxes, {} without boxes saved, {} discarded",
            self.tiles.positive, self.tiles.negative, self.tiles.discarded
        )?;
        writeln!(
            f,
            "  boxes: {} read, {} skipped, {} written to tiles",
            self.boxes.read, self.boxes.rejected, self.boxes.emitted
        )?;
        writeln!(f, "  {}", self.split)?;

        write_issues(f, &self.issues, self.warning_count(), self.info_count())
    }
}

/// Summary of a `split` run over an already tiled directory.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitReport {
    pub target: String,
    pub split: SplitCounts,
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Split {}", self.target)?;
        writeln!(f, "  {}", self.split)
    }
}

fn write_issues(
    f: &mut fmt::Formatter<'_>,
    issues: &[TilingIssue],
    warnings: usize,
    infos: usize,
) -> fmt::Result {
    if warnings > 0 {
        writeln!(f)?;
        writeln!(f, "Warnings ({}):", warnings)?;
        for issue in issues
            .iter()
            .filter(|i| i.severity == TilingSeverity::Warning)
        {
            writeln!(f, "  - {}", issue.message)?;
        }
    }

    if infos > 0 {
        writeln!(f)?;
        writeln!(f, "Notes ({}):", infos)?;
        for issue in issues.iter().filter(|i| i.severity == TilingSeverity::Info) {
            writeln!(f, "  - {}", issue.message)?;
        }
    }

    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageCounts {
    pub found: usize,
    pub processed: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TileCounts {
    /// Tiles with at least one box, saved with a label file.
    pub positive: usize,
    /// Tiles without boxes saved to the negative directory.
    pub negative: usize,
    /// Tiles without boxes that were not written anywhere.
    pub discarded: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BoxCounts {
    pub read: usize,
    pub rejected: usize,
    /// Clipped label lines written across all tiles.
    pub emitted: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub train: usize,
    pub test: usize,
}

impl fmt::Display for SplitCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "split: {} train, {} test", self.train, self.test)
    }
}

/// A single note or warning raised during a run.
#[derive(Clone, Debug, Serialize)]
pub struct TilingIssue {
    pub severity: TilingSeverity,
    pub code: TilingIssueCode,
    pub message: String,
}

impl TilingIssue {
    /// Create a warning-level issue (something was skipped).
    pub fn warning(code: TilingIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: TilingSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue.
    pub fn info(code: TilingIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: TilingSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TilingSeverity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TilingIssueCode {
    /// A label line was skipped.
    MalformedBox,
    /// A source image was skipped after a read or write failure.
    ImageSkipped,
    /// The image header could not be read during preflight.
    ImageHeaderUnreadable,
    /// The image is smaller than one tile and yields no tiles.
    ImageSmallerThanTile,
    /// The image size is not a multiple of the tile size; the trailing strip is dropped.
    RemainderDropped,
    /// No class-names file was found next to the source directory.
    ClassNamesMissing,
    /// The class-names file was copied next to the target directory.
    ClassNamesCopied,
}

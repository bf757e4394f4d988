use std::path::PathBuf;
use thiserror::Error;

/// The main error type for yolotile operations.
#[derive(Debug, Error)]
pub enum TilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to access {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input mismatch in {path}: {message}")]
    InputMismatch { path: PathBuf, message: String },

    #[error("Target directory {path} is not empty")]
    TargetNotEmpty { path: PathBuf },

    #[error("Malformed box in {path} at line {line}: {message}")]
    MalformedBox {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image header {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to serialize report: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

impl TilerError {
    /// Wraps an IO error together with the path it happened on.
    pub(crate) fn file_io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| TilerError::FileIo { path, source }
    }
}

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for framecurate operations.
#[derive(Debug, Error)]
pub enum FramecurateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mask of {height}x{width} has no foreground pixel to bound")]
    EmptyMask { height: usize, width: usize },

    #[error("Mask buffer has {actual} cell(s), expected {expected}")]
    MaskShape { expected: usize, actual: usize },

    #[error("Invalid image size {width}x{height}; both dimensions must be non-zero")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Got {boxes} box(es) but {labels} label id(s); counts must be equal")]
    LengthMismatch { boxes: usize, labels: usize },

    #[error("Malformed YOLO label at {path}:{line}: {message}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("No such file or directory: {path}")]
    MissingFile { path: PathBuf },

    #[error("Failed to write {path} atomically: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {path}: {source}")]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Invalid frame operation parameters: {message}")]
    InvalidFrameParams { message: String },

    #[error("Unexpected frame directory layout at {path}: {message}")]
    FrameLayout { path: PathBuf, message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl FramecurateError {
    /// Maps an IO error on `path` to [`FramecurateError::MissingFile`] when
    /// the path does not resolve, and to [`FramecurateError::Io`] otherwise.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            FramecurateError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            FramecurateError::Io(err)
        }
    }
}

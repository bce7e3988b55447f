//! Parsed label records and read outcomes.

use serde::Serialize;

use super::{LabelId, PixelBox, YoloBox};

/// One parsed line of a YOLO label file, still in normalized space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct YoloLabel {
    /// 1-based line number in the source file.
    pub line: usize,
    pub label: LabelId,
    pub bbox: YoloBox,
}

impl YoloLabel {
    /// Creates a new record.
    pub fn new(line: usize, label: impl Into<LabelId>, bbox: YoloBox) -> Self {
        Self {
            line,
            label: label.into(),
            bbox,
        }
    }
}

/// A label line that was skipped by a lenient read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the source file.
    pub line: usize,
    /// The raw line content, trimmed.
    pub content: String,
    /// Why the line could not be parsed.
    pub message: String,
}

/// Result of a lenient (skip-and-report) label file read.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LabelReadOutcome {
    /// Decoded records in file line order.
    pub labels: Vec<(LabelId, PixelBox)>,
    /// Malformed lines in file line order.
    pub skipped: Vec<SkippedLine>,
}

impl LabelReadOutcome {
    /// Returns true if every non-blank line was decoded.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

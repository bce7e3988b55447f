//! Frame operation report types.
//!
//! Every frame operation returns a [`FrameReport`] describing what it did to
//! the directory, the same way validation returns a `ValidationReport`.

use serde::Serialize;
use std::fmt;

/// A report generated by one frame operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    /// Operation name (`clean`, `convert`, `downsample`, `split`, `join`).
    pub operation: String,
    /// Number of candidate files the operation looked at.
    pub processed: usize,
    /// Files deleted.
    pub deleted: usize,
    /// Files renamed during renumbering.
    pub renamed: usize,
    /// Files converted to another format.
    pub converted: usize,
    /// Files moved between directories.
    pub moved: usize,
    /// Batch directories created or removed.
    pub batches: usize,
    /// Files that were left alone, with the reason.
    pub skipped: Vec<SkippedFile>,
}

impl FrameReport {
    /// Creates an empty report for the named operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    /// Records a skipped file.
    pub fn skip(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedFile {
            file: file.into(),
            reason: reason.into(),
        });
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} file(s) processed", self.operation, self.processed)?;

        let counts = [
            ("deleted", self.deleted),
            ("renamed", self.renamed),
            ("converted", self.converted),
            ("moved", self.moved),
            ("batch directories", self.batches),
        ];
        for (label, count) in counts {
            if count > 0 {
                writeln!(f, "  {}: {}", label, count)?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "  skipped: {}", self.skipped.len())?;
            for skipped in &self.skipped {
                writeln!(f, "    {}: {}", skipped.file, skipped.reason)?;
            }
        }

        Ok(())
    }
}

/// A file an operation did not touch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

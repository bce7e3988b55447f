//! Geometric validation of YOLO label records.
//!
//! Decoding is permissive: out-of-range records decode to odd but usable
//! pixel boxes. This module is the opt-in strict layer on top, checking:
//! - Finite fields
//! - Centers and sizes within `[0, 1]`, non-negative sizes
//! - Boxes that spill past an image edge or have zero area (warnings)
//! - Label ids against an optional class count

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::path::Path;

use crate::error::FramecurateError;
use crate::ir::io_yolo;
use crate::ir::{SkippedLine, YoloLabel};

/// Slack for edge checks; each field is written with six decimals.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, callers should treat warnings as errors.
    pub strict: bool,
    /// Number of classes in the label taxonomy; ids must be below it.
    pub num_classes: Option<u32>,
}

impl ValidateOptions {
    /// Returns true if `report` passes under these options.
    pub fn passes(&self, report: &ValidationReport) -> bool {
        if self.strict {
            report.is_ok_strict()
        } else {
            report.is_ok()
        }
    }
}

/// Validates parsed records of one label file.
///
/// `source` names the file in issue contexts.
pub fn validate_records(
    source: &str,
    rows: &[YoloLabel],
    opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    for row in rows {
        validate_record(source, row, opts, &mut report);
    }

    report
}

/// Turns lines skipped by a lenient read into error-level issues.
pub fn report_skipped_lines(source: &str, skipped: &[SkippedLine]) -> ValidationReport {
    let mut report = ValidationReport::new();

    for line in skipped {
        report.add(ValidationIssue::error(
            IssueCode::MalformedLine,
            format!("'{}': {}", line.content, line.message),
            IssueContext::Line {
                file: source.to_string(),
                line: line.line,
            },
        ));
    }

    report
}

/// Reads and validates one label file.
///
/// Malformed lines are reported as issues rather than failing the read, so
/// a single report covers everything wrong with the file.
pub fn validate_label_file(
    path: &Path,
    opts: &ValidateOptions,
) -> Result<ValidationReport, FramecurateError> {
    let content = io_yolo::read_label_content(path)?;
    let source = path.display().to_string();

    let (rows, skipped) = io_yolo::parse_yolo_str_lenient(&content);

    let mut report = report_skipped_lines(&source, &skipped);
    report.merge(validate_records(&source, &rows, opts));
    report
        .issues
        .sort_by_key(|issue| match &issue.context {
            IssueContext::Line { line, .. } => *line,
        });

    Ok(report)
}

fn validate_record(
    source: &str,
    row: &YoloLabel,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let context = || IssueContext::Line {
        file: source.to_string(),
        line: row.line,
    };
    let bbox = &row.bbox;

    if let Some(num_classes) = opts.num_classes {
        if row.label.as_u32() >= num_classes {
            report.add(ValidationIssue::error(
                IssueCode::LabelOutOfRange,
                format!(
                    "Label id {} is out of range for {} class(es)",
                    row.label, num_classes
                ),
                context(),
            ));
        }
    }

    if !bbox.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::NonFiniteCoordinate,
            format!(
                "Non-finite field in ({}, {}, {}, {})",
                bbox.cx, bbox.cy, bbox.w, bbox.h
            ),
            context(),
        ));
        return;
    }

    let mut geometry_ok = true;

    if !in_unit_range(bbox.cx) || !in_unit_range(bbox.cy) {
        geometry_ok = false;
        report.add(ValidationIssue::error(
            IssueCode::CenterOutOfRange,
            format!("Center ({}, {}) is outside [0, 1]", bbox.cx, bbox.cy),
            context(),
        ));
    }

    if bbox.w < 0.0 || bbox.h < 0.0 {
        geometry_ok = false;
        report.add(ValidationIssue::error(
            IssueCode::NegativeSize,
            format!("Negative size {}x{}", bbox.w, bbox.h),
            context(),
        ));
    } else if bbox.w > 1.0 || bbox.h > 1.0 {
        geometry_ok = false;
        report.add(ValidationIssue::error(
            IssueCode::SizeOutOfRange,
            format!("Size {}x{} exceeds the image", bbox.w, bbox.h),
            context(),
        ));
    } else if bbox.w == 0.0 || bbox.h == 0.0 {
        report.add(ValidationIssue::warning(
            IssueCode::ZeroArea,
            format!("Zero-area box {}x{}", bbox.w, bbox.h),
            context(),
        ));
    }

    if geometry_ok {
        let (left, top, right, bottom) = bbox.edges();
        if left < -EDGE_TOLERANCE
            || top < -EDGE_TOLERANCE
            || right > 1.0 + EDGE_TOLERANCE
            || bottom > 1.0 + EDGE_TOLERANCE
        {
            report.add(ValidationIssue::warning(
                IssueCode::ExtendsPastImage,
                format!(
                    "Box edges ({:.6}, {:.6}, {:.6}, {:.6}) extend past the image",
                    left, top, right, bottom
                ),
                context(),
            ));
        }
    }
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

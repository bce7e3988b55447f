//! YOLO label file encoding and decoding.
//!
//! A label file holds one object per line:
//!
//! ```text
//! <label_id> <x_center> <y_center> <width> <height>
//! ```
//!
//! with the four geometric fields normalized by the image size and written
//! with exactly six decimal places. One file corresponds to one image; the
//! image size is not stored and must be supplied by the caller.
//!
//! Encoding computes real-valued centers, while decoding truncates each
//! pixel edge toward zero. The asymmetry matches label files produced by
//! existing tooling, so a box with odd width or height may come back one
//! pixel off after a round trip. [`decode_bbox_rounded`] is available for
//! new label sets that do not need that compatibility.

use std::fs;
use std::io::Write;
use std::path::Path;

use super::model::{LabelReadOutcome, SkippedLine, YoloLabel};
use super::{LabelId, PixelBox, YoloBox};
use crate::error::FramecurateError;
use crate::validation::{self, ValidateOptions};

/// File extension used for label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Options for reading label files.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Reject the file if any record fails geometric validation.
    ///
    /// Off by default: slightly out-of-range records are common in label
    /// files exported by annotation tools and decode without trouble.
    pub strict: bool,
}

/// Normalizes a pixel box against the image size.
#[inline]
pub fn encode_bbox(bbox: &PixelBox, image_width: u32, image_height: u32) -> YoloBox {
    bbox.to_yolo(image_width, image_height)
}

/// Formats one label line, without the trailing newline.
pub fn format_label_line(label: LabelId, yolo: &YoloBox) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        label, yolo.cx, yolo.cy, yolo.w, yolo.h
    )
}

/// Encodes pixel boxes and their label ids as YOLO label file content.
///
/// Records keep the order of the input slices. Each line ends with `\n`.
///
/// # Errors
///
/// - [`FramecurateError::InvalidImageSize`] if either image dimension is zero.
/// - [`FramecurateError::LengthMismatch`] if `boxes` and `label_ids` differ
///   in length.
pub fn to_yolo_string(
    image_width: u32,
    image_height: u32,
    boxes: &[PixelBox],
    label_ids: &[LabelId],
) -> Result<String, FramecurateError> {
    ensure_image_size(image_width, image_height)?;
    if boxes.len() != label_ids.len() {
        return Err(FramecurateError::LengthMismatch {
            boxes: boxes.len(),
            labels: label_ids.len(),
        });
    }

    let mut out = String::new();
    for (bbox, &label) in boxes.iter().zip(label_ids) {
        let yolo = encode_bbox(bbox, image_width, image_height);
        out.push_str(&format_label_line(label, &yolo));
        out.push('\n');
    }

    Ok(out)
}

/// Writes pixel boxes and their label ids to a YOLO label file.
///
/// The file is replaced in full, never appended to. Content is written to a
/// temporary file next to `output` and renamed over it, so on any error the
/// previous file (if one exists) is left untouched.
///
/// # Errors
///
/// - [`FramecurateError::InvalidImageSize`] or
///   [`FramecurateError::LengthMismatch`] as for [`to_yolo_string`];
///   nothing is written.
/// - [`FramecurateError::MissingFile`] if the parent directory of `output`
///   does not exist.
pub fn save_bboxes_to_yolo(
    image_width: u32,
    image_height: u32,
    boxes: &[PixelBox],
    label_ids: &[LabelId],
    output: &Path,
) -> Result<(), FramecurateError> {
    let content = to_yolo_string(image_width, image_height, boxes, label_ids)?;
    write_atomically(output, content.as_bytes())
}

/// Converts a normalized box back to pixel space, truncating toward zero.
///
/// Inputs outside `[0, 1]` or negative sizes are accepted and produce
/// correspondingly odd boxes.
#[inline]
pub fn decode_bbox(yolo: &YoloBox, image_width: u32, image_height: u32) -> PixelBox {
    yolo.to_pixel(image_width, image_height)
}

/// Converts a normalized box back to pixel space, rounding to nearest.
///
/// Not compatible with boxes decoded by [`decode_bbox`]; use only for
/// label sets that have never been decoded by truncation.
#[inline]
pub fn decode_bbox_rounded(yolo: &YoloBox, image_width: u32, image_height: u32) -> PixelBox {
    yolo.to_pixel_rounded(image_width, image_height)
}

/// Decodes parsed records into `(label, pixel box)` pairs, preserving order.
pub fn decode_labels(
    rows: &[YoloLabel],
    image_width: u32,
    image_height: u32,
) -> Vec<(LabelId, PixelBox)> {
    rows.iter()
        .map(|row| (row.label, decode_bbox(&row.bbox, image_width, image_height)))
        .collect()
}

/// Reads a label file and decodes every record to pixel space.
///
/// Records come back in file line order. Blank lines are ignored.
///
/// # Errors
///
/// - [`FramecurateError::MissingFile`] if `path` does not exist.
/// - [`FramecurateError::InvalidImageSize`] if either image dimension is zero.
/// - [`FramecurateError::MalformedLine`] on the first line that does not
///   hold exactly five tokens, an integer label and four real numbers. The
///   whole read fails; see [`read_labels_lenient`] to skip such lines.
///   Bytes that are not valid UTF-8 make their line malformed.
pub fn read_labels(
    path: &Path,
    image_width: u32,
    image_height: u32,
) -> Result<Vec<(LabelId, PixelBox)>, FramecurateError> {
    read_labels_with(path, image_width, image_height, &ReadOptions::default())
}

/// Like [`read_labels`], with explicit [`ReadOptions`].
///
/// In strict mode any validation error fails the read with
/// [`FramecurateError::ValidationFailed`], carrying the full report.
pub fn read_labels_with(
    path: &Path,
    image_width: u32,
    image_height: u32,
    opts: &ReadOptions,
) -> Result<Vec<(LabelId, PixelBox)>, FramecurateError> {
    ensure_image_size(image_width, image_height)?;
    let rows = read_yolo_file(path)?;

    if opts.strict {
        ensure_valid(&path.display().to_string(), &rows)?;
    }

    Ok(decode_labels(&rows, image_width, image_height))
}

/// Reads a label file, skipping malformed lines instead of failing.
///
/// Every skipped line is reported in [`LabelReadOutcome::skipped`]; nothing
/// is dropped silently.
pub fn read_labels_lenient(
    path: &Path,
    image_width: u32,
    image_height: u32,
) -> Result<LabelReadOutcome, FramecurateError> {
    ensure_image_size(image_width, image_height)?;
    let content = read_label_content(path)?;
    let (rows, skipped) = parse_yolo_str_lenient(&content);

    Ok(LabelReadOutcome {
        labels: decode_labels(&rows, image_width, image_height),
        skipped,
    })
}

/// Decodes in-memory label file content.
pub fn from_yolo_str(
    content: &str,
    image_width: u32,
    image_height: u32,
) -> Result<Vec<(LabelId, PixelBox)>, FramecurateError> {
    ensure_image_size(image_width, image_height)?;
    let rows = parse_yolo_str(content, Path::new("<string>"))?;
    Ok(decode_labels(&rows, image_width, image_height))
}

/// Reads a label file into normalized records without decoding them.
pub fn read_yolo_file(path: &Path) -> Result<Vec<YoloLabel>, FramecurateError> {
    let content = read_label_content(path)?;
    parse_yolo_str(&content, path)
}

/// Parses label file content into normalized records.
///
/// `source` is only used for error messages.
pub fn parse_yolo_str(content: &str, source: &Path) -> Result<Vec<YoloLabel>, FramecurateError> {
    let mut rows = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        if let Some(row) = parse_label_line(line, source, line_num)? {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Parses label file content, collecting malformed lines instead of failing.
pub fn parse_yolo_str_lenient(content: &str) -> (Vec<YoloLabel>, Vec<SkippedLine>) {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        match parse_label_tokens(line) {
            Ok(Some((label, bbox))) => rows.push(YoloLabel::new(line_num, label, bbox)),
            Ok(None) => {}
            Err(message) => skipped.push(SkippedLine {
                line: line_num,
                content: line.trim().to_string(),
                message,
            }),
        }
    }

    (rows, skipped)
}

/// Reads `(width, height)` from an image header without decoding pixels.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), FramecurateError> {
    let size = imagesize::size(path).map_err(|source| match source {
        imagesize::ImageError::IoError(err) => FramecurateError::from_io(path, err),
        source => FramecurateError::ImageDimensionRead {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| FramecurateError::FrameLayout {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| FramecurateError::FrameLayout {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}

/// Reads a label file as text. Invalid UTF-8 becomes U+FFFD, which no
/// token parser accepts, so the affected line is reported as malformed.
pub(crate) fn read_label_content(path: &Path) -> Result<String, FramecurateError> {
    let bytes = fs::read(path).map_err(|err| FramecurateError::from_io(path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn ensure_image_size(image_width: u32, image_height: u32) -> Result<(), FramecurateError> {
    if image_width == 0 || image_height == 0 {
        return Err(FramecurateError::InvalidImageSize {
            width: image_width,
            height: image_height,
        });
    }
    Ok(())
}

fn ensure_valid(source: &str, rows: &[YoloLabel]) -> Result<(), FramecurateError> {
    let report = validation::validate_records(source, rows, &ValidateOptions::default());
    if report.error_count() > 0 {
        return Err(FramecurateError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        });
    }
    Ok(())
}

/// Writes `contents` to a temporary file next to `path` and renames it over
/// `path`.
///
/// A replaced file keeps its permissions. A new file gets the same mode
/// `File::create` would give it.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), FramecurateError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let mut temp = builder
        .tempfile_in(parent)
        .map_err(|err| FramecurateError::from_io(parent, err))?;
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(FramecurateError::Io)?;
    }
    temp.write_all(contents).map_err(FramecurateError::Io)?;
    temp.as_file().sync_all().map_err(FramecurateError::Io)?;

    temp.persist(path)
        .map_err(|err| FramecurateError::AtomicWrite {
            path: path.to_path_buf(),
            source: err.error,
        })?;

    Ok(())
}

fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<YoloLabel>, FramecurateError> {
    match parse_label_tokens(line) {
        Ok(parsed) => Ok(parsed.map(|(label, bbox)| YoloLabel::new(line_num, label, bbox))),
        Err(message) => Err(FramecurateError::MalformedLine {
            path: file_path.to_path_buf(),
            line: line_num,
            message,
        }),
    }
}

fn parse_label_tokens(line: &str) -> Result<Option<(LabelId, YoloBox)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() < 5 {
        return Err(format!("expected 5 tokens, found {}", tokens.len()));
    }

    if tokens.len() > 5 {
        return Err(
            "expected 5 tokens, found more; segmentation/pose rows are not supported".to_string(),
        );
    }

    let label = tokens[0].parse::<u32>().map_err(|_| {
        format!(
            "invalid label id '{}'; expected non-negative integer",
            tokens[0]
        )
    })?;

    let cx = parse_f64_token(tokens[1], "x_center")?;
    let cy = parse_f64_token(tokens[2], "y_center")?;
    let w = parse_f64_token(tokens[3], "width")?;
    let h = parse_f64_token(tokens[4], "height")?;

    Ok(Some((LabelId::new(label), YoloBox::new(cx, cy, w, h))))
}

/// Fuzz-only entrypoint for YOLO single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<Option<YoloLabel>, FramecurateError> {
    parse_label_line(input, Path::new("<fuzz>"), 1)
}

fn parse_f64_token(raw: &str, field_name: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("invalid {field_name} '{raw}'; expected floating-point number"))
}

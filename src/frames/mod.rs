//! Frame directory curation.
//!
//! These operations prepare a directory of sequentially numbered video
//! frames for annotation: drop black frames, renumber, convert PNG to JPEG,
//! thin the sequence out, and split it into batch subdirectories (or join
//! the batches back together).
//!
//! All operations act on one flat directory and never recurse. Frames are
//! ordered by file name, and renumbered frames are named `000.png`,
//! `001.png`, and so on, with the padding widened as needed so names keep
//! sorting in frame order.

mod report;

pub use report::{FrameReport, SkippedFile};

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::FramecurateError;
use crate::ir::io_yolo::write_atomically;

pub const PNG_EXTENSION: &str = "png";
pub const JPG_EXTENSION: &str = "jpg";
pub const BATCH_PREFIX: &str = "batch_";
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

const MIN_NUMBER_WIDTH: usize = 3;

/// Returns true if the image is entirely black in grayscale.
///
/// An image that cannot be decoded counts as empty.
pub fn is_image_empty(path: &Path) -> bool {
    match image::open(path) {
        Ok(image) => image.to_luma8().pixels().all(|pixel| pixel.0[0] == 0),
        Err(err) => {
            warn!("Unreadable image {} treated as empty: {}", path.display(), err);
            true
        }
    }
}

/// Deletes empty PNG frames and renumbers the rest from `000.png`.
pub fn clean_and_rename(dir: &Path) -> Result<FrameReport, FramecurateError> {
    ensure_dir(dir)?;
    let mut report = FrameReport::new("clean");

    let images = collect_files(dir, PNG_EXTENSION)?;
    report.processed = images.len();

    let empty: Vec<bool> = images.par_iter().map(|path| is_image_empty(path)).collect();
    for (path, is_empty) in images.iter().zip(empty) {
        if is_empty {
            fs::remove_file(path).map_err(|err| FramecurateError::from_io(path, err))?;
            info!("Deleted empty image: {}", display_name(path));
            report.deleted += 1;
        }
    }

    let remaining = collect_files(dir, PNG_EXTENSION)?;
    report.renamed = renumber(dir, &remaining, PNG_EXTENSION)?;

    Ok(report)
}

/// Re-encodes every PNG frame as a JPEG with the same stem, then removes
/// the PNG.
///
/// Files are converted in parallel. Each JPEG is written through a temporary
/// file, so a failed encode leaves nothing behind. Frames that cannot be
/// decoded, or whose `<stem>.jpg` already exists, are left in place and
/// listed in [`FrameReport::skipped`].
pub fn convert_png_to_jpg(dir: &Path, quality: u8) -> Result<FrameReport, FramecurateError> {
    if !(1..=100).contains(&quality) {
        return Err(FramecurateError::InvalidFrameParams {
            message: format!("JPEG quality must be in 1..=100, got {quality}"),
        });
    }

    ensure_dir(dir)?;
    let mut report = FrameReport::new("convert");

    let images = collect_files(dir, PNG_EXTENSION)?;
    report.processed = images.len();

    let outcomes: Vec<Result<ConvertOutcome, FramecurateError>> = images
        .par_iter()
        .map(|path| convert_one(path, quality))
        .collect();

    for (path, outcome) in images.iter().zip(outcomes) {
        match outcome? {
            ConvertOutcome::Converted => report.converted += 1,
            ConvertOutcome::Skipped(reason) => report.skip(display_name(path), reason),
        }
    }

    info!("Converted {} PNG images to JPG format", report.converted);
    Ok(report)
}

/// Keeps every `fraction`-th JPEG frame (starting with the first), deletes
/// the rest and renumbers the survivors from `000.jpg`.
pub fn downsample(dir: &Path, fraction: usize) -> Result<FrameReport, FramecurateError> {
    if fraction == 0 {
        return Err(FramecurateError::InvalidFrameParams {
            message: "downsample fraction must be at least 1".to_string(),
        });
    }

    ensure_dir(dir)?;
    let mut report = FrameReport::new("downsample");

    let images = collect_files(dir, JPG_EXTENSION)?;
    report.processed = images.len();

    for (idx, path) in images.iter().enumerate() {
        if idx % fraction != 0 {
            fs::remove_file(path).map_err(|err| FramecurateError::from_io(path, err))?;
            debug!("Deleted {}", display_name(path));
            report.deleted += 1;
        }
    }

    let remaining = collect_files(dir, JPG_EXTENSION)?;
    report.renamed = renumber(dir, &remaining, JPG_EXTENSION)?;

    info!("Deleted images with indices not divisible by {}", fraction);
    info!("Number of remaining images: {}", remaining.len());
    Ok(report)
}

/// Moves the JPEG frames into `batch_0 .. batch_{n-1}` subdirectories.
///
/// Each batch receives `count / num_batches` consecutive frames (at least
/// one); the remainder goes to the last batch. Batches beyond the number of
/// frames stay empty.
pub fn split_batches(dir: &Path, num_batches: usize) -> Result<FrameReport, FramecurateError> {
    if num_batches == 0 {
        return Err(FramecurateError::InvalidFrameParams {
            message: "number of batches must be at least 1".to_string(),
        });
    }

    ensure_dir(dir)?;
    let mut report = FrameReport::new("split");

    let images = collect_files(dir, JPG_EXTENSION)?;
    report.processed = images.len();
    let per_batch = (images.len() / num_batches).max(1);

    let mut moves = Vec::with_capacity(images.len());
    for (idx, path) in images.iter().enumerate() {
        let batch_idx = (idx / per_batch).min(num_batches - 1);
        let target = batch_dir(dir, batch_idx).join(require_file_name(path)?);
        if target.exists() {
            return Err(FramecurateError::FrameLayout {
                path: target,
                message: "a file with this name is already in the batch".to_string(),
            });
        }
        moves.push((path, target));
    }

    for idx in 0..num_batches {
        let batch = batch_dir(dir, idx);
        fs::create_dir_all(&batch).map_err(FramecurateError::Io)?;
        info!("Created batch directory: {}", batch.display());
    }
    report.batches = num_batches;

    for (from, to) in moves {
        fs::rename(from, &to).map_err(|err| FramecurateError::from_io(from, err))?;
        report.moved += 1;
    }

    info!("Moved images to {} batch directories", num_batches);
    info!("Number of images per batch: {}", per_batch);
    Ok(report)
}

/// Moves every file from the `batch_*` subdirectories back into `dir` and
/// removes the emptied batch directories.
///
/// All moves are checked before any file is touched: a file name that
/// appears twice, or already exists in `dir`, fails the whole join.
pub fn join_batches(dir: &Path) -> Result<FrameReport, FramecurateError> {
    ensure_dir(dir)?;
    let mut report = FrameReport::new("join");

    let batches = collect_batch_dirs(dir)?;

    let mut seen = HashSet::new();
    let mut moves = Vec::new();
    for batch in &batches {
        for entry in WalkDir::new(batch).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| walk_error(batch, source))?;
            if entry.file_type().is_dir() {
                return Err(FramecurateError::FrameLayout {
                    path: entry.into_path(),
                    message: "batch directories must not contain subdirectories".to_string(),
                });
            }

            let name = entry.file_name().to_os_string();
            let target = dir.join(&name);
            if target.exists() || !seen.insert(name) {
                return Err(FramecurateError::FrameLayout {
                    path: entry.into_path(),
                    message: format!("'{}' would overwrite another frame", target.display()),
                });
            }
            moves.push((entry.into_path(), target));
        }
    }
    report.processed = moves.len();

    for (from, to) in &moves {
        fs::rename(from, to).map_err(|err| FramecurateError::from_io(from, err))?;
        report.moved += 1;
    }

    for batch in &batches {
        fs::remove_dir(batch).map_err(|err| FramecurateError::from_io(batch, err))?;
        info!("Removed batch directory: {}", batch.display());
        report.batches += 1;
    }

    Ok(report)
}

enum ConvertOutcome {
    Converted,
    Skipped(String),
}

fn convert_one(path: &Path, quality: u8) -> Result<ConvertOutcome, FramecurateError> {
    let jpg_path = path.with_extension(JPG_EXTENSION);
    if jpg_path.exists() {
        warn!("Not overwriting existing {}", display_name(&jpg_path));
        return Ok(ConvertOutcome::Skipped(format!(
            "{} already exists",
            display_name(&jpg_path)
        )));
    }

    let image = match image::open(path) {
        Ok(image) => image,
        Err(err) => {
            warn!("Failed to read image: {}", display_name(path));
            return Ok(ConvertOutcome::Skipped(err.to_string()));
        }
    };

    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|source| FramecurateError::ImageEncode {
            path: jpg_path.clone(),
            source,
        })?;
    write_atomically(&jpg_path, &encoded)?;

    fs::remove_file(path).map_err(|err| FramecurateError::from_io(path, err))?;
    debug!(
        "Converted {} to {}",
        display_name(path),
        display_name(&jpg_path)
    );

    Ok(ConvertOutcome::Converted)
}

/// Renames `files` (already in frame order) to `000.<ext>`, `001.<ext>`, ...
///
/// Files are first moved to staging names and only then to their final
/// names, so no frame can be overwritten by another frame's new name.
fn renumber(dir: &Path, files: &[PathBuf], extension: &str) -> Result<usize, FramecurateError> {
    let width = number_width(files.len());

    let mut staged = Vec::new();
    for (idx, path) in files.iter().enumerate() {
        let target = dir.join(format!("{:0width$}.{}", idx, extension, width = width));
        if *path == target {
            continue;
        }

        let staging = dir.join(format!(".framecurate-renumber-{idx}.tmp"));
        fs::rename(path, &staging).map_err(|err| FramecurateError::from_io(path, err))?;
        staged.push((path, staging, target));
    }

    for (original, staging, target) in &staged {
        fs::rename(staging, target).map_err(|err| FramecurateError::from_io(staging, err))?;
        info!(
            "Renamed {} to {}",
            display_name(original),
            display_name(target)
        );
    }

    Ok(staged.len())
}

fn number_width(count: usize) -> usize {
    count
        .saturating_sub(1)
        .to_string()
        .len()
        .max(MIN_NUMBER_WIDTH)
}

fn batch_dir(dir: &Path, idx: usize) -> PathBuf {
    dir.join(format!("{BATCH_PREFIX}{idx}"))
}

fn ensure_dir(dir: &Path) -> Result<(), FramecurateError> {
    if dir.is_dir() {
        Ok(())
    } else if dir.exists() {
        Err(FramecurateError::FrameLayout {
            path: dir.to_path_buf(),
            message: "expected a directory of frames".to_string(),
        })
    } else {
        Err(FramecurateError::MissingFile {
            path: dir.to_path_buf(),
        })
    }
}

/// Lists regular files directly inside `dir` with the given extension,
/// sorted by file name.
fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FramecurateError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| walk_error(dir, source))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }

    files.sort_by_cached_key(|path| display_name(path));
    Ok(files)
}

/// Lists `batch_<n>` subdirectories of `dir`, ordered by batch number.
fn collect_batch_dirs(dir: &Path) -> Result<Vec<PathBuf>, FramecurateError> {
    let mut batches = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| walk_error(dir, source))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let index = entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_prefix(BATCH_PREFIX))
            .and_then(|suffix| suffix.parse::<usize>().ok());
        if let Some(index) = index {
            batches.push((index, entry.into_path()));
        }
    }

    batches.sort();
    Ok(batches.into_iter().map(|(_, path)| path).collect())
}

fn has_extension(path: &Path, allowed: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(allowed))
        .unwrap_or(false)
}

fn require_file_name(path: &Path) -> Result<&OsStr, FramecurateError> {
    path.file_name()
        .ok_or_else(|| FramecurateError::FrameLayout {
            path: path.to_path_buf(),
            message: "path has no file name".to_string(),
        })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn walk_error(dir: &Path, source: walkdir::Error) -> FramecurateError {
    FramecurateError::FrameLayout {
        path: dir.to_path_buf(),
        message: format!("failed while listing directory: {source}"),
    }
}

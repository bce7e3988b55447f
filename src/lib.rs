//! Framecurate: curate video-frame captures into YOLO-ready labeling batches.
//!
//! Framecurate prepares directories of sequentially numbered frames for
//! annotation (pruning, renumbering, conversion, downsampling, batching)
//! and converts object boxes between pixel space and the normalized YOLO
//! label format.
//!
//! # Modules
//!
//! - [`ir`]: Pixel and normalized boxes, masks, and the YOLO label codec
//! - [`validation`]: Opt-in geometric validation of label records
//! - [`frames`]: Frame directory operations
//! - [`error`]: Error types for framecurate operations

pub mod error;
pub mod frames;
pub mod ir;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

pub use error::FramecurateError;
pub use ir::io_yolo::{decode_bbox, read_labels, save_bboxes_to_yolo};
pub use ir::{bounding_box_of, LabelId, Mask, PixelBox, YoloBox};

/// The framecurate CLI application.
#[derive(Parser)]
#[command(name = "framecurate")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the bounding box of each mask image.
    Bbox(BboxArgs),
    /// Write a YOLO label file from masks or pixel boxes.
    Encode(EncodeArgs),
    /// Decode a YOLO label file to pixel boxes.
    Decode(DecodeArgs),
    /// Validate YOLO label files.
    Check(CheckArgs),
    /// Delete empty PNG frames and renumber the rest.
    Clean(FrameDirArgs),
    /// Convert PNG frames to JPEG.
    Convert(ConvertArgs),
    /// Keep every Nth JPEG frame and renumber.
    Downsample(DownsampleArgs),
    /// Split JPEG frames into batch_N subdirectories.
    Split(SplitArgs),
    /// Move frames from batch_N subdirectories back into the directory.
    Join(FrameDirArgs),
}

/// Report output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Image size, given explicitly or read from an image header.
#[derive(clap::Args)]
struct ImageSizeArgs {
    /// Image width in pixels.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Image height in pixels.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Read the image size from this image file instead.
    #[arg(long, conflicts_with_all = ["width", "height"])]
    image: Option<PathBuf>,
}

impl ImageSizeArgs {
    fn resolve(&self) -> Result<Option<(u32, u32)>, FramecurateError> {
        let size = match (&self.image, self.width, self.height) {
            (Some(image), _, _) => Some(ir::io_yolo::image_dimensions(image)?),
            (None, Some(width), Some(height)) => Some((width, height)),
            _ => None,
        };

        if let Some((width, height)) = size {
            if width == 0 || height == 0 {
                return Err(FramecurateError::InvalidImageSize { width, height });
            }
        }

        Ok(size)
    }

    fn require(&self) -> Result<(u32, u32), FramecurateError> {
        self.resolve()?
            .ok_or_else(|| FramecurateError::InvalidFrameParams {
                message: "image size required: pass --width and --height, or --image".to_string(),
            })
    }
}

/// Arguments for the bbox subcommand.
#[derive(clap::Args)]
struct BboxArgs {
    /// Mask images; any non-zero pixel is foreground.
    #[arg(required = true)]
    masks: Vec<PathBuf>,

    /// Output format ('text' or 'json').
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Arguments for the encode subcommand.
#[derive(clap::Args)]
struct EncodeArgs {
    #[command(flatten)]
    size: ImageSizeArgs,

    /// Mask image to bound (repeatable, paired in order with --label).
    #[arg(long = "mask", conflicts_with = "boxes")]
    masks: Vec<PathBuf>,

    /// Pixel box as xmin,ymin,xmax,ymax (repeatable, paired with --label).
    #[arg(long = "box", allow_hyphen_values = true)]
    boxes: Vec<PixelBox>,

    /// Label id for the corresponding mask or box (repeatable).
    #[arg(long = "label")]
    labels: Vec<u32>,

    /// Label file to write (replaced if it exists).
    #[arg(short, long)]
    output: PathBuf,
}

/// Arguments for the decode subcommand.
#[derive(clap::Args)]
struct DecodeArgs {
    /// YOLO label file.
    input: PathBuf,

    #[command(flatten)]
    size: ImageSizeArgs,

    /// Reject records outside the image (errors only).
    #[arg(long)]
    strict: bool,

    /// Skip malformed lines and report them instead of failing.
    #[arg(long, conflicts_with = "strict")]
    lenient: bool,

    /// Output format ('text' or 'json').
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// A label file, or a directory searched recursively for *.txt files.
    input: PathBuf,

    /// Number of classes; label ids must be below it.
    #[arg(long)]
    num_classes: Option<u32>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format ('text' or 'json').
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Arguments shared by frame directory subcommands.
#[derive(clap::Args)]
struct FrameDirArgs {
    /// Frame directory.
    #[arg(env = "FRAMECURATE_DIR")]
    dir: PathBuf,

    /// Output format ('text' or 'json').
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    #[command(flatten)]
    frames: FrameDirArgs,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = frames::DEFAULT_JPEG_QUALITY)]
    quality: u8,
}

/// Arguments for the downsample subcommand.
#[derive(clap::Args)]
struct DownsampleArgs {
    #[command(flatten)]
    frames: FrameDirArgs,

    /// Keep one frame out of every N.
    #[arg(long)]
    fraction: usize,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    #[command(flatten)]
    frames: FrameDirArgs,

    /// Number of batch directories to create.
    #[arg(long)]
    batches: usize,
}

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// The level defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run the framecurate CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), FramecurateError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Bbox(args)) => run_bbox(args),
        Some(Commands::Encode(args)) => run_encode(args),
        Some(Commands::Decode(args)) => run_decode(args),
        Some(Commands::Check(args)) => run_check(args),
        Some(Commands::Clean(args)) => {
            emit_frame_report(&frames::clean_and_rename(&args.dir)?, args.output)
        }
        Some(Commands::Convert(args)) => emit_frame_report(
            &frames::convert_png_to_jpg(&args.frames.dir, args.quality)?,
            args.frames.output,
        ),
        Some(Commands::Downsample(args)) => emit_frame_report(
            &frames::downsample(&args.frames.dir, args.fraction)?,
            args.frames.output,
        ),
        Some(Commands::Split(args)) => emit_frame_report(
            &frames::split_batches(&args.frames.dir, args.batches)?,
            args.frames.output,
        ),
        Some(Commands::Join(args)) => {
            emit_frame_report(&frames::join_batches(&args.dir)?, args.output)
        }
        None => {
            println!("framecurate {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Curate video-frame captures into YOLO-ready labeling batches.");
            println!();
            println!("Run 'framecurate --help' for usage information.");
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct MaskBox {
    mask: String,
    width: usize,
    height: usize,
    bbox: PixelBox,
}

/// Execute the bbox subcommand.
fn run_bbox(args: BboxArgs) -> Result<(), FramecurateError> {
    let mut rows = Vec::with_capacity(args.masks.len());
    for path in &args.masks {
        let mask = Mask::from_image_path(path)?;
        rows.push(MaskBox {
            mask: path.display().to_string(),
            width: mask.width(),
            height: mask.height(),
            bbox: bounding_box_of(&mask)?,
        });
    }

    match args.output {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => {
            for row in &rows {
                println!("{} {}", row.mask, row.bbox);
            }
        }
    }

    Ok(())
}

/// Execute the encode subcommand.
fn run_encode(args: EncodeArgs) -> Result<(), FramecurateError> {
    let mut size = args.size.resolve()?;

    let boxes = if args.masks.is_empty() {
        args.boxes
    } else {
        let mut boxes = Vec::with_capacity(args.masks.len());
        for path in &args.masks {
            let mask = Mask::from_image_path(path)?;
            // Masks cover the whole image, so they can stand in for its size.
            if size.is_none() {
                size = Some((to_u32(mask.width(), path)?, to_u32(mask.height(), path)?));
            }
            boxes.push(bounding_box_of(&mask)?);
        }
        boxes
    };

    let (width, height) = match size {
        Some(size) => size,
        None => args.size.require()?,
    };
    let labels: Vec<LabelId> = args.labels.into_iter().map(LabelId::new).collect();

    save_bboxes_to_yolo(width, height, &boxes, &labels, &args.output)?;
    info!(
        "Wrote {} label(s) to {}",
        boxes.len(),
        args.output.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct DecodedLabel {
    label: LabelId,
    bbox: PixelBox,
}

#[derive(Serialize)]
struct DecodeOutput {
    labels: Vec<DecodedLabel>,
    skipped: Vec<ir::SkippedLine>,
}

/// Execute the decode subcommand.
fn run_decode(args: DecodeArgs) -> Result<(), FramecurateError> {
    let (width, height) = args.size.require()?;

    let outcome = if args.lenient {
        ir::io_yolo::read_labels_lenient(&args.input, width, height)?
    } else {
        let opts = ir::io_yolo::ReadOptions {
            strict: args.strict,
        };
        ir::LabelReadOutcome {
            labels: ir::io_yolo::read_labels_with(&args.input, width, height, &opts)?,
            skipped: Vec::new(),
        }
    };

    for skipped in &outcome.skipped {
        warn!(
            "Skipped malformed line {}:{}: {}",
            args.input.display(),
            skipped.line,
            skipped.message
        );
    }

    match args.output {
        OutputFormat::Json => print_json(&DecodeOutput {
            labels: outcome
                .labels
                .iter()
                .map(|&(label, bbox)| DecodedLabel { label, bbox })
                .collect(),
            skipped: outcome.skipped,
        })?,
        OutputFormat::Text => {
            for (label, bbox) in &outcome.labels {
                println!("{} {}", label, bbox);
            }
        }
    }

    Ok(())
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), FramecurateError> {
    let opts = validation::ValidateOptions {
        strict: args.strict,
        num_classes: args.num_classes,
    };

    let files = collect_label_files(&args.input)?;
    let mut report = validation::ValidationReport::new();
    for file in &files {
        report.merge(validation::validate_label_file(file, &opts)?);
    }
    info!("Checked {} label file(s)", files.len());

    match args.output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "files": files.len(),
            "error_count": report.error_count(),
            "warning_count": report.warning_count(),
            "issues": &report.issues,
        }))?,
        OutputFormat::Text => print!("{}", report),
    }

    if opts.passes(&report) {
        Ok(())
    } else {
        Err(FramecurateError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

fn collect_label_files(input: &Path) -> Result<Vec<PathBuf>, FramecurateError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(FramecurateError::MissingFile {
            path: input.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input).follow_links(true) {
        let entry = entry.map_err(|source| FramecurateError::FrameLayout {
            path: input.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        let is_label = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(ir::io_yolo::LABEL_EXTENSION))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_label {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn emit_frame_report(
    report: &frames::FrameReport,
    output: OutputFormat,
) -> Result<(), FramecurateError> {
    match output {
        OutputFormat::Json => print_json(report),
        OutputFormat::Text => {
            print!("{}", report);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), FramecurateError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| FramecurateError::Io(std::io::Error::other(err)))?;
    println!("{}", json);
    Ok(())
}

fn to_u32(value: usize, path: &Path) -> Result<u32, FramecurateError> {
    u32::try_from(value).map_err(|_| FramecurateError::FrameLayout {
        path: path.to_path_buf(),
        message: format!("mask dimension {value} does not fit in u32"),
    })
}

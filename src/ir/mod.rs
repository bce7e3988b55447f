//! Core data types for frame labels.
//!
//! Two coordinate spaces meet here:
//!
//! 1. **Pixel space**: [`PixelBox`], inclusive integer XYXY bounds as
//!    produced from a segmentation [`Mask`].
//! 2. **Normalized space**: [`YoloBox`], center and size expressed as
//!    fractions of the image width and height, as persisted in YOLO label
//!    files.
//!
//! Keeping them as distinct types means a normalized value can never be
//! passed where pixels are expected. Neither type enforces geometric
//! sanity on construction; range checks live in [`crate::validation`].
//!
//! # Example
//!
//! ```
//! use framecurate::ir::{bounding_box_of, Mask, PixelBox};
//!
//! let mask = Mask::from_rows(vec![
//!     vec![false, false, false],
//!     vec![false, true, true],
//! ])
//! .unwrap();
//!
//! let bbox = bounding_box_of(&mask).unwrap();
//! assert_eq!(bbox, PixelBox::new(1, 1, 2, 1));
//! ```

mod bbox;
mod ids;
pub mod io_yolo;
mod mask;
mod model;

// Re-export core types for convenient access
pub use bbox::{PixelBox, YoloBox};
pub use ids::LabelId;
pub use mask::{bounding_box_of, Mask};
pub use model::{LabelReadOutcome, SkippedLine, YoloLabel};

//! Bounding box types: integer pixel XYXY and normalized YOLO center/size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An axis-aligned pixel bounding box (xmin, ymin, xmax, ymax), inclusive.
///
/// Boxes produced from masks always satisfy `x_min <= x_max` and
/// `y_min <= y_max`. Boxes decoded from label files are not checked, so
/// a slightly broken label file can still be represented and reported on
/// rather than rejected during parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl PixelBox {
    /// Creates a new box from explicit inclusive coordinates.
    #[inline]
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Returns `x_max - x_min`.
    ///
    /// This is the span between the extreme pixel indices, which is what
    /// gets normalized into a YOLO width. May be negative if the box is
    /// malformed.
    #[inline]
    pub fn width(&self) -> i64 {
        self.x_max.saturating_sub(self.x_min)
    }

    /// Returns `y_max - y_min`. May be negative if the box is malformed.
    #[inline]
    pub fn height(&self) -> i64 {
        self.y_max.saturating_sub(self.y_min)
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }

    /// Converts to a normalized YOLO box relative to an image of the given size.
    ///
    /// The center is the real-valued midpoint of the extreme indices; it is
    /// never truncated. Both image dimensions must be non-zero; file-level
    /// encoders check this before calling.
    pub fn to_yolo(&self, image_width: u32, image_height: u32) -> YoloBox {
        let image_width = f64::from(image_width);
        let image_height = f64::from(image_height);

        // Work in f64 so extreme coordinates cannot overflow.
        let (x_min, x_max) = (self.x_min as f64, self.x_max as f64);
        let (y_min, y_max) = (self.y_min as f64, self.y_max as f64);

        YoloBox {
            cx: (x_min + x_max) / 2.0 / image_width,
            cy: (y_min + y_max) / 2.0 / image_height,
            w: (x_max - x_min) / image_width,
            h: (y_max - y_min) / image_height,
        }
    }
}

impl fmt::Display for PixelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// Parses `xmin,ymin,xmax,ymax` (commas or whitespace).
impl FromStr for PixelBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();

        if parts.len() != 4 {
            return Err(format!(
                "expected 4 coordinates 'xmin,ymin,xmax,ymax', found {}",
                parts.len()
            ));
        }

        let mut coords = [0i64; 4];
        for (slot, raw) in coords.iter_mut().zip(&parts) {
            *slot = raw
                .parse::<i64>()
                .map_err(|_| format!("invalid pixel coordinate '{raw}'; expected an integer"))?;
        }

        Ok(PixelBox::new(coords[0], coords[1], coords[2], coords[3]))
    }
}

/// A normalized YOLO box: center and size as fractions of the image size.
///
/// Under correct usage every field lies in `[0, 1]`, but nothing here
/// enforces it. See [`crate::validation`] for range checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YoloBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl YoloBox {
    /// Creates a new normalized box from center and size.
    #[inline]
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    /// Returns true if all four fields are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Returns the normalized edges `(left, top, right, bottom)`.
    #[inline]
    pub fn edges(&self) -> (f64, f64, f64, f64) {
        (
            self.cx - self.w / 2.0,
            self.cy - self.h / 2.0,
            self.cx + self.w / 2.0,
            self.cy + self.h / 2.0,
        )
    }

    /// Converts back to pixel space, truncating each edge toward zero.
    ///
    /// Truncation (not rounding) keeps decoded boxes identical to those
    /// produced by existing label tooling. An odd-sized box therefore may
    /// come back shifted by one pixel relative to the box it was encoded from.
    pub fn to_pixel(&self, image_width: u32, image_height: u32) -> PixelBox {
        let (x_min, y_min, x_max, y_max) = self.pixel_edges(image_width, image_height);
        PixelBox::new(
            x_min as i64,
            y_min as i64,
            x_max as i64,
            y_max as i64,
        )
    }

    /// Converts back to pixel space, rounding each edge to the nearest pixel.
    pub fn to_pixel_rounded(&self, image_width: u32, image_height: u32) -> PixelBox {
        let (x_min, y_min, x_max, y_max) = self.pixel_edges(image_width, image_height);
        PixelBox::new(
            x_min.round() as i64,
            y_min.round() as i64,
            x_max.round() as i64,
            y_max.round() as i64,
        )
    }

    fn pixel_edges(&self, image_width: u32, image_height: u32) -> (f64, f64, f64, f64) {
        let image_width = f64::from(image_width);
        let image_height = f64::from(image_height);

        let x_center = self.cx * image_width;
        let y_center = self.cy * image_height;
        let width = self.w * image_width;
        let height = self.h * image_height;

        (
            x_center - width / 2.0,
            y_center - height / 2.0,
            x_center + width / 2.0,
            y_center + height / 2.0,
        )
    }
}

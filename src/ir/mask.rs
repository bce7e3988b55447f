//! Binary segmentation masks and their bounding boxes.

use std::path::Path;

use image::GrayImage;

use super::PixelBox;
use crate::error::FramecurateError;

/// A 2-D boolean segmentation mask stored row-major.
///
/// `true` marks a foreground pixel. The mask is expected to cover the full
/// image it was extracted from, so its dimensions double as the image size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Mask {
    /// Creates a mask from a row-major buffer of `width * height` cells.
    ///
    /// Dimensions whose product overflows `usize` fail with `MaskShape`.
    pub fn new(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, FramecurateError> {
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if cells.len() != expected {
            return Err(FramecurateError::MaskShape {
                expected,
                actual: cells.len(),
            });
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Creates a mask from a list of rows. All rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, FramecurateError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        let mut cells = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        for row in rows {
            if row.len() != width {
                return Err(FramecurateError::MaskShape {
                    expected: width.saturating_mul(height),
                    actual: cells.len() + row.len(),
                });
            }
            cells.extend(row);
        }

        Self::new(width, height, cells)
    }

    /// Creates a mask from a grayscale image; any non-zero pixel is foreground.
    pub fn from_luma(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            cells: image.pixels().map(|pixel| pixel.0[0] != 0).collect(),
        }
    }

    /// Loads a mask image from disk (PNG or JPEG).
    ///
    /// Other image formats fail with [`FramecurateError::UnsupportedFormat`].
    ///
    /// Color images are converted to luma first, so any channel contributing
    /// a non-zero luma value marks the pixel as foreground.
    pub fn from_image_path(path: &Path) -> Result<Self, FramecurateError> {
        let image = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(err) => FramecurateError::from_io(path, err),
            image::ImageError::Unsupported(err) => {
                FramecurateError::UnsupportedFormat(format!("{}: {}", path.display(), err))
            }
            source => FramecurateError::ImageDecode {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Ok(Self::from_luma(&image.to_luma8()))
    }

    /// Mask width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    fn rows(&self) -> impl Iterator<Item = &[bool]> {
        // chunks_exact panics on a zero chunk size
        self.cells.chunks_exact(self.width.max(1))
    }
}

/// Returns the smallest inclusive pixel box containing every foreground cell.
///
/// Rows and columns are each reduced with a logical OR; the box spans the
/// first and last row and column that contain any foreground.
///
/// # Errors
///
/// [`FramecurateError::EmptyMask`] if the mask has no foreground pixel.
pub fn bounding_box_of(mask: &Mask) -> Result<PixelBox, FramecurateError> {
    let mut occupied_cols = vec![false; mask.width];
    let mut first_row = None;
    let mut last_row = None;

    for (y, row) in mask.rows().enumerate() {
        let mut row_occupied = false;
        for (x, &cell) in row.iter().enumerate() {
            if cell {
                occupied_cols[x] = true;
                row_occupied = true;
            }
        }
        if row_occupied {
            first_row.get_or_insert(y);
            last_row = Some(y);
        }
    }

    let empty = || FramecurateError::EmptyMask {
        height: mask.height,
        width: mask.width,
    };

    let y_min = first_row.ok_or_else(empty)?;
    let y_max = last_row.ok_or_else(empty)?;
    let x_min = occupied_cols.iter().position(|&c| c).ok_or_else(empty)?;
    let x_max = occupied_cols.iter().rposition(|&c| c).ok_or_else(empty)?;

    Ok(PixelBox::new(
        x_min as i64,
        y_min as i64,
        x_max as i64,
        y_max as i64,
    ))
}

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{GrayImage, Luma, RgbImage};

/// Writes a grayscale PNG mask with the given inclusive rectangle set to 255.
pub fn write_mask_png(path: &Path, width: u32, height: u32, rect: (u32, u32, u32, u32)) {
    let (x0, y0, x1, y1) = rect;
    let mut image = GrayImage::new(width, height);
    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x, y, Luma([255]));
        }
    }
    save_gray(path, &image);
}

/// Writes an all-zero grayscale PNG.
pub fn write_blank_png(path: &Path, width: u32, height: u32) {
    save_gray(path, &GrayImage::new(width, height));
}

/// Writes a small RGB frame filled with `value`.
pub fn write_rgb_frame(path: &Path, value: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(4, 4, image::Rgb([value, value, value]))
        .save(path)
        .expect("write rgb frame");
}

/// Lists the file names directly inside `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

fn save_gray(path: &Path, image: &GrayImage) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    image.save(path).expect("write png");
}

//! Shared test utilities for the imgsquash test suite.
//!
//! Synthetic images are generated in memory, so no fixture files are needed.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! let file = png_file("src/images/test1.png", 80, 80);
//! let outputs = Squash::new().transform(file).unwrap();
//! assert_eq!(paths(&outputs), vec!["src/images/test1.png"]);
//! ```

use crate::types::FileObject;
use image::{DynamicImage, ImageEncoder, RgbImage};

// =========================================================================
// Synthetic images
// =========================================================================

/// RGB gradient with plenty of distinct colors.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    }))
}

/// Encoded PNG bytes of [`gradient_image`].
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_image(width, height).to_rgb8();
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encoded JPEG bytes of [`gradient_image`].
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient_image(width, height).to_rgb8();
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

// =========================================================================
// File objects
// =========================================================================

pub fn png_file(path: &str, width: u32, height: u32) -> FileObject {
    FileObject::new(path, png_bytes(width, height))
}

pub fn jpeg_file(path: &str, width: u32, height: u32) -> FileObject {
    FileObject::new(path, jpeg_bytes(width, height))
}

/// Output paths as strings, in emission order.
pub fn paths(files: &[FileObject]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.path.to_string_lossy().into_owned())
        .collect()
}

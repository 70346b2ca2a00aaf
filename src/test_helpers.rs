//! Shared test utilities for the stayhappy-imaging test suite.
//!
//! Synthetic photos with known content so tests can assert where the
//! pipeline frames a crop without shipping fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! // 800x600 mid-gray photo with a checkerboard subject near the right edge
//! let photo = textured_patch_image(800, 600, (700, 200, 90, 200));
//! assert!(is_mid_gray(photo.to_rgb8().get_pixel(10, 10)));
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::path::Path;

/// Uniform background level of the synthetic photos.
pub const MID_GRAY: u8 = 128;

/// Checkerboard cell size inside textured patches.
const CHECKER: u32 = 8;

/// A featureless mid-gray photo. Saliency finds nothing in it.
pub fn flat_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb([MID_GRAY, MID_GRAY, MID_GRAY]),
    ))
}

/// A mid-gray photo with a black/white checkerboard patch at
/// `(x, y, width, height)`. The patch is the only salient region.
pub fn textured_patch_image(
    width: u32,
    height: u32,
    (px, py, pw, ph): (u32, u32, u32, u32),
) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let inside = x >= px && x < px + pw && y >= py && y < py + ph;
        if !inside {
            return Rgb([MID_GRAY, MID_GRAY, MID_GRAY]);
        }
        if ((x - px) / CHECKER + (y - py) / CHECKER) % 2 == 0 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// True if a pixel is close to the synthetic background, allowing for
/// resampling ringing near edges.
pub fn is_mid_gray(pixel: &Rgb<u8>) -> bool {
    pixel
        .0
        .iter()
        .all(|&c| (c as i16 - MID_GRAY as i16).abs() <= 28)
}

/// Encode `image` as PNG at `path`, creating parent directories.
pub fn write_png(path: &Path, image: &DynamicImage) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image.save_with_format(path, ImageFormat::Png).unwrap();
}

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};

/// Solid-color RGB test image.
pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// Test image with a horizontal brightness gradient, useful for stages that
/// need non-uniform statistics (CLAHE, white balancing).
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _y| {
        let v = (x * 255 / width.max(1)) as u8;
        Rgb([v, v / 2, v / 3])
    }))
}

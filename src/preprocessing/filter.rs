use crate::pipeline::{Stage, StageContext};
use anyhow::Result;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::filter::bilateral_filter;

/// Edge-preserving bilateral smoothing.
///
/// The filter itself operates on a single plane, so color input is split
/// into its R/G/B planes, each smoothed independently, then recombined.
pub struct BilateralFilter {
    /// Kernel window size (diameter in pixels)
    pub window: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl BilateralFilter {
    pub fn new(window: u32, sigma_color: f32, sigma_space: f32) -> Self {
        Self {
            window,
            sigma_color,
            sigma_space,
        }
    }
}

impl Default for BilateralFilter {
    fn default() -> Self {
        Self {
            window: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

fn channel_plane(img: &RgbImage, channel: usize) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([img.get_pixel(x, y)[channel]])
    })
}

impl Stage for BilateralFilter {
    fn transform(&self, images: Vec<DynamicImage>, _context: &StageContext) -> Result<Vec<DynamicImage>> {
        let mut result = Vec::with_capacity(images.len());
        for img in images {
            let rgb = img.to_rgb8();
            let planes: Vec<GrayImage> = (0..3)
                .map(|c| {
                    bilateral_filter(
                        &channel_plane(&rgb, c),
                        self.window,
                        self.sigma_color,
                        self.sigma_space,
                    )
                })
                .collect();

            let (width, height) = rgb.dimensions();
            let merged = RgbImage::from_fn(width, height, |x, y| {
                Rgb([
                    planes[0].get_pixel(x, y)[0],
                    planes[1].get_pixel(x, y)[0],
                    planes[2].get_pixel(x, y)[0],
                ])
            });
            result.push(DynamicImage::ImageRgb8(merged));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Bilateral Filtering"
    }
}

use crate::pipeline::{Stage, StageContext};
use anyhow::{Result, ensure};
use image::{DynamicImage, Rgb, RgbImage};

/// White-patch white balancing.
///
/// Scales each channel so that its `percentile`-th value maps to full white,
/// then clips to the displayable range. Percentile 100 is the classic
/// white-patch algorithm (scale by the channel maximum).
pub struct WhiteBalance {
    pub percentile: f32,
}

impl WhiteBalance {
    pub fn new(percentile: f32) -> Self {
        Self { percentile }
    }
}

impl Default for WhiteBalance {
    fn default() -> Self {
        Self { percentile: 100.0 }
    }
}

/// Percentile of a channel from its 256-bin histogram.
fn channel_percentile(rgb: &RgbImage, channel: usize, percentile: f32) -> u8 {
    let mut hist = [0u64; 256];
    for pixel in rgb.pixels() {
        hist[pixel[channel] as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 255;
    }

    let rank = (percentile / 100.0 * total as f32).ceil().max(1.0) as u64;
    let mut seen = 0u64;
    for (value, count) in hist.iter().enumerate() {
        seen += count;
        if seen >= rank {
            return value as u8;
        }
    }
    255
}

impl Stage for WhiteBalance {
    fn transform(&self, images: Vec<DynamicImage>, _context: &StageContext) -> Result<Vec<DynamicImage>> {
        ensure!(
            self.percentile > 0.0 && self.percentile <= 100.0,
            "White balance percentile must be in (0, 100], got {}",
            self.percentile
        );

        let mut result = Vec::with_capacity(images.len());
        for img in images {
            let rgb = img.to_rgb8();
            let scale: [f32; 3] = std::array::from_fn(|c| {
                let p = channel_percentile(&rgb, c, self.percentile).max(1);
                255.0 / p as f32
            });

            let (width, height) = rgb.dimensions();
            let balanced = RgbImage::from_fn(width, height, |x, y| {
                let pixel = rgb.get_pixel(x, y);
                Rgb(std::array::from_fn(|c| {
                    (pixel[c] as f32 * scale[c]).clamp(0.0, 255.0) as u8
                }))
            });
            result.push(DynamicImage::ImageRgb8(balanced));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "White Balancing"
    }
}

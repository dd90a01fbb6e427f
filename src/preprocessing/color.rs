use crate::pipeline::{Stage, StageContext};
use anyhow::{Result, anyhow};
use image::{DynamicImage, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Random photometric jitter: brightness, contrast, saturation and hue.
///
/// Factor ranges follow the usual jitter convention: brightness/contrast/
/// saturation are sampled from `[1 - x, 1 + x]`, hue from `[-hue, hue]`
/// (fraction of a full hue circle).
pub struct ColorJitter {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
    rng: Mutex<StdRng>,
}

impl ColorJitter {
    pub fn new(brightness: f32, contrast: f32, saturation: f32, hue: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            hue,
            rng: Mutex::new(StdRng::seed_from_u64(rand::rng().random())),
        }
    }

    pub fn with_seed(brightness: f32, contrast: f32, saturation: f32, hue: f32, seed: u64) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            hue,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn jitter(
        &self,
        rgb: &RgbImage,
        brightness: f32,
        contrast: f32,
        saturation: f32,
        hue_deg: i32,
    ) -> RgbImage {
        let (width, height) = rgb.dimensions();
        let mut out = RgbImage::new(width, height);
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let [r, g, b] = pixel.0.map(|v| v as f32);

            // Brightness and contrast (about mid-gray), then pull towards or
            // away from luma for saturation.
            let luma = 0.299 * r + 0.587 * g + 0.114 * b;
            let adjust = |v: f32| {
                let v = v * brightness;
                let v = (v - 128.0) * contrast + 128.0;
                let luma = luma * brightness;
                let luma = (luma - 128.0) * contrast + 128.0;
                luma + (v - luma) * saturation
            };
            out.put_pixel(
                x,
                y,
                Rgb([
                    adjust(r).clamp(0.0, 255.0) as u8,
                    adjust(g).clamp(0.0, 255.0) as u8,
                    adjust(b).clamp(0.0, 255.0) as u8,
                ]),
            );
        }
        if hue_deg != 0 {
            out = image::imageops::huerotate(&out, hue_deg);
        }
        out
    }
}

impl Stage for ColorJitter {
    fn transform(&self, images: Vec<DynamicImage>, _context: &StageContext) -> Result<Vec<DynamicImage>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("ColorJitter RNG lock poisoned"))?;

        let mut result = Vec::with_capacity(images.len());
        for img in images {
            let brightness = rng.random_range((1.0 - self.brightness).max(0.0)..=1.0 + self.brightness);
            let contrast = rng.random_range((1.0 - self.contrast).max(0.0)..=1.0 + self.contrast);
            let saturation = rng.random_range((1.0 - self.saturation).max(0.0)..=1.0 + self.saturation);
            let hue_deg = (rng.random_range(-self.hue..=self.hue) * 360.0) as i32;

            let rgb = img.to_rgb8();
            result.push(DynamicImage::ImageRgb8(self.jitter(
                &rgb, brightness, contrast, saturation, hue_deg,
            )));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Color Jitter"
    }
}

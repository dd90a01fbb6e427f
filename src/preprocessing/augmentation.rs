use crate::pipeline::{Stage, StageContext};
use anyhow::{Result, anyhow};
use image::{DynamicImage, Rgb};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Random geometric augmentation.
///
/// Each input image gets one randomly jittered counterpart: rotation within
/// `rotation_range` degrees, translation within `shift_range` of the image
/// size, shear, zoom, and optional horizontal/vertical flips. Defaults match
/// a mild photogrammetry-friendly jitter.
pub struct Augmentation {
    pub rotation_range: f32,
    pub shift_range: f32,
    pub shear_range: f32,
    pub zoom_range: f32,
    pub horizontal_flip: bool,
    pub vertical_flip: bool,
    rng: Mutex<StdRng>,
}

impl Augmentation {
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rotation_range: 20.0,
            shift_range: 0.2,
            shear_range: 0.2,
            zoom_range: 0.2,
            horizontal_flip: true,
            vertical_flip: true,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for Augmentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Augmentation {
    fn transform(&self, images: Vec<DynamicImage>, _context: &StageContext) -> Result<Vec<DynamicImage>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("Augmentation RNG lock poisoned"))?;

        let mut result = Vec::with_capacity(images.len());
        for img in images {
            let rgb = img.to_rgb8();
            let (width, height) = rgb.dimensions();
            let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);

            let theta = rng
                .random_range(-self.rotation_range..=self.rotation_range)
                .to_radians();
            let tx = rng.random_range(-self.shift_range..=self.shift_range) * width as f32;
            let ty = rng.random_range(-self.shift_range..=self.shift_range) * height as f32;
            let shear = rng.random_range(-self.shear_range..=self.shear_range);
            let zoom = rng.random_range(1.0 - self.zoom_range..=1.0 + self.zoom_range);

            let shear_proj = Projection::from_matrix([1.0, shear, 0.0, shear, 1.0, 0.0, 0.0, 0.0, 1.0])
                .ok_or_else(|| anyhow!("Degenerate shear matrix (shear = {shear})"))?;

            // Rotate/shear/zoom about the image center, then shift.
            let projection = Projection::translate(tx, ty)
                * Projection::translate(cx, cy)
                * Projection::rotate(theta)
                * shear_proj
                * Projection::scale(zoom, zoom)
                * Projection::translate(-cx, -cy);

            let mut warped = warp(&rgb, &projection, Interpolation::Nearest, Rgb([0, 0, 0]));

            if self.horizontal_flip && rng.random_bool(0.5) {
                warped = image::imageops::flip_horizontal(&warped);
            }
            if self.vertical_flip && rng.random_bool(0.5) {
                warped = image::imageops::flip_vertical(&warped);
            }

            result.push(DynamicImage::ImageRgb8(warped));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Augmentation"
    }
}

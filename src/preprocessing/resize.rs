use crate::pipeline::{Stage, StageContext};
use anyhow::Result;
use image::DynamicImage;
use image::imageops::FilterType;

/// Aspect-ratio-aware bounding resize.
///
/// Portrait images become `low` wide by `high` tall, landscape images become
/// `high` wide by `low` tall, and square images become `high` by `high`.
pub struct Resize {
    pub high: u32,
    pub low: u32,
}

impl Resize {
    pub fn new(high: u32, low: u32) -> Self {
        Self { high, low }
    }
}

impl Default for Resize {
    fn default() -> Self {
        Self { high: 700, low: 500 }
    }
}

impl Stage for Resize {
    fn transform(&self, images: Vec<DynamicImage>, _context: &StageContext) -> Result<Vec<DynamicImage>> {
        let mut result = Vec::with_capacity(images.len());
        for img in images {
            let (width, height) = (img.width(), img.height());
            let resized = if height > width {
                img.resize_exact(self.low, self.high, FilterType::Triangle)
            } else if width > height {
                img.resize_exact(self.high, self.low, FilterType::Triangle)
            } else {
                img.resize_exact(self.high, self.high, FilterType::Triangle)
            };
            result.push(resized);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Resize"
    }
}

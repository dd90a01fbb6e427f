use crate::pipeline::{Stage, StageContext};
use anyhow::{Result, ensure};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};

/// Contrast-limited adaptive histogram equalization.
///
/// Works on the luma plane: the image is split into a `grid_x` by `grid_y`
/// grid of tiles, each tile gets a clipped-histogram equalization mapping,
/// and output pixels bilinearly interpolate between the mappings of the four
/// surrounding tile centers. The equalized plane is replicated into all three
/// channels, so the output is always RGB regardless of the input format.
pub struct Clahe {
    pub clip_limit: f32,
    pub grid_x: u32,
    pub grid_y: u32,
}

impl Clahe {
    pub fn new(clip_limit: f32, grid: (u32, u32)) -> Self {
        Self {
            clip_limit,
            grid_x: grid.0,
            grid_y: grid.1,
        }
    }

    /// Clipped-histogram equalization mapping for one tile.
    fn tile_mapping(&self, gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) -> [u8; 256] {
        let mut hist = [0u32; 256];
        for y in y0..y1 {
            for x in x0..x1 {
                hist[gray.get_pixel(x, y)[0] as usize] += 1;
            }
        }
        let n_pixels = ((x1 - x0) * (y1 - y0)).max(1);

        // Clip the histogram and redistribute the excess uniformly.
        let clip = ((self.clip_limit * n_pixels as f32 / 256.0).max(1.0)) as u32;
        let mut excess = 0u32;
        for count in hist.iter_mut() {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }
        let bonus = excess / 256;
        let mut remainder = excess % 256;
        for count in hist.iter_mut() {
            *count += bonus;
            if remainder > 0 {
                *count += 1;
                remainder -= 1;
            }
        }

        let mut mapping = [0u8; 256];
        let mut cdf = 0u64;
        for (v, count) in hist.iter().enumerate() {
            cdf += *count as u64;
            mapping[v] = ((cdf * 255) / n_pixels as u64).min(255) as u8;
        }
        mapping
    }

    fn equalize(&self, gray: &GrayImage) -> RgbImage {
        let (width, height) = gray.dimensions();

        // The effective grid never exceeds the image dimensions, and tiles
        // are an even floor partition, so every tile holds at least one
        // pixel and no degenerate mapping can bleed into the edges.
        let grid_x = self.grid_x.min(width).max(1);
        let grid_y = self.grid_y.min(height).max(1);

        // Mapping per tile, row-major.
        let mut mappings = Vec::with_capacity((grid_x * grid_y) as usize);
        for ty in 0..grid_y {
            for tx in 0..grid_x {
                let x0 = tx * width / grid_x;
                let x1 = (tx + 1) * width / grid_x;
                let y0 = ty * height / grid_y;
                let y1 = (ty + 1) * height / grid_y;
                mappings.push(self.tile_mapping(gray, x0, y0, x1, y1));
            }
        }

        let lookup = |tx: i64, ty: i64, v: u8| -> f32 {
            let tx = tx.clamp(0, grid_x as i64 - 1) as u32;
            let ty = ty.clamp(0, grid_y as i64 - 1) as u32;
            mappings[(ty * grid_x + tx) as usize][v as usize] as f32
        };

        let mut out = RgbImage::new(width, height);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let v = pixel[0];

            // Continuous tile coordinate relative to tile centers.
            let fx = (x as f32 + 0.5) * grid_x as f32 / width as f32 - 0.5;
            let fy = (y as f32 + 0.5) * grid_y as f32 / height as f32 - 0.5;
            let tx = fx.floor() as i64;
            let ty = fy.floor() as i64;
            let wx = fx - tx as f32;
            let wy = fy - ty as f32;

            let top = lookup(tx, ty, v) * (1.0 - wx) + lookup(tx + 1, ty, v) * wx;
            let bottom = lookup(tx, ty + 1, v) * (1.0 - wx) + lookup(tx + 1, ty + 1, v) * wx;
            let value = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;

            out.put_pixel(x, y, Rgb([value, value, value]));
        }
        out
    }
}

impl Stage for Clahe {
    fn transform(&self, images: Vec<DynamicImage>, _context: &StageContext) -> Result<Vec<DynamicImage>> {
        ensure!(self.grid_x > 0 && self.grid_y > 0, "CLAHE grid must be non-zero");

        let mut result = Vec::with_capacity(images.len());
        for img in images {
            let gray = img.to_luma8();
            result.push(DynamicImage::ImageRgb8(self.equalize(&gray)));
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "CLAHE"
    }
}

mod common;

use anyhow::Result;
use image::DynamicImage;
use nerfup::pipeline::{Pipeline, Stage, StageContext};
use std::sync::Arc;

/// Stage that crops one pixel row off the bottom; lets tests observe
/// application order through image dimensions.
struct ShrinkHeight;

impl Stage for ShrinkHeight {
    fn transform(&self, images: Vec<DynamicImage>, _ctx: &StageContext) -> Result<Vec<DynamicImage>> {
        Ok(images
            .into_iter()
            .map(|img| {
                let h = img.height() - 1;
                let w = img.width();
                img.crop_imm(0, 0, w, h)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Shrink Height"
    }
}

/// Stage that duplicates every input image.
struct Duplicate;

impl Stage for Duplicate {
    fn transform(&self, images: Vec<DynamicImage>, _ctx: &StageContext) -> Result<Vec<DynamicImage>> {
        let mut out = Vec::with_capacity(images.len() * 2);
        for img in images {
            out.push(img.clone());
            out.push(img);
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "Duplicate"
    }
}

/// Stage that drops everything.
struct DropAll;

impl Stage for DropAll {
    fn transform(&self, _images: Vec<DynamicImage>, _ctx: &StageContext) -> Result<Vec<DynamicImage>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "Drop All"
    }
}

#[test]
fn empty_pipeline_returns_seed_unchanged() -> Result<()> {
    let seed = common::solid_image(40, 30, [10, 20, 30]);
    let results = Pipeline::new().run(seed.clone())?;

    assert_eq!(results.len(), 1);
    assert_eq!((results[0].width(), results[0].height()), (seed.width(), seed.height()));
    assert_eq!(results[0].to_rgb8().as_raw(), seed.to_rgb8().as_raw());
    Ok(())
}

#[test]
fn stages_apply_strictly_left_to_right() -> Result<()> {
    // Three height shrinks then a duplicate: height drops by exactly 3 and
    // the duplicate at the end doubles the count. If the order were not
    // left-to-right the cardinality/height combination would differ.
    let pipeline = Pipeline::new()
        .add_stage(Arc::new(ShrinkHeight))
        .add_stage(Arc::new(ShrinkHeight))
        .add_stage(Arc::new(ShrinkHeight))
        .add_stage(Arc::new(Duplicate));

    let results = pipeline.run(common::solid_image(20, 20, [0, 0, 0]))?;
    assert_eq!(results.len(), 2);
    for img in &results {
        assert_eq!(img.height(), 17);
        assert_eq!(img.width(), 20);
    }
    Ok(())
}

#[test]
fn pipeline_matches_manual_composition() -> Result<()> {
    let seed = common::gradient_image(32, 24);

    let pipeline = Pipeline::new()
        .add_stage(Arc::new(Duplicate))
        .add_stage(Arc::new(ShrinkHeight));
    let piped = pipeline.run(seed.clone())?;

    let ctx = StageContext {
        verbose: false,
        debug: None,
    };
    let manual = ShrinkHeight.transform(Duplicate.transform(vec![seed], &ctx)?, &ctx)?;

    assert_eq!(piped.len(), manual.len());
    for (a, b) in piped.iter().zip(manual.iter()) {
        assert_eq!(a.to_rgb8().as_raw(), b.to_rgb8().as_raw());
    }
    Ok(())
}

#[test]
fn empty_stage_output_fails_with_stage_name() {
    let pipeline = Pipeline::new()
        .add_stage(Arc::new(DropAll))
        .add_stage(Arc::new(Duplicate));

    let err = pipeline
        .run(common::solid_image(8, 8, [0, 0, 0]))
        .expect_err("dropping all images should abort the pipeline");
    assert!(err.to_string().contains("Drop All"));
}

#[test]
fn debug_mode_dumps_stage_outputs() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");

    let pipeline = Pipeline::new()
        .add_stage(Arc::new(Duplicate))
        .with_debug(debug_dir.clone())?;
    pipeline.run(common::solid_image(8, 8, [1, 2, 3]))?;

    assert!(debug_dir.join("00_input").join("01.png").is_file());
    assert!(debug_dir.join("01_duplicate").join("01.png").is_file());
    assert!(debug_dir.join("01_duplicate").join("02.png").is_file());
    Ok(())
}

#[test]
fn debug_mode_rejects_non_empty_directory() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;

    let result = Pipeline::new().with_debug(dir.path().to_path_buf());
    assert!(result.is_err());
    Ok(())
}

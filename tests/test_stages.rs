mod common;

use anyhow::Result;
use image::{DynamicImage, GrayImage};
use nerfup::pipeline::{Pipeline, Stage, StageContext};
use nerfup::preprocessing::{
    Augmentation, BilateralFilter, Clahe, ColorJitter, Resize, WhiteBalance, build_pipeline,
    stage_by_name,
};
use std::sync::Arc;

fn ctx() -> StageContext {
    StageContext {
        verbose: false,
        debug: None,
    }
}

#[test]
fn resize_portrait_to_low_by_high() -> Result<()> {
    let out = Resize::new(700, 500).transform(vec![common::solid_image(200, 300, [0, 0, 0])], &ctx())?;
    assert_eq!(out.len(), 1);
    assert_eq!((out[0].width(), out[0].height()), (500, 700));
    Ok(())
}

#[test]
fn resize_landscape_to_high_by_low() -> Result<()> {
    let out = Resize::new(700, 500).transform(vec![common::solid_image(300, 200, [0, 0, 0])], &ctx())?;
    assert_eq!((out[0].width(), out[0].height()), (700, 500));
    Ok(())
}

#[test]
fn resize_square_to_high_square() -> Result<()> {
    let out = Resize::new(700, 500).transform(vec![common::solid_image(64, 64, [0, 0, 0])], &ctx())?;
    assert_eq!((out[0].width(), out[0].height()), (700, 700));
    Ok(())
}

#[test]
fn reconstruction_pipeline_resizes_photos_to_estimator_scale() -> Result<()> {
    // The server-side pipeline always starts with Resize(2773, 1560); a
    // 3000x2000 landscape photo must come out as a single 2773x1560 image.
    let pipeline = build_pipeline(&[], false)?;
    let results = pipeline.run(common::solid_image(3000, 2000, [127, 127, 127]))?;

    assert_eq!(results.len(), 1);
    assert_eq!((results[0].width(), results[0].height()), (2773, 1560));
    Ok(())
}

#[test]
fn clahe_output_is_always_three_channel() -> Result<()> {
    let gray = DynamicImage::ImageLuma8(GrayImage::from_fn(64, 48, |x, y| {
        image::Luma([((x + y) % 256) as u8])
    }));
    let out = Clahe::new(2.0, (8, 8)).transform(vec![gray], &ctx())?;

    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], DynamicImage::ImageRgb8(_)));
    assert_eq!(out[0].color().channel_count(), 3);
    Ok(())
}

#[test]
fn clahe_preserves_dimensions_for_odd_sizes() -> Result<()> {
    // Image size not divisible by the tile grid.
    let out = Clahe::new(4.0, (8, 8)).transform(vec![common::gradient_image(101, 67)], &ctx())?;
    assert_eq!((out[0].width(), out[0].height()), (101, 67));
    Ok(())
}

#[test]
fn clahe_flattens_a_constant_image_without_artifacts() -> Result<()> {
    // A constant plane has a degenerate histogram in every tile; output must
    // still be a valid constant image.
    let out = Clahe::new(2.0, (8, 8)).transform(vec![common::solid_image(64, 64, [90, 90, 90])], &ctx())?;
    let rgb = out[0].to_rgb8();
    let first = rgb.get_pixel(0, 0)[0];
    assert!(rgb.pixels().all(|p| p[0] == first && p[1] == first && p[2] == first));
    Ok(())
}

#[test]
fn clahe_handles_images_smaller_than_the_tile_grid() -> Result<()> {
    // A 6x4 image under an 8x8 grid must not blend in unpopulated tile
    // mappings: a constant input stays constant out to the edges.
    let out = Clahe::new(2.0, (8, 8)).transform(vec![common::solid_image(6, 4, [90, 90, 90])], &ctx())?;
    assert_eq!((out[0].width(), out[0].height()), (6, 4));

    let rgb = out[0].to_rgb8();
    let first = rgb.get_pixel(0, 0)[0];
    assert!(first > 0);
    assert!(rgb.pixels().all(|p| p[0] == first && p[1] == first && p[2] == first));
    Ok(())
}

#[test]
fn white_balance_stays_in_displayable_range() -> Result<()> {
    let out = WhiteBalance::new(90.0).transform(vec![common::gradient_image(120, 80)], &ctx())?;
    // clamp() guarantees u8 range; what matters is that scaling by a low
    // percentile saturated the bright end instead of wrapping.
    let rgb = out[0].to_rgb8();
    assert!(rgb.pixels().any(|p| p[0] == 255));
    Ok(())
}

#[test]
fn white_balance_maps_channel_maximum_to_white() -> Result<()> {
    let out = WhiteBalance::default().transform(vec![common::solid_image(16, 16, [100, 150, 200])], &ctx())?;
    let rgb = out[0].to_rgb8();
    // Percentile 100 scales each channel by its own max, so a solid image
    // becomes pure white.
    assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
    Ok(())
}

#[test]
fn white_balance_rejects_invalid_percentile() {
    let result = WhiteBalance::new(0.0).transform(vec![common::solid_image(4, 4, [1, 2, 3])], &ctx());
    assert!(result.is_err());
}

#[test]
fn bilateral_filter_smooths_noise_but_keeps_size() -> Result<()> {
    let out = BilateralFilter::default().transform(vec![common::gradient_image(40, 30)], &ctx())?;
    assert_eq!(out.len(), 1);
    assert_eq!((out[0].width(), out[0].height()), (40, 30));
    Ok(())
}

#[test]
fn augmentation_preserves_cardinality_and_size() -> Result<()> {
    let inputs = vec![
        common::gradient_image(50, 40),
        common::gradient_image(30, 60),
    ];
    let out = Augmentation::with_seed(7).transform(inputs, &ctx())?;

    assert_eq!(out.len(), 2);
    assert_eq!((out[0].width(), out[0].height()), (50, 40));
    assert_eq!((out[1].width(), out[1].height()), (30, 60));
    Ok(())
}

#[test]
fn augmentation_is_deterministic_for_a_fixed_seed() -> Result<()> {
    let seed_img = common::gradient_image(32, 32);
    let a = Augmentation::with_seed(42).transform(vec![seed_img.clone()], &ctx())?;
    let b = Augmentation::with_seed(42).transform(vec![seed_img], &ctx())?;
    assert_eq!(a[0].to_rgb8().as_raw(), b[0].to_rgb8().as_raw());
    Ok(())
}

#[test]
fn color_jitter_stays_in_range() -> Result<()> {
    let out = ColorJitter::with_seed(0.4, 0.4, 0.4, 0.1, 3).transform(vec![common::gradient_image(40, 40)], &ctx())?;
    assert_eq!(out.len(), 1);
    assert_eq!((out[0].width(), out[0].height()), (40, 40));
    Ok(())
}

#[test]
fn stage_registry_resolves_both_white_balancing_spellings() {
    assert!(stage_by_name("clahe").is_some());
    assert!(stage_by_name("filtering").is_some());
    assert!(stage_by_name("augmentation").is_some());
    assert!(stage_by_name("white balancing").is_some());
    assert!(stage_by_name("white_balancing").is_some());
    assert!(stage_by_name("sharpen").is_none());
}

#[test]
fn build_pipeline_rejects_unknown_stage_names() {
    let err = build_pipeline(&["clahe".to_string(), "nope".to_string()], false)
        .expect_err("unknown stage name must be rejected");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn requested_stages_run_after_the_initial_resize() -> Result<()> {
    let pipeline = build_pipeline(&["clahe".to_string()], false)?;
    assert_eq!(pipeline.len(), 2);

    let results = pipeline.run(common::gradient_image(3000, 2000))?;
    assert_eq!(results.len(), 1);
    // Resize ran first, CLAHE second (3-channel output at estimator scale).
    assert_eq!((results[0].width(), results[0].height()), (2773, 1560));
    assert_eq!(results[0].color().channel_count(), 3);
    Ok(())
}

#[test]
fn full_stage_chain_end_to_end() -> Result<()> {
    let pipeline = Pipeline::new()
        .add_stage(Arc::new(Resize::new(120, 80)))
        .add_stage(Arc::new(Clahe::new(2.0, (4, 4))))
        .add_stage(Arc::new(BilateralFilter::new(5, 50.0, 50.0)))
        .add_stage(Arc::new(WhiteBalance::default()));

    let results = pipeline.run(common::gradient_image(600, 400))?;
    assert_eq!(results.len(), 1);
    assert_eq!((results[0].width(), results[0].height()), (120, 80));
    Ok(())
}

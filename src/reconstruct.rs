use crate::config::AppConfig;
use crate::localization::{ColmapEstimator, ColmapOptions, HlocEstimator, HlocOptions, PoseEstimator};
use crate::ngp::{InstantNgp, NgpOptions};
use crate::preprocessing::build_pipeline;
use anyhow::{Context, Result, bail};
use image::ImageReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Run the full reconstruction flow on an extracted upload.
///
/// `root` must contain an `images/` directory. Each image is preprocessed in
/// place, the chosen estimator writes `transforms.json`, and Instant-NGP
/// trains and exports into `<root>/results/`. Returns the snapshot path.
pub fn reconstruct(
    root: &Path,
    preprocessing: &[String],
    model: &str,
    pose_estimator: &str,
    config: &AppConfig,
) -> Result<PathBuf> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Scene root {} does not exist", root.display()))?;
    let images_dir = root.join("images");
    let transforms_path = root.join("transforms.json");

    let tic = Instant::now();
    let processed = preprocess_images(&images_dir, preprocessing, config.verbose)?;
    log::info!("Preprocessed {} images in {:.2?}", processed, tic.elapsed());

    let tic = Instant::now();
    match pose_estimator {
        "colmap" => {
            let opts = ColmapOptions::new(&root, "images", &transforms_path);
            ColmapEstimator::new(&config.colmap_binary).predict(&opts)?;
        }
        "hloc" => {
            let opts = HlocOptions::new(&root, "images", &transforms_path);
            HlocEstimator::new(&config.hloc_script, &config.colmap_binary).predict(&opts)?;
        }
        other => bail!("Unknown pose estimator: '{}'", other),
    }
    log::info!("Pose estimation finished in {:.2?}", tic.elapsed());

    match model {
        "nerf" => {
            let results_dir = root.join("results");
            let snapshot_path = results_dir.join("nerfsnapshot.ingp");

            let mut opts = NgpOptions::new(&root);
            opts.save_snapshot = Some(snapshot_path.clone());
            opts.save_mesh = Some(results_dir.join("nerfmesh.obj"));
            opts.n_steps = config.n_steps;
            opts.marching_cubes_res = config.marching_cubes_res;
            opts.marching_cubes_thresh = config.marching_cubes_thresh;
            opts.gui = config.gui;

            let tic = Instant::now();
            InstantNgp::new(&config.instant_ngp_root).predict(&opts)?;
            log::info!("Reconstruction finished in {:.2?}", tic.elapsed());

            Ok(snapshot_path)
        }
        other => bail!("Unknown reconstruction model: '{}'", other),
    }
}

/// Run the preprocessing pipeline over every image in `images_dir`, writing
/// the first pipeline output back over the source file. Returns the number
/// of images processed.
fn preprocess_images(images_dir: &Path, preprocessing: &[String], verbose: bool) -> Result<usize> {
    let pipeline = build_pipeline(preprocessing, verbose)?;

    let mut count = 0;
    for entry in std::fs::read_dir(images_dir)
        .with_context(|| format!("No images directory at {}", images_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let img = ImageReader::open(&path)?
            .decode()
            .with_context(|| format!("Failed to decode image {}", path.display()))?;

        let outputs = pipeline.run(img)?;
        // run() guarantees a non-empty output list.
        outputs[0]
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        count += 1;
    }

    if count == 0 {
        bail!("Upload contained no images under {}", images_dir.display());
    }
    Ok(count)
}

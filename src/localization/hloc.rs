use crate::localization::PoseEstimator;
use crate::localization::transforms::colmap_to_transforms;
use crate::tool::run_tool;
use anyhow::Result;
use std::path::PathBuf;
use std::process::Command;

/// Options for one hloc localization run.
#[derive(Debug, Clone)]
pub struct HlocOptions {
    /// Scene root containing `images_folder`
    pub path: PathBuf,
    pub images_folder: String,
    /// Where transforms.json is written
    pub output_path: PathBuf,
    /// Directory name (under `path`) hloc writes its SfM model into
    pub text_dir: String,
    pub aabb_scale: u32,
    pub skip_early: usize,
}

impl HlocOptions {
    pub fn new(path: impl Into<PathBuf>, images_folder: &str, output_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            images_folder: images_folder.to_string(),
            output_path: output_path.into(),
            text_dir: "colmap_text".to_string(),
            aabb_scale: 32,
            skip_early: 0,
        }
    }
}

/// Pose estimation via the hloc toolchain (DISK features + LightGlue
/// matching). hloc is a Python library, so the heavy lifting happens in a
/// driver script invoked as a subprocess; its binary SfM model is converted
/// to text with `colmap model_converter` and then to transforms.json here.
pub struct HlocEstimator {
    script: PathBuf,
    colmap_binary: PathBuf,
}

impl HlocEstimator {
    pub fn new(script: impl Into<PathBuf>, colmap_binary: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            colmap_binary: colmap_binary.into(),
        }
    }
}

impl PoseEstimator for HlocEstimator {
    type Options = HlocOptions;

    fn predict(&self, opts: &HlocOptions) -> Result<()> {
        let sfm_dir = opts.path.join(&opts.text_dir);

        run_tool(
            Command::new("python3")
                .arg(&self.script)
                .arg("--images")
                .arg(opts.path.join(&opts.images_folder))
                .arg("--outputs")
                .arg(&opts.path)
                .arg("--sfm_dir")
                .arg(&sfm_dir),
        )?;

        run_tool(
            Command::new(&self.colmap_binary)
                .arg("model_converter")
                .arg("--input_path")
                .arg(&sfm_dir)
                .arg("--output_path")
                .arg(&sfm_dir)
                .args(["--output_type", "TXT"]),
        )?;

        colmap_to_transforms(
            &opts.path,
            &opts.images_folder,
            &sfm_dir,
            &opts.output_path,
            opts.aabb_scale,
            opts.skip_early,
            true,
        )
    }
}

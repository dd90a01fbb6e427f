use crate::localization::PoseEstimator;
use crate::localization::transforms::colmap_to_transforms;
use crate::tool::run_tool;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Matcher strategies understood by `colmap <matcher>_matcher`.
/// Sequential suits video frames, exhaustive suits ad-hoc photo sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColmapMatcher {
    Sequential,
    Exhaustive,
    Spatial,
    Transitive,
    VocabTree,
}

impl ColmapMatcher {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColmapMatcher::Sequential => "sequential",
            ColmapMatcher::Exhaustive => "exhaustive",
            ColmapMatcher::Spatial => "spatial",
            ColmapMatcher::Transitive => "transitive",
            ColmapMatcher::VocabTree => "vocab_tree",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColmapCameraModel {
    SimplePinhole,
    Pinhole,
    SimpleRadial,
    Radial,
    Opencv,
    SimpleRadialFisheye,
    RadialFisheye,
    OpencvFisheye,
}

impl ColmapCameraModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColmapCameraModel::SimplePinhole => "SIMPLE_PINHOLE",
            ColmapCameraModel::Pinhole => "PINHOLE",
            ColmapCameraModel::SimpleRadial => "SIMPLE_RADIAL",
            ColmapCameraModel::Radial => "RADIAL",
            ColmapCameraModel::Opencv => "OPENCV",
            ColmapCameraModel::SimpleRadialFisheye => "SIMPLE_RADIAL_FISHEYE",
            ColmapCameraModel::RadialFisheye => "RADIAL_FISHEYE",
            ColmapCameraModel::OpencvFisheye => "OPENCV_FISHEYE",
        }
    }
}

/// Options for one COLMAP localization run.
#[derive(Debug, Clone)]
pub struct ColmapOptions {
    /// Scene root containing `images_folder`
    pub path: PathBuf,
    pub images_folder: String,
    /// Where transforms.json is written
    pub output_path: PathBuf,
    pub matcher: ColmapMatcher,
    pub camera_model: ColmapCameraModel,
    /// Intrinsics override: fx,fy,cx,cy,dist depending on the model
    pub camera_params: String,
    pub db_name: String,
    /// Directory name (under `path`) for the converted text model
    pub text_dir: String,
    pub vocab_path: Option<PathBuf>,
    pub aabb_scale: u32,
    pub skip_early: usize,
    pub keep_colmap_coords: bool,
}

impl ColmapOptions {
    pub fn new(path: impl Into<PathBuf>, images_folder: &str, output_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            images_folder: images_folder.to_string(),
            output_path: output_path.into(),
            matcher: ColmapMatcher::Exhaustive,
            camera_model: ColmapCameraModel::Opencv,
            camera_params: String::new(),
            db_name: "colmap.db".to_string(),
            text_dir: "colmap_text".to_string(),
            vocab_path: None,
            aabb_scale: 32,
            skip_early: 0,
            keep_colmap_coords: true,
        }
    }
}

/// Pose estimation by shelling out to the COLMAP binary:
/// feature extraction → matching → mapping → bundle adjustment → text
/// export, then conversion of the text model to transforms.json.
pub struct ColmapEstimator {
    binary: PathBuf,
}

impl ColmapEstimator {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    fn run_colmap(&self, opts: &ColmapOptions) -> Result<()> {
        let db = opts.path.join(&opts.db_name);
        let images = opts.path.join(&opts.images_folder);
        let sparse = opts.path.join(format!(
            "{}_sparse",
            db.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
        ));
        let text = opts.path.join(&opts.text_dir);

        if db.exists() {
            std::fs::remove_file(&db)?;
        }

        run_tool(
            Command::new(&self.binary)
                .arg("feature_extractor")
                .args(["--ImageReader.camera_model", opts.camera_model.as_str()])
                .args(["--ImageReader.camera_params", &opts.camera_params])
                .arg("--SiftExtraction.estimate_affine_shape=true")
                .arg("--SiftExtraction.domain_size_pooling=true")
                .args(["--ImageReader.single_camera", "1"])
                .arg("--database_path")
                .arg(&db)
                .arg("--image_path")
                .arg(&images),
        )?;

        let mut match_cmd = Command::new(&self.binary);
        match_cmd
            .arg(format!("{}_matcher", opts.matcher.as_str()))
            .arg("--SiftMatching.guided_matching=true")
            .arg("--database_path")
            .arg(&db);
        if let Some(vocab_path) = &opts.vocab_path {
            match_cmd.arg("--VocabTreeMatching.vocab_tree_path").arg(vocab_path);
        }
        run_tool(&mut match_cmd)?;

        recreate_dir(&sparse)?;
        run_tool(
            Command::new(&self.binary)
                .arg("mapper")
                .arg("--database_path")
                .arg(&db)
                .arg("--image_path")
                .arg(&images)
                .arg("--output_path")
                .arg(&sparse),
        )?;

        run_tool(
            Command::new(&self.binary)
                .arg("bundle_adjuster")
                .arg("--input_path")
                .arg(sparse.join("0"))
                .arg("--output_path")
                .arg(sparse.join("0"))
                .args(["--BundleAdjustment.refine_principal_point", "1"]),
        )?;

        recreate_dir(&text)?;
        run_tool(
            Command::new(&self.binary)
                .arg("model_converter")
                .arg("--input_path")
                .arg(sparse.join("0"))
                .arg("--output_path")
                .arg(&text)
                .args(["--output_type", "TXT"]),
        )?;

        Ok(())
    }
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

impl PoseEstimator for ColmapEstimator {
    type Options = ColmapOptions;

    fn predict(&self, opts: &ColmapOptions) -> Result<()> {
        self.run_colmap(opts)?;
        colmap_to_transforms(
            &opts.path,
            &opts.images_folder,
            &opts.path.join(&opts.text_dir),
            &opts.output_path,
            opts.aabb_scale,
            opts.skip_early,
            opts.keep_colmap_coords,
        )
    }
}

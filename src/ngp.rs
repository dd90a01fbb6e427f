use crate::tool::run_tool;
use anyhow::{Result, ensure};
use std::path::PathBuf;
use std::process::Command;

/// Options for one Instant-NGP training/export run.
///
/// These map one-to-one onto the flags of Instant-NGP's `scripts/run.py`
/// and are passed through unchanged; nothing here is interpreted.
#[derive(Debug, Clone)]
pub struct NgpOptions {
    /// Scene to load: a directory with transforms.json, or a snapshot
    pub training_data: PathBuf,
    pub load_snapshot: Option<PathBuf>,
    pub save_snapshot: Option<PathBuf>,
    pub network_config: Option<PathBuf>,
    /// Training steps; <0 means the tool's default
    pub n_steps: i64,
    /// Distance from the camera at which training rays start; <0 uses the default
    pub near_distance: f32,
    pub exposure: f32,
    /// Sharpening applied to training images, 0.0 to 1.0
    pub sharpen: f32,
    pub save_mesh: Option<PathBuf>,
    pub marching_cubes_res: u32,
    pub marching_cubes_thresh: f32,
    pub gui: bool,
    pub width: u32,
    pub height: u32,
}

impl NgpOptions {
    pub fn new(training_data: impl Into<PathBuf>) -> Self {
        Self {
            training_data: training_data.into(),
            load_snapshot: None,
            save_snapshot: None,
            network_config: None,
            n_steps: -1,
            near_distance: -1.0,
            exposure: 0.0,
            sharpen: 0.0,
            save_mesh: None,
            marching_cubes_res: 256,
            marching_cubes_thresh: 2.5,
            gui: false,
            width: 1920,
            height: 1080,
        }
    }
}

/// Runs Instant-NGP's training/export driver as a subprocess under the
/// installation root configured at startup.
pub struct InstantNgp {
    root_dir: PathBuf,
}

impl InstantNgp {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self { root_dir: root_dir.into() }
    }

    pub fn predict(&self, opts: &NgpOptions) -> Result<()> {
        let mut cmd = self.command(opts)?;

        if let Some(snapshot) = &opts.save_snapshot {
            if let Some(parent) = snapshot.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if let Some(mesh) = &opts.save_mesh {
            if let Some(parent) = mesh.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        run_tool(&mut cmd)
    }

    /// Build the `run.py` invocation for `opts` without executing it.
    pub fn command(&self, opts: &NgpOptions) -> Result<Command> {
        ensure!(
            (0.0..=1.0).contains(&opts.sharpen),
            "Sharpening must be in [0, 1], got {}",
            opts.sharpen
        );

        let mut cmd = Command::new("python3");
        cmd.current_dir(&self.root_dir)
            .arg(self.root_dir.join("scripts").join("run.py"))
            .arg("--scene")
            .arg(&opts.training_data)
            .arg("--n_steps")
            .arg(opts.n_steps.to_string())
            .arg("--near_distance")
            .arg(opts.near_distance.to_string())
            .arg("--exposure")
            .arg(opts.exposure.to_string())
            .arg("--sharpen")
            .arg(opts.sharpen.to_string());

        if let Some(snapshot) = &opts.load_snapshot {
            cmd.arg("--load_snapshot").arg(snapshot);
        }
        if let Some(snapshot) = &opts.save_snapshot {
            cmd.arg("--save_snapshot").arg(snapshot);
        }
        if let Some(network) = &opts.network_config {
            cmd.arg("--network").arg(network);
        }
        if let Some(mesh) = &opts.save_mesh {
            cmd.arg("--save_mesh")
                .arg(mesh)
                .arg("--marching_cubes_res")
                .arg(opts.marching_cubes_res.to_string())
                .arg("--marching_cubes_density_thresh")
                .arg(opts.marching_cubes_thresh.to_string());
        }
        if opts.gui {
            cmd.arg("--gui")
                .arg("--width")
                .arg(opts.width.to_string())
                .arg("--height")
                .arg(opts.height.to_string());
        }

        Ok(cmd)
    }
}

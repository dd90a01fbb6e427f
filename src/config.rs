use std::path::PathBuf;

/// Service configuration, built once at startup and passed explicitly to
/// everything that invokes external tools. No ambient globals.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Path to the COLMAP binary
    pub colmap_binary: PathBuf,
    /// Instant-NGP installation root (contains scripts/run.py)
    pub instant_ngp_root: PathBuf,
    /// Driver script for the hloc estimator
    pub hloc_script: PathBuf,
    /// Root under which per-request scratch directories are created
    pub scratch_root: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Training steps passed to Instant-NGP; <0 uses the tool default
    pub n_steps: i64,
    /// Marching cubes grid resolution for mesh export
    pub marching_cubes_res: u32,
    /// Marching cubes density threshold for mesh export
    pub marching_cubes_thresh: f32,
    /// Open the Instant-NGP viewer window while training. Only useful when
    /// the service runs on a machine with a display attached.
    pub gui: bool,
    /// Verbose per-stage pipeline output
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            colmap_binary: PathBuf::from("colmap"),
            instant_ngp_root: PathBuf::from("./instant-ngp"),
            hloc_script: PathBuf::from("./scripts/run_hloc.py"),
            scratch_root: std::env::temp_dir(),
            max_upload_bytes: 2 * 1024 * 1024 * 1024,
            n_steps: -1,
            marching_cubes_res: 512,
            marching_cubes_thresh: 2.5,
            gui: false,
            verbose: false,
        }
    }
}

pub mod colmap;
pub mod hloc;
pub mod transforms;

pub use colmap::{ColmapCameraModel, ColmapEstimator, ColmapMatcher, ColmapOptions};
pub use hloc::{HlocEstimator, HlocOptions};

use anyhow::Result;

/// A camera pose estimator: consumes a directory of images and produces an
/// Instant-NGP `transforms.json`. Implementations wrap external tools, so a
/// failure here is usually a tool exit status, not a recoverable condition.
pub trait PoseEstimator {
    type Options;

    fn predict(&self, opts: &Self::Options) -> Result<()>;
}

pub mod augmentation;
pub mod clahe;
pub mod color;
pub mod filter;
pub mod resize;
pub mod white_balance;

pub use augmentation::Augmentation;
pub use clahe::Clahe;
pub use color::ColorJitter;
pub use filter::BilateralFilter;
pub use resize::Resize;
pub use white_balance::WhiteBalance;

use crate::pipeline::{Pipeline, Stage};
use anyhow::{Result, bail};
use std::sync::Arc;

/// Look up a preprocessing stage by its request name.
///
/// These are the names accepted in the `preprocessing` list of an upload
/// request; parameters are fixed per instantiation.
pub fn stage_by_name(name: &str) -> Option<Arc<dyn Stage>> {
    match name {
        "clahe" => Some(Arc::new(Clahe::new(2.0, (8, 8)))),
        "filtering" => Some(Arc::new(BilateralFilter::default())),
        "augmentation" => Some(Arc::new(Augmentation::new())),
        "white balancing" | "white_balancing" => Some(Arc::new(WhiteBalance::default())),
        _ => None,
    }
}

/// Build the reconstruction preprocessing pipeline from requested stage
/// names. A bounding resize always runs first so that every later stage sees
/// images at the scale the pose estimator expects. Unknown names are an
/// error rather than being silently skipped.
pub fn build_pipeline(stage_names: &[String], verbose: bool) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new()
        .with_verbose(verbose)
        .add_stage(Arc::new(Resize::new(2773, 1560)));

    for name in stage_names {
        match stage_by_name(name) {
            Some(stage) => pipeline = pipeline.add_stage(stage),
            None => bail!("Unknown preprocessing stage: '{}'", name),
        }
    }

    Ok(pipeline)
}

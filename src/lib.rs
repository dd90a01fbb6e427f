pub mod archive;
pub mod config;
pub mod localization;
pub mod ngp;
pub mod pipeline;
pub mod preprocessing;
pub mod reconstruct;
pub mod server;
pub mod tool;

pub use config::AppConfig;
pub use pipeline::{DebugConfig, Pipeline, Stage, StageContext};
pub use reconstruct::reconstruct;

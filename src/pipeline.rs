use anyhow::{Context, Result, bail};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for per-stage image dumps
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context available to all pipeline stages
#[derive(Clone)]
pub struct StageContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

/// Trait that all preprocessing stages implement.
///
/// A stage consumes the previous stage's output list and produces a new list.
/// Stages can change the cardinality (e.g. augmentation may emit more images
/// than it received). Pixel formats are interpreted by the stage itself; the
/// pipeline never inspects them.
pub trait Stage: Send + Sync {
    /// Transform a batch of images into a new batch.
    fn transform(&self, images: Vec<DynamicImage>, context: &StageContext) -> Result<Vec<DynamicImage>>;

    /// Human-readable name for this stage (used in verbose/debug output)
    fn name(&self) -> &str;
}

/// Composable preprocessing pipeline.
///
/// Holds an ordered sequence of stages; `run` feeds a single seed image
/// through each stage in turn. Stage order is fixed at construction and is
/// the only ordering guarantee made: no parallelism, no retries.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    context: StageContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            context: StageContext {
                verbose: false,
                debug: None,
            },
        }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                bail!("Debug directory is not empty: {}", output_dir.display());
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    /// Add a stage to the pipeline
    pub fn add_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Helper method to add a stage from a Box (for convenience)
    pub fn add_stage_boxed(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(Arc::from(stage));
        self
    }

    /// Number of stages in the pipeline
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the pipeline on a seed image.
    ///
    /// The seed is wrapped in a singleton list, then each stage in order
    /// replaces the current list with its own output. An empty stage list
    /// returns the seed unchanged. A stage producing zero images aborts the
    /// run with an error naming the stage, so later stages never see an
    /// empty batch.
    pub fn run(&self, seed: DynamicImage) -> Result<Vec<DynamicImage>> {
        if let Some(debug_config) = &self.context.debug {
            if debug_config.enabled {
                let input_dir = debug_config.output_dir.join("00_input");
                std::fs::create_dir_all(&input_dir)?;
                seed.save(input_dir.join("01.png"))
                    .context("Failed to save debug input")?;
            }
        }

        let mut images = vec![seed];

        for (stage_idx, stage) in self.stages.iter().enumerate() {
            if self.context.verbose {
                println!("Running stage: {} (processing {} images)", stage.name(), images.len());
            }

            let stage_name = stage.name();
            images = stage
                .transform(images, &self.context)
                .with_context(|| format!("Stage '{}' failed", stage_name))?;

            if images.is_empty() {
                bail!("Stage '{}' produced no images", stage_name);
            }

            if let Some(debug_config) = &self.context.debug {
                if debug_config.enabled {
                    let stage_dir_name = format!(
                        "{:02}_{}",
                        stage_idx + 1,
                        stage_name.to_lowercase().replace(' ', "_")
                    );
                    let stage_dir = debug_config.output_dir.join(&stage_dir_name);
                    std::fs::create_dir_all(&stage_dir)?;

                    for (idx, img) in images.iter().enumerate() {
                        img.save(stage_dir.join(format!("{:02}.png", idx + 1)))
                            .context("Failed to save debug image")?;
                    }

                    if self.context.verbose {
                        println!("  Debug: saved {} images to {}/", images.len(), stage_dir_name);
                    }
                }
            }

            if self.context.verbose {
                println!("  → {} images", images.len());
            }
        }

        Ok(images)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

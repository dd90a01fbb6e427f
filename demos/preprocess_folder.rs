use clap::Parser;
use image::ImageReader;
use nerfup::preprocessing::build_pipeline;
use std::path::PathBuf;

/// Run the reconstruction preprocessing pipeline over a folder of images
/// without starting the server, writing results next to the originals.
#[derive(Parser)]
#[command(name = "preprocess_folder")]
struct Cli {
    /// Directory of images to preprocess in place
    #[arg(value_name = "DIR")]
    images: PathBuf,

    /// Preprocessing stages to apply after the initial resize
    #[arg(short, long, value_name = "STAGE")]
    stages: Vec<String>,

    /// Enable verbose per-stage output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let pipeline = build_pipeline(&args.stages, args.verbose)?;

    let mut count = 0;
    for entry in std::fs::read_dir(&args.images)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Ok(reader) = ImageReader::open(&path) else {
            continue;
        };
        let Ok(img) = reader.decode() else {
            eprintln!("Skipping {} (not an image)", path.display());
            continue;
        };

        let outputs = pipeline.run(img)?;
        outputs[0].save(&path)?;
        count += 1;
    }

    println!("Preprocessed {} images", count);
    Ok(())
}

use image::ImageReader;
use nerfup::Pipeline;
use nerfup::preprocessing::{BilateralFilter, Clahe, Resize, WhiteBalance};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }

    let image_path = &args[1];
    let img = ImageReader::open(image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    println!("Loaded image: {}x{}", img.width(), img.height());

    // Example 1: the reconstruction-default chain
    println!("\n=== Reconstruction Preprocessing ===");
    let standard = Pipeline::new()
        .with_verbose(true)
        .add_stage_boxed(Box::new(Resize::new(2773, 1560)))
        .add_stage_boxed(Box::new(Clahe::new(2.0, (8, 8))))
        .add_stage_boxed(Box::new(BilateralFilter::default()));

    let outputs = standard.run(img.clone())?;
    println!(
        "Produced {} image(s), first is {}x{}",
        outputs.len(),
        outputs[0].width(),
        outputs[0].height()
    );

    // Example 2: custom parameters for low-contrast indoor shots
    println!("\n=== Custom Pipeline (Aggressive CLAHE) ===");
    let custom = Pipeline::new()
        .add_stage_boxed(Box::new(Resize::new(1400, 800)))
        .add_stage_boxed(Box::new(Clahe::new(4.0, (16, 16))))  // stronger local contrast
        .add_stage_boxed(Box::new(WhiteBalance::new(95.0)));  // ignore specular highlights

    let custom_outputs = custom.run(img)?;
    if let Some(first) = custom_outputs.first() {
        first.save("preprocessed.png")?;
        println!("Saved preprocessed.png ({}x{})", first.width(), first.height());
    }

    Ok(())
}

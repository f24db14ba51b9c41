use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use digitdraw::{AppConfig, DigitPredictor, PredictOutcome};

#[derive(Parser)]
#[command(name = "digitdraw")]
#[command(about = "Segment and recognize handwritten digits on a drawn canvas")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the model checkpoint path
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Override the directory for composites and glyph crops
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// Save segmentation debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// IMAGE holds a base64 data URL instead of raw image bytes
    #[arg(long)]
    data_url: bool,

    /// Report the three best labels per glyph
    #[arg(long)]
    ranked: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(checkpoint) = args.checkpoint {
        config.model.checkpoint = checkpoint;
    }
    if let Some(static_dir) = args.static_dir {
        config.output.static_dir = static_dir;
    }
    if args.debug_out.is_some() {
        config.output.debug_dir = args.debug_out;
    }
    if args.ranked {
        config.output.ranked_predictions = true;
    }

    // Fails here, before any prediction, if the checkpoint is unusable
    let predictor = DigitPredictor::from_config(&config)?;

    info!(image = %args.image_path.display(), "running prediction");
    let outcome = if args.data_url {
        let data_url = std::fs::read_to_string(&args.image_path)?;
        predictor.predict_data_url(&data_url)?
    } else {
        let bytes = std::fs::read(&args.image_path)?;
        predictor.predict(&bytes)?
    };

    match &outcome {
        PredictOutcome::NothingDrawn => println!("{}", outcome),
        PredictOutcome::Predicted(report) if args.json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        PredictOutcome::Predicted(report) => {
            println!("\n=== Digit Recognition Results ===");
            println!("Prediction: {}", report.prediction);
            println!("Glyphs recognized so far: {}", report.counter);
            println!("Annotated image: {}", report.composite.display());

            println!("\nDetected glyphs:");
            for (i, region) in report.regions.iter().enumerate() {
                let label = report.prediction.split(' ').nth(i).unwrap_or("?");
                print!(
                    "  {} at ({}, {}) {}x{} -> {}",
                    i + 1,
                    region.x,
                    region.y,
                    region.width,
                    region.height,
                    label
                );
                if let Some(ranked) = report.ranked.as_ref().and_then(|r| r.get(i)) {
                    print!("  [top 3: {}]", ranked.join(", "));
                }
                if let Some(path) = report.glyph_images.get(i) {
                    print!("  ({})", path.display());
                }
                println!();
            }

            match &report.archive_key {
                Some(key) => println!("\nArchived as {}", key),
                None => println!("\nUpload not archived"),
            }
        }
    }

    Ok(())
}

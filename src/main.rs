use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use platescan::toll::{TollLedger, TollSchedule, VehicleCategory};
use platescan::{PipelineConfig, PlatePipeline};

#[derive(Parser)]
#[command(name = "platescan")]
#[command(about = "Locate and read vehicle license plates in an image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON pipeline configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Canny low threshold
    #[arg(long)]
    low: Option<f32>,

    /// Canny high threshold
    #[arg(long)]
    high: Option<f32>,

    /// Minimum candidate bounding-box area (exclusive)
    #[arg(long)]
    min_area: Option<u64>,

    /// Recognition worker threads (default: all cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Per-region recognition timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory with text-detection.rten and text-recognition.rten
    #[arg(long, value_name = "DIR")]
    models_dir: Option<PathBuf>,

    /// Only list candidate regions, skip recognition
    #[arg(long)]
    skip_ocr: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Vehicle category passing the booth; repeat for several vehicles
    #[arg(long = "vehicle", value_enum, value_name = "CATEGORY")]
    vehicles: Vec<VehicleCategory>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "platescan=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(low) = args.low {
        config.preprocess.low_threshold = low;
    }
    if let Some(high) = args.high {
        config.preprocess.high_threshold = high;
    }
    if let Some(min_area) = args.min_area {
        config.detector.min_area = min_area;
    }
    if let Some(workers) = args.workers {
        config.recognizer.workers = Some(workers);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.recognizer.region_timeout_ms = timeout_ms;
    }
    if let Some(dir) = &args.models_dir {
        config.recognizer.models_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let config = build_config(&args)?;
    let pipeline = PlatePipeline::with_ocrs(config)?;

    if args.skip_ocr {
        let regions = pipeline.candidates(&args.image_path)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&regions)?);
        } else {
            println!("Candidate regions: {}", regions.len());
            for r in &regions {
                println!("  ({}, {}) {}x{}", r.x, r.y, r.width, r.height);
            }
        }
        return Ok(());
    }

    let outcome = pipeline
        .run(&args.image_path)
        .with_context(|| format!("Failed to process {}", args.image_path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        if outcome.is_empty() {
            println!("No number plates detected.");
        }
        for result in &outcome.results {
            println!("Detected Number Plate: {}", result.text);
        }
        if outcome.failed > 0 {
            println!("{} region(s) could not be read", outcome.failed);
        }
    }

    if !args.vehicles.is_empty() {
        let mut ledger = TollLedger::new(TollSchedule::default());
        for &vehicle in &args.vehicles {
            let toll = ledger.charge(vehicle);
            if vehicle.is_exempt() {
                println!("Toll for {:?}: exempted", vehicle);
            } else {
                println!("Toll for {:?}: ₹{:.2}", vehicle, toll);
            }
        }
        println!("Collected Tolls: ₹{:.2}", ledger.collected());
    }

    Ok(())
}

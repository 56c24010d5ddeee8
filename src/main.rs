// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sideband_classifier::classification::{Classifier, ClassifierSettings, LogProgress};
use sideband_classifier::{histogram, io, Config};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mainband / sideband classification of CRES track data
#[derive(Parser, Debug)]
#[command(name = "sideband-classifier")]
#[command(author, version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify tracks and write `<input>_with_sidebands.csv`
    Classify(ClassifyArgs),
    /// Bin the axial frequencies of a classified file by field
    Histogram(HistogramArgs),
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Track CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV (default: next to the input with a `_with_sidebands` suffix)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum axial frequency per field in MHz, ascending field order
    #[arg(long, num_args = 1..)]
    min_mhz: Vec<f64>,

    /// Maximum axial frequency per field in MHz, ascending field order
    #[arg(long, num_args = 1..)]
    max_mhz: Vec<f64>,

    /// Number of points per track to check
    #[arg(long)]
    points: Option<usize>,

    /// Classify groups one at a time
    #[arg(long)]
    sequential: bool,

    /// Also write the band counts as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct HistogramArgs {
    /// Classified CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Bin CSV (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    Ok(config)
}

fn init_logging(level: &str) {
    let default_filter = format!("sideband_classifier={}", level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging.level);

    match cli.command {
        Commands::Classify(args) => run_classify(&mut config, args),
        Commands::Histogram(args) => run_histogram(&config, args),
    }
}

fn run_classify(config: &mut Config, args: ClassifyArgs) -> Result<()> {
    if !args.min_mhz.is_empty() || !args.max_mhz.is_empty() {
        config.set_tolerances_mhz(&args.min_mhz, &args.max_mhz)?;
    }
    if let Some(points) = args.points {
        config.classification.points_per_track = points;
    }
    if args.sequential {
        config.classification.parallel_groups = false;
    }
    config.validate()?;

    let mut table = io::read_tracks_from_path(&args.input)
        .with_context(|| format!("Failed to read tracks from {}", args.input.display()))?;
    if table.is_empty() {
        bail!("{} contains no tracks", args.input.display());
    }

    let fields = table.distinct_fields();
    info!("Detected fields: {:?}", fields);
    let ranges = config.tolerance_ranges(&fields)?;
    info!("✓ Tolerance ranges set for {} field(s)", ranges.len());

    let started = Instant::now();
    let classifier = Classifier::new(ClassifierSettings::from(&config.classification));
    let progress = LogProgress::new(config.progress.interval_percent);
    let summary = classifier.classify(&mut table, &ranges, &progress)?;

    let elapsed = started.elapsed().as_secs_f64();
    info!(
        "Time elapsed: {} min {:.2} s",
        (elapsed / 60.0).floor(),
        elapsed % 60.0
    );

    let output = args
        .output
        .unwrap_or_else(|| io::default_output_path(&args.input));
    io::write_tracks_to_path(&table, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    summary.log();

    if let Some(path) = args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        info!("✓ Summary written to {}", path.display());
    }

    Ok(())
}

fn run_histogram(config: &Config, args: HistogramArgs) -> Result<()> {
    let file = std::fs::File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let histograms = histogram::histograms_from_csv(file, &config.histogram)?;

    match args.output {
        Some(path) => {
            let out = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            histogram::write_histograms(&histograms, out)?;
            info!("✓ Histogram bins written to {}", path.display());
        }
        None => histogram::write_histograms(&histograms, std::io::stdout().lock())?,
    }

    Ok(())
}

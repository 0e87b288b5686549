//! Offline trainer: fits the default-prediction model on a historical dataset,
//! prints the hold-out evaluation and writes the artifact the dashboard
//! scores with.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use credit_dash::data::{DataSource, LoadOptions, load_dataset};
use credit_dash::scoring::{TrainingConfig, train, write_calibration_plot};

#[derive(Parser, Debug)]
#[command(name = "train-model", about = "Fit the credit default model and write its artifact")]
struct Args {
    /// Training data, path or URL (.xlsx, .csv, .parquet, .json)
    #[arg(short, long)]
    input: String,

    /// Sheet to read from spreadsheet inputs
    #[arg(long, default_value = "Data")]
    sheet: String,

    /// Where to write the model artifact
    #[arg(short, long, default_value = "Dashboard/default_model.json")]
    output: PathBuf,

    /// Evaluation report JSON [default: <output>.report.json]
    #[arg(long)]
    report: Option<PathBuf>,

    /// Fraction of records held out for evaluation
    #[arg(long, default_value_t = 0.4)]
    test_size: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 500)]
    max_iter: u64,

    /// L2 regularization strength
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,

    #[arg(long, default_value_t = 10)]
    calibration_bins: usize,

    /// Render the calibration curve to this SVG file
    #[arg(long)]
    calibration_plot: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            test_fraction: self.test_size,
            seed: self.seed,
            max_iterations: self.max_iter,
            alpha: self.alpha,
            calibration_bins: self.calibration_bins,
        }
    }

    fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| self.output.with_extension("report.json"))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let start = Instant::now();

    let source = DataSource::parse(&args.input);
    let options = LoadOptions {
        sheet: args.sheet.clone(),
        format: None,
        timeout: Duration::from_secs(60),
    };
    let dataset = load_dataset(&source, &options)
        .with_context(|| format!("loading training data from {source}"))?;
    println!("✓ Data loaded: {} records", dataset.len());

    let outcome = train(&dataset, &args.training_config()).context("training the model")?;
    println!("✓ Model fitted ({} features)\n", outcome.artifact.feature_names.len());
    println!("{}", outcome.report);

    outcome
        .artifact
        .save(&args.output)
        .with_context(|| format!("writing artifact {}", args.output.display()))?;
    let report_path = args.report_path();
    outcome
        .report
        .save_json(&report_path)
        .with_context(|| format!("writing report {}", report_path.display()))?;

    if let Some(plot) = &args.calibration_plot {
        write_calibration_plot(&outcome.report.calibration, plot)
            .with_context(|| format!("rendering calibration plot {}", plot.display()))?;
        println!("Calibration plot saved to: {}", plot.display());
    }

    println!("\nModel saved to: {}", args.output.display());
    println!("Report saved to: {}", report_path.display());
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

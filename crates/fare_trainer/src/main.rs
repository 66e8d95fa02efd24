//! Taxi fare CLI
//!
//! Trains the fare model on the training CSV, reports R² and RMSE on the
//! test CSV and prints a prediction for one sample trip.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use taxi_fare_core::{Dataset, TripRecord};
use taxi_fare_trainer::report::{metrics_block, prediction_block, REFERENCE_FARE};
use taxi_fare_trainer::{evaluate, taxi_fare_pipeline, AppConfig, PredictionEngine};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "taxi-fare")]
#[command(author = "Taxi Fare Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate a taxi fare regression model", long_about = None)]
struct Args {
    /// Directory holding the train and test CSV files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Training CSV, relative to the data directory unless absolute
    #[arg(long)]
    train: Option<PathBuf>,

    /// Test CSV, relative to the data directory unless absolute
    #[arg(long)]
    test: Option<PathBuf>,

    /// Write the trained model (JSON) and its hash to this path
    #[arg(long)]
    model_out: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for row subsampling
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = load_config(&args)?;
    run(&config)
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(dir) = &args.data_dir {
        config.paths.data_dir = dir.clone();
    }
    if let Some(train) = &args.train {
        config.paths.train_file = train.clone();
    }
    if let Some(test) = &args.test {
        config.paths.test_file = test.clone();
    }
    if let Some(path) = &args.model_out {
        config.paths.model_path = Some(path.clone());
    }
    if let Some(seed) = args.seed {
        config.trainer.seed = seed;
    }

    Ok(config)
}

fn run(config: &AppConfig) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    println!("{}", cwd.display());

    info!("Taxi fare trainer v{}", taxi_fare_trainer::VERSION);
    info!(
        trees = config.trainer.number_of_trees,
        leaves = config.trainer.number_of_leaves,
        min_leaf = config.trainer.minimum_example_count_per_leaf,
        learning_rate = config.trainer.learning_rate,
        seed = config.trainer.seed,
        "training configuration"
    );

    let train_path = config.train_path();
    info!("Loading training data from: {}", train_path.display());
    let train = Dataset::from_csv(&train_path)
        .with_context(|| format!("Failed to load training data from {}", train_path.display()))?;
    if let Some(summary) = train.summary() {
        info!(
            rows = summary.rows,
            fare_min = summary.fare_min,
            fare_max = summary.fare_max,
            fare_mean = summary.fare_mean,
            vendors = summary.vendors,
            rate_codes = summary.rate_codes,
            payment_types = summary.payment_types,
            "training data loaded"
        );
    }

    let model = taxi_fare_pipeline(config.trainer.clone())
        .fit(&train)
        .context("Failed to train model")?;

    if let Some(path) = &config.paths.model_path {
        let hash = model
            .save(path)
            .with_context(|| format!("Failed to save model to {}", path.display()))?;
        info!("Model saved to {} ({})", path.display(), hash);
    }

    let test_path = config.test_path();
    info!("Loading test data from: {}", test_path.display());
    let test = Dataset::from_csv(&test_path)
        .with_context(|| format!("Failed to load test data from {}", test_path.display()))?;

    let metrics = evaluate(&model, &test).context("Failed to evaluate model")?;
    println!("{}", metrics_block(&metrics));
    info!(mae = metrics.mae, mse = metrics.mse, rows = metrics.count, "evaluation metrics");

    let prediction = PredictionEngine::new(&model)
        .predict(&TripRecord::sample())
        .context("Failed to predict sample fare")?;
    println!("{}", prediction_block(prediction.fare_amount, REFERENCE_FARE));

    Ok(())
}

//! Taxi fare trainer - FastTree-style regression over trip records
//!
//! Builds the fixed taxi fare feature pipeline, fits a deterministic
//! gradient-boosted tree ensemble on it, evaluates the result and scores
//! single trips.

pub mod binning;
pub mod cart;
pub mod config;
pub mod deterministic;
pub mod evaluate;
pub mod histogram;
pub mod pipeline;
pub mod prediction;
pub mod report;
pub mod trainer;

use std::path::Path;

use taxi_fare_core::{Dataset, Result};

pub use config::{AppConfig, ConfigError, PathsConfig};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use evaluate::evaluate;
pub use pipeline::{taxi_fare_pipeline, Pipeline, TrainedModel};
pub use prediction::{FarePrediction, PredictionEngine};
pub use trainer::{FastTreeConfig, FastTreeTrainer};

/// Load a training CSV and fit the taxi fare pipeline on it
pub fn train_model_from_csv(path: &Path, config: FastTreeConfig) -> Result<TrainedModel> {
    let dataset = Dataset::from_csv(path)?;
    taxi_fare_pipeline(config).fit(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

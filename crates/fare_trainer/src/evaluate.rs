//! Test-set evaluation

use taxi_fare_core::{Dataset, FareError, Frame, RegressionMetrics, Result};
use tracing::{debug, instrument};

use crate::pipeline::TrainedModel;

/// Score every test row and compare the `Score` column with the label column
#[instrument(skip_all, fields(rows = dataset.len()))]
pub fn evaluate(model: &TrainedModel, dataset: &Dataset) -> Result<RegressionMetrics> {
    if dataset.is_empty() {
        return Err(FareError::Evaluation("test set is empty".into()));
    }

    let mut frame = Frame::from_dataset(dataset);
    let scores = model.transform(&mut frame).map_err(|e| match e {
        FareError::Evaluation(_) => e,
        other => FareError::Evaluation(other.to_string()),
    })?;
    let labels = frame
        .numbers(&model.label_column)
        .map_err(|e| FareError::Evaluation(e.to_string()))?;

    let metrics = RegressionMetrics::compute(&scores, labels)?;
    debug!(
        r_squared = metrics.r_squared,
        rmse = metrics.rmse,
        mae = metrics.mae,
        "evaluation finished"
    );
    Ok(metrics)
}

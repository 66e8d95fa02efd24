//! Regression quality metrics
//!
//! Computed over paired predictions and labels in a single pass.

use serde::{Deserialize, Serialize};

use crate::errors::{FareError, Result};

/// Aggregate regression metrics over a scored set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Coefficient of determination, `1 - SS_res / SS_tot`
    pub r_squared: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean squared error
    pub mse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Number of scored rows
    pub count: usize,
}

impl RegressionMetrics {
    /// Compare predictions with labels.
    ///
    /// Fails with `Evaluation` when there are no rows or the slices differ in
    /// length. When every label is identical, R² is 1 for a perfect fit and 0
    /// otherwise.
    pub fn compute(predictions: &[f64], labels: &[f32]) -> Result<Self> {
        if predictions.len() != labels.len() {
            return Err(FareError::Evaluation(format!(
                "{} predictions for {} labels",
                predictions.len(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(FareError::Evaluation("test set is empty".to_string()));
        }
        if let Some(row) = labels.iter().position(|l| !l.is_finite()) {
            return Err(FareError::Evaluation(format!("label at row {} is not finite", row)));
        }
        if let Some(row) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(FareError::Evaluation(format!("prediction at row {} is not finite", row)));
        }

        let n = labels.len() as f64;
        let mean = labels.iter().map(|&l| l as f64).sum::<f64>() / n;

        let mut ss_res = 0.0f64;
        let mut ss_tot = 0.0f64;
        let mut abs_sum = 0.0f64;
        for (&p, &l) in predictions.iter().zip(labels) {
            let l = l as f64;
            let err = p - l;
            ss_res += err * err;
            abs_sum += err.abs();
            let dev = l - mean;
            ss_tot += dev * dev;
        }

        let r_squared = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };
        let mse = ss_res / n;

        Ok(Self {
            r_squared,
            rmse: mse.sqrt(),
            mse,
            mae: abs_sum / n,
            count: labels.len(),
        })
    }
}

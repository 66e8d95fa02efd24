//! Single-trip prediction

use serde::{Deserialize, Serialize};
use taxi_fare_core::{FareError, Frame, Result, TripRecord};
use tracing::debug;

use crate::pipeline::TrainedModel;

/// Predicted fare for one trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarePrediction {
    pub fare_amount: f32,
}

/// Scores individual trips against a trained model
pub struct PredictionEngine<'a> {
    model: &'a TrainedModel,
}

impl<'a> PredictionEngine<'a> {
    pub fn new(model: &'a TrainedModel) -> Self {
        Self { model }
    }

    /// Predict the fare of one trip; `fare_amount` on the input is ignored
    pub fn predict(&self, trip: &TripRecord) -> Result<FarePrediction> {
        if !trip.trip_distance.is_finite() {
            return Err(FareError::Prediction(format!(
                "trip distance is not finite: {}",
                trip.trip_distance
            )));
        }
        if !trip.fare_amount.is_finite() {
            return Err(FareError::Prediction(format!(
                "fare amount placeholder is not finite: {}",
                trip.fare_amount
            )));
        }

        let mut frame = Frame::from_record(trip);
        let scores = self
            .model
            .transform(&mut frame)
            .map_err(|e| FareError::Prediction(e.to_string()))?;

        let score = match scores.as_slice() {
            [score] if score.is_finite() => *score,
            [score] => return Err(FareError::Prediction(format!("score is not finite: {}", score))),
            _ => {
                return Err(FareError::Prediction(format!(
                    "expected one score, got {}",
                    scores.len()
                )))
            }
        };

        debug!(vendor = %trip.vendor_id, distance = trip.trip_distance, score, "trip scored");
        Ok(FarePrediction {
            fare_amount: score as f32,
        })
    }
}

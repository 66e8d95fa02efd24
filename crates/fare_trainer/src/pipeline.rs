//! Feature pipeline and trained model
//!
//! A [`Pipeline`] is an ordered list of column transforms followed by a
//! trainer step. Fitting it against a [`Dataset`] learns the transform state
//! (one-hot vocabularies) and the tree ensemble, producing a
//! [`TrainedModel`] that scores any frame with the trip schema.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taxi_fare_core::frame::Column;
use taxi_fare_core::gbdt::Model;
use taxi_fare_core::schema::{self, ColumnKind, TRIP_COLUMNS, TRIP_COLUMN_KINDS};
use taxi_fare_core::transforms::{apply_chain, fit_chain};
use taxi_fare_core::{Dataset, FareError, FittedTransform, Frame, OneHotEncoder, Result, Transform};
use tracing::{info, instrument};

use crate::trainer::{FastTreeConfig, FastTreeTrainer};

pub const LABEL: &str = "Label";
pub const FEATURES: &str = "Features";
pub const SCORE: &str = "Score";
pub const VENDOR_ID_ENCODED: &str = "VendorIdEncoded";
pub const RATE_CODE_ENCODED: &str = "RateCodeEncoded";
pub const PAYMENT_TYPE_ENCODED: &str = "PaymentTypeEncoded";

/// Final pipeline step: which columns feed the regressor and how it trains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerStep {
    pub label_column: String,
    pub feature_column: String,
    pub config: FastTreeConfig,
}

/// Unfitted transform chain plus trainer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    transforms: Vec<Transform>,
    trainer: Option<TrainerStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_column(self, output: impl Into<String>, input: impl Into<String>) -> Self {
        self.append(Transform::copy_column(output, input))
    }

    pub fn one_hot_encoding(self, output: impl Into<String>, input: impl Into<String>) -> Self {
        self.append(Transform::one_hot_encoding(output, input))
    }

    pub fn concatenate<I, S>(self, output: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.append(Transform::concatenate(output, inputs))
    }

    pub fn append(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn append_trainer(
        mut self,
        label_column: impl Into<String>,
        feature_column: impl Into<String>,
        config: FastTreeConfig,
    ) -> Self {
        self.trainer = Some(TrainerStep {
            label_column: label_column.into(),
            feature_column: feature_column.into(),
            config,
        });
        self
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Check every transform input against the trip schema and the outputs
    /// of earlier transforms, then the trainer step.
    pub fn validate(&self) -> Result<()> {
        let mut known: Vec<(String, ColumnKind)> = TRIP_COLUMNS
            .iter()
            .zip(TRIP_COLUMN_KINDS.iter())
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect();

        for (step, transform) in self.transforms.iter().enumerate() {
            transform.resolve(&mut known).map_err(|e| {
                FareError::Training(format!("step {} ({}): {}", step + 1, transform.output(), e))
            })?;
        }

        let trainer = self
            .trainer
            .as_ref()
            .ok_or_else(|| FareError::Training("pipeline has no trainer step".into()))?;
        let kind_of = |name: &str| known.iter().find(|(n, _)| n == name).map(|(_, k)| *k);

        match kind_of(&trainer.label_column) {
            Some(ColumnKind::Number) => {}
            Some(kind) => {
                return Err(FareError::Training(format!(
                    "label column '{}' is {:?}, expected Number",
                    trainer.label_column, kind
                )))
            }
            None => {
                return Err(FareError::Training(format!(
                    "label column '{}' not found",
                    trainer.label_column
                )))
            }
        }
        match kind_of(&trainer.feature_column) {
            Some(ColumnKind::Vector) => {}
            Some(kind) => {
                return Err(FareError::Training(format!(
                    "feature column '{}' is {:?}, expected Vector",
                    trainer.feature_column, kind
                )))
            }
            None => {
                return Err(FareError::Training(format!(
                    "feature column '{}' not found",
                    trainer.feature_column
                )))
            }
        }

        trainer.config.validate()
    }

    /// Fit transforms and trainer against a training set
    #[instrument(skip_all, fields(rows = dataset.len()))]
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedModel> {
        self.validate()?;
        if dataset.is_empty() {
            return Err(FareError::Training("training set is empty".into()));
        }
        let Some(trainer) = self.trainer.as_ref() else {
            return Err(FareError::Training("pipeline has no trainer step".into()));
        };

        let mut frame = Frame::from_dataset(dataset);
        let transforms = fit_chain(&self.transforms, &mut frame).map_err(as_training)?;

        let (width, features) = frame.vectors(&trainer.feature_column).map_err(as_training)?;
        let labels = frame.numbers(&trainer.label_column).map_err(as_training)?;

        let model = FastTreeTrainer::new(trainer.config.clone()).train(features, width, labels)?;
        info!(features = width, trees = model.num_trees(), "pipeline fitted");

        Ok(TrainedModel {
            transforms,
            label_column: trainer.label_column.clone(),
            feature_column: trainer.feature_column.clone(),
            model,
        })
    }
}

fn as_training(err: FareError) -> FareError {
    match err {
        FareError::Training(_) => err,
        other => FareError::Training(other.to_string()),
    }
}

/// The fixed taxi fare pipeline
pub fn taxi_fare_pipeline(config: FastTreeConfig) -> Pipeline {
    Pipeline::new()
        .copy_column(LABEL, schema::FARE_AMOUNT)
        .one_hot_encoding(VENDOR_ID_ENCODED, schema::VENDOR_ID)
        .one_hot_encoding(RATE_CODE_ENCODED, schema::RATE_CODE)
        .one_hot_encoding(PAYMENT_TYPE_ENCODED, schema::PAYMENT_TYPE)
        .concatenate(
            FEATURES,
            [
                VENDOR_ID_ENCODED,
                RATE_CODE_ENCODED,
                schema::PASSENGER_COUNT,
                schema::TRIP_DISTANCE,
                PAYMENT_TYPE_ENCODED,
            ],
        )
        .append_trainer(LABEL, FEATURES, config)
}

/// Fitted pipeline: learned transforms plus tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub transforms: Vec<FittedTransform>,
    pub label_column: String,
    pub feature_column: String,
    pub model: Model,
}

impl TrainedModel {
    /// Run the fitted transforms over a frame and append a `Score` column.
    ///
    /// Returns the raw scores, one per row.
    pub fn transform(&self, frame: &mut Frame) -> Result<Vec<f64>> {
        apply_chain(&self.transforms, frame)?;

        let (width, features) = frame.vectors(&self.feature_column)?;
        if width != self.model.num_features {
            return Err(FareError::Model(format!(
                "feature column '{}' has width {}, model expects {}",
                self.feature_column, width, self.model.num_features
            )));
        }

        let scores = self.model.score_rows(features);
        frame.set_column(SCORE, Column::Number(scores.iter().map(|&s| s as f32).collect()))?;
        Ok(scores)
    }

    /// Vocabulary learned for a text column
    pub fn encoder(&self, input_column: &str) -> Option<&OneHotEncoder> {
        self.transforms.iter().find_map(|step| match step {
            FittedTransform::OneHotEncoding { input, encoder, .. } if input == input_column => {
                Some(encoder)
            }
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// BLAKE3 hash of the JSON form, hex encoded
    pub fn hash_hex(&self) -> Result<String> {
        Ok(content_hash(&self.to_json()?))
    }

    /// Write the model as JSON and its hash to `<path>.hash`; returns the hash
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let hash = content_hash(&json);

        fs::write(path, &json).map_err(|e| FareError::io(path, e))?;
        let hash_path = hash_path(path);
        fs::write(&hash_path, &hash).map_err(|e| FareError::io(&hash_path, e))?;

        info!(path = %path.display(), hash = %hash, "model saved");
        Ok(hash)
    }

    /// Load a saved model, checking it against the hash file when present
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| FareError::io(path, e))?;

        let hash_path = hash_path(path);
        if hash_path.exists() {
            let expected = fs::read_to_string(&hash_path).map_err(|e| FareError::io(&hash_path, e))?;
            let actual = content_hash(&json);
            if expected.trim() != actual {
                return Err(FareError::Model(format!(
                    "hash mismatch for {}: expected {}, found {}",
                    path.display(),
                    expected.trim(),
                    actual
                )));
            }
        }

        let trained: TrainedModel = serde_json::from_str(&json)?;
        trained.model.validate()?;
        Ok(trained)
    }
}

fn content_hash(json: &str) -> String {
    hex::encode(blake3::hash(json.as_bytes()).as_bytes())
}

/// `<path>.hash`
pub fn hash_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".hash");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_fare_core::TripRecord;

    fn small_config() -> FastTreeConfig {
        FastTreeConfig {
            number_of_trees: 5,
            minimum_example_count_per_leaf: 2,
            ..Default::default()
        }
    }

    fn trips() -> Dataset {
        let mut records = Vec::new();
        for i in 0..24 {
            let mut trip = TripRecord::sample();
            trip.vendor_id = if i % 2 == 0 { "VTS" } else { "CMT" }.to_string();
            trip.payment_type = if i % 3 == 0 { "CSH" } else { "CRD" }.to_string();
            trip.trip_distance = 0.5 + i as f32 * 0.5;
            trip.fare_amount = 3.0 + trip.trip_distance * 2.5;
            records.push(trip);
        }
        Dataset::new(records)
    }

    #[test]
    fn test_taxi_pipeline_layout() {
        let pipeline = taxi_fare_pipeline(FastTreeConfig::default());
        assert_eq!(pipeline.transforms().len(), 5);
        assert_eq!(pipeline.transforms()[0], Transform::copy_column(LABEL, schema::FARE_AMOUNT));
        assert_eq!(
            pipeline.transforms()[4].inputs(),
            vec![
                VENDOR_ID_ENCODED,
                RATE_CODE_ENCODED,
                schema::PASSENGER_COUNT,
                schema::TRIP_DISTANCE,
                PAYMENT_TYPE_ENCODED
            ]
        );
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unresolved_inputs() {
        let pipeline = Pipeline::new()
            .copy_column(LABEL, schema::FARE_AMOUNT)
            .concatenate(FEATURES, [VENDOR_ID_ENCODED])
            .append_trainer(LABEL, FEATURES, FastTreeConfig::default());
        assert!(matches!(pipeline.validate(), Err(FareError::Training(_))));

        let no_trainer = Pipeline::new().copy_column(LABEL, schema::FARE_AMOUNT);
        assert!(matches!(no_trainer.validate(), Err(FareError::Training(_))));

        let text_label = Pipeline::new()
            .concatenate(FEATURES, [schema::TRIP_DISTANCE])
            .append_trainer(schema::VENDOR_ID, FEATURES, FastTreeConfig::default());
        assert!(matches!(text_label.validate(), Err(FareError::Training(_))));
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        let pipeline = taxi_fare_pipeline(small_config());
        let result = pipeline.fit(&Dataset::default());
        assert!(matches!(result, Err(FareError::Training(_))));
    }

    #[test]
    fn test_fit_and_transform() {
        let dataset = trips();
        let trained = taxi_fare_pipeline(small_config()).fit(&dataset).unwrap();

        // 2 vendors + 1 rate code + passenger count + distance + 2 payment types
        assert_eq!(trained.model.num_features, 7);
        assert_eq!(
            trained.encoder(schema::VENDOR_ID).unwrap().categories(),
            ["VTS", "CMT"]
        );
        assert!(trained.encoder(schema::TRIP_TIME).is_none());

        let mut frame = Frame::from_dataset(&dataset);
        let scores = trained.transform(&mut frame).unwrap();
        assert_eq!(scores.len(), dataset.len());
        assert_eq!(frame.numbers(SCORE).unwrap().len(), dataset.len());
    }

    #[test]
    fn test_save_and_load() {
        let trained = taxi_fare_pipeline(small_config()).fit(&trips()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let hash = trained.save(&path).unwrap();
        assert_eq!(hash, trained.hash_hex().unwrap());
        assert_eq!(fs::read_to_string(hash_path(&path)).unwrap(), hash);

        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded, trained);

        fs::write(hash_path(&path), "00").unwrap();
        assert!(matches!(TrainedModel::load(&path), Err(FareError::Model(_))));
    }
}

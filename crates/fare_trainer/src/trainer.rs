//! Gradient boosted regression trainer
//!
//! FastTree-style boosting with squared-error loss: features are binned
//! once, the initial score is the label mean, and each tree is grown
//! leaf-wise on gradient histograms and shrunk by the learning rate.

use serde::{Deserialize, Serialize};
use taxi_fare_core::gbdt::Model;
use taxi_fare_core::{FareError, Result};
use tracing::{debug, info};

use crate::binning::BinnedMatrix;
use crate::cart::{CartBuilder, TreeConfig};
use crate::deterministic::{sample_rows, LcgRng};

/// Boosting hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastTreeConfig {
    pub number_of_trees: usize,
    pub number_of_leaves: usize,
    pub minimum_example_count_per_leaf: usize,
    pub learning_rate: f64,
    pub maximum_bin_count_per_feature: usize,
    /// Fraction of rows each tree sees; 1.0 disables subsampling
    pub bagging_fraction: f64,
    pub seed: u64,
}

impl Default for FastTreeConfig {
    fn default() -> Self {
        Self {
            number_of_trees: 100,
            number_of_leaves: 20,
            minimum_example_count_per_leaf: 10,
            learning_rate: 0.2,
            maximum_bin_count_per_feature: 255,
            bagging_fraction: 1.0,
            seed: 0,
        }
    }
}

impl FastTreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.number_of_trees == 0 {
            return Err(FareError::Training("number_of_trees must be at least 1".into()));
        }
        if self.number_of_leaves < 2 {
            return Err(FareError::Training(format!(
                "number_of_leaves must be at least 2, got {}",
                self.number_of_leaves
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(FareError::Training(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.bagging_fraction > 0.0 && self.bagging_fraction <= 1.0) {
            return Err(FareError::Training(format!(
                "bagging_fraction must be in (0, 1], got {}",
                self.bagging_fraction
            )));
        }
        if self.maximum_bin_count_per_feature < 2 {
            return Err(FareError::Training(format!(
                "maximum_bin_count_per_feature must be at least 2, got {}",
                self.maximum_bin_count_per_feature
            )));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            num_leaves: self.number_of_leaves,
            min_samples_leaf: self.minimum_example_count_per_leaf,
            min_split_gain: 0.0,
        }
    }
}

/// Boosted tree trainer
pub struct FastTreeTrainer {
    config: FastTreeConfig,
}

impl FastTreeTrainer {
    pub fn new(config: FastTreeConfig) -> Self {
        Self { config }
    }

    /// Train on a row-major feature matrix with `num_features` columns
    pub fn train(&self, features: &[f32], num_features: usize, labels: &[f32]) -> Result<Model> {
        self.config.validate()?;

        let n_samples = labels.len();
        if n_samples == 0 {
            return Err(FareError::Training("training set is empty".into()));
        }
        if num_features == 0 {
            return Err(FareError::Training("feature vector is empty".into()));
        }
        if features.len() != n_samples * num_features {
            return Err(FareError::Training(format!(
                "expected {} feature values for {} rows, got {}",
                n_samples * num_features,
                n_samples,
                features.len()
            )));
        }
        if let Some(row) = labels.iter().position(|l| !l.is_finite()) {
            return Err(FareError::Training(format!("label at row {} is not finite", row)));
        }

        let bias = labels.iter().map(|&l| l as f64).sum::<f64>() / n_samples as f64;
        let mut predictions = vec![bias; n_samples];

        let matrix = BinnedMatrix::from_rows(
            features,
            n_samples,
            num_features,
            self.config.maximum_bin_count_per_feature,
        );
        debug!(
            rows = n_samples,
            features = num_features,
            bins = matrix.layout().iter().sum::<usize>(),
            "features binned"
        );

        let hessians = vec![1.0; n_samples];
        let mut rng = LcgRng::new(self.config.seed);
        let mut trees = Vec::with_capacity(self.config.number_of_trees);

        for tree_idx in 0..self.config.number_of_trees {
            let gradients = squared_loss_gradients(labels, &predictions);
            let rows = sample_rows(n_samples, self.config.bagging_fraction, &mut rng);

            let builder = CartBuilder::new(&matrix, &gradients, &hessians, self.config.tree_config());
            let tree = builder.build(rows, self.config.learning_rate);

            for (row, prediction) in predictions.iter_mut().enumerate() {
                *prediction += tree.evaluate(&features[row * num_features..(row + 1) * num_features]);
            }

            debug!(
                tree = tree_idx + 1,
                leaves = tree.num_leaves(),
                train_rmse = rmse(labels, &predictions),
                "tree trained"
            );
            trees.push(tree);
        }

        info!(
            trees = trees.len(),
            rows = n_samples,
            features = num_features,
            bias,
            train_rmse = rmse(labels, &predictions),
            "boosting finished"
        );

        let model = Model::new(trees, bias, num_features);
        model.validate()?;
        Ok(model)
    }
}

/// gradient = prediction - label, hessian = 1
fn squared_loss_gradients(labels: &[f32], predictions: &[f64]) -> Vec<f64> {
    labels
        .iter()
        .zip(predictions)
        .map(|(&label, &prediction)| prediction - label as f64)
        .collect()
}

fn rmse(labels: &[f32], predictions: &[f64]) -> f64 {
    let sum: f64 = labels
        .iter()
        .zip(predictions)
        .map(|(&label, &prediction)| (prediction - label as f64).powi(2))
        .sum();
    (sum / labels.len().max(1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100 rows, label steps from 10 to 20 at x = 50, second feature is noise
    fn step_data() -> (Vec<f32>, Vec<f32>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..100 {
            features.push(i as f32);
            features.push((i % 7) as f32);
            labels.push(if i < 50 { 10.0 } else { 20.0 });
        }
        (features, labels)
    }

    #[test]
    fn test_default_config() {
        let config = FastTreeConfig::default();
        assert_eq!(config.number_of_trees, 100);
        assert_eq!(config.number_of_leaves, 20);
        assert_eq!(config.minimum_example_count_per_leaf, 10);
        assert_eq!(config.learning_rate, 0.2);
        assert_eq!(config.seed, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cases = [
            FastTreeConfig { number_of_trees: 0, ..Default::default() },
            FastTreeConfig { number_of_leaves: 1, ..Default::default() },
            FastTreeConfig { learning_rate: 0.0, ..Default::default() },
            FastTreeConfig { learning_rate: 1.5, ..Default::default() },
            FastTreeConfig { bagging_fraction: 0.0, ..Default::default() },
            FastTreeConfig { maximum_bin_count_per_feature: 1, ..Default::default() },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(FareError::Training(_))));
        }
    }

    #[test]
    fn test_fits_step_function() {
        let (features, labels) = step_data();
        let model = FastTreeTrainer::new(FastTreeConfig::default())
            .train(&features, 2, &labels)
            .unwrap();

        assert_eq!(model.num_trees(), 100);
        assert_eq!(model.bias, 15.0);
        assert!((model.score(&[10.0, 3.0]) - 10.0).abs() < 0.01);
        assert!((model.score(&[80.0, 3.0]) - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_training_is_deterministic() {
        let (features, labels) = step_data();
        let config = FastTreeConfig {
            bagging_fraction: 0.7,
            number_of_trees: 10,
            ..Default::default()
        };

        let a = FastTreeTrainer::new(config.clone()).train(&features, 2, &labels).unwrap();
        let b = FastTreeTrainer::new(config).train(&features, 2, &labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_input() {
        let trainer = FastTreeTrainer::new(FastTreeConfig::default());

        assert!(matches!(trainer.train(&[], 2, &[]), Err(FareError::Training(_))));
        assert!(matches!(
            trainer.train(&[1.0, 2.0, 3.0], 2, &[1.0, 2.0]),
            Err(FareError::Training(_))
        ));
        assert!(matches!(
            trainer.train(&[1.0, 2.0], 1, &[1.0, f32::NAN]),
            Err(FareError::Training(_))
        ));
    }

    #[test]
    fn test_constant_labels_give_bias_only() {
        let features: Vec<f32> = (0..30).map(|i| i as f32).collect();
        let labels = vec![7.5; 30];
        let model = FastTreeTrainer::new(FastTreeConfig::default())
            .train(&features, 1, &labels)
            .unwrap();

        assert_eq!(model.score(&[3.0]), 7.5);
        assert!(model.trees.iter().all(|t| t.num_leaves() == 1));
    }
}

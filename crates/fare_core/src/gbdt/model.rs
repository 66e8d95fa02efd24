//! Boosted tree ensemble
//!
//! Score is `bias + Σ tree.weight * leaf`. Models serialize with struct
//! fields in declaration order, so the same model always produces the same
//! JSON bytes.

use serde::{Deserialize, Serialize};

use super::tree::Tree;
use crate::errors::{FareError, Result};

/// Current serialized model format version
pub const MODEL_VERSION: i32 = 1;

/// Gradient-boosted regression ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Model format version
    pub version: i32,

    /// Width of the feature vector the trees index into
    pub num_features: usize,

    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,

    /// Initial score added to every prediction
    pub bias: f64,
}

impl Model {
    pub fn new(trees: Vec<Tree>, bias: f64, num_features: usize) -> Self {
        Self {
            version: MODEL_VERSION,
            num_features,
            trees,
            bias,
        }
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_VERSION {
            return Err(FareError::Model(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }
        if !self.bias.is_finite() {
            return Err(FareError::Model(format!("Invalid bias: {}", self.bias)));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| FareError::Model(format!("Tree {} validation failed: {}", i, e)))?;
            let out_of_range = tree
                .nodes
                .iter()
                .any(|n| !n.is_leaf() && n.feature_idx as usize >= self.num_features);
            if out_of_range {
                return Err(FareError::Model(format!(
                    "Tree {} splits on a feature beyond {}",
                    i, self.num_features
                )));
            }
        }

        Ok(())
    }

    /// Raw score for one feature vector
    pub fn score(&self, features: &[f32]) -> f64 {
        self.trees
            .iter()
            .fold(self.bias, |sum, tree| sum + tree.evaluate(features))
    }

    /// Scores for a row-major feature matrix of `num_features` columns
    pub fn score_rows(&self, features: &[f32]) -> Vec<f64> {
        if self.num_features == 0 {
            return Vec::new();
        }
        features
            .chunks(self.num_features)
            .map(|row| self.score(row))
            .collect()
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_model() -> Model {
        let tree1 = Tree::new(
            vec![
                Node::internal(0, 0, 5.0, 1, 2),
                Node::leaf(1, -1.0),
                Node::leaf(2, 1.0),
            ],
            0.5,
        );
        let tree2 = Tree::new(
            vec![
                Node::internal(0, 1, 2.0, 1, 2),
                Node::leaf(1, 4.0),
                Node::leaf(2, 8.0),
            ],
            0.5,
        );
        Model::new(vec![tree1, tree2], 10.0, 2)
    }

    #[test]
    fn test_model_score() {
        let model = create_test_model();
        assert!(model.validate().is_ok());

        // 10 + 0.5 * -1 + 0.5 * 4
        assert_eq!(model.score(&[1.0, 1.0]), 11.5);
        // 10 + 0.5 * 1 + 0.5 * 8
        assert_eq!(model.score(&[9.0, 3.0]), 14.5);
        assert_eq!(model.score_rows(&[1.0, 1.0, 9.0, 3.0]), vec![11.5, 14.5]);
    }

    #[test]
    fn test_validation_rejects_out_of_range_feature() {
        let mut model = create_test_model();
        model.num_features = 1;
        assert!(model.validate().is_err());
    }
}

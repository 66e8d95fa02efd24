//! Regression tree structures
//!
//! Trees are stored as flat node arrays with node 0 as the root.
//! Traversal goes left when `feature <= threshold`.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the output before tree weighting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (for reference, not used in traversal)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold, rows with `feature <= threshold` go left
    pub threshold: f32,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f32, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }

    pub fn leaf_value(&self) -> Option<f64> {
        self.leaf
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Multiplier applied to leaf outputs (the shrinkage used at training time)
    pub weight: f64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Raw leaf value reached by a feature vector
    ///
    /// Malformed structure or a short feature vector yields 0.
    pub fn leaf_for(&self, features: &[f32]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf_value().unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    /// Weighted contribution of this tree
    pub fn evaluate(&self, features: &[f32]) -> f64 {
        self.leaf_for(features) * self.weight
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        if !self.weight.is_finite() {
            return Err(format!("Tree weight is not finite: {}", self.weight));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.is_leaf() {
                if node.left <= i as i32 || node.left as usize >= self.nodes.len() {
                    return Err(format!("Node {} has invalid left child: {}", i, node.left));
                }
                if node.right <= i as i32 || node.right as usize >= self.nodes.len() {
                    return Err(format!("Node {} has invalid right child: {}", i, node.right));
                }
                if node.feature_idx < 0 {
                    return Err(format!(
                        "Internal node {} has invalid feature index: {}",
                        i, node.feature_idx
                    ));
                }
            } else {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    Some(v) => return Err(format!("Leaf node {i} has non-finite value {v}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::internal(0, 0, 2.5, 1, 2),
                Node::leaf(1, 10.0),
                Node::leaf(2, 20.0),
            ],
            0.5,
        )
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 1.5, 1, 2);
        assert_eq!(internal.feature_idx, 3);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, -2.0);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf_value(), Some(-2.0));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();

        assert_eq!(tree.leaf_for(&[1.0]), 10.0);
        assert_eq!(tree.leaf_for(&[2.5]), 10.0); // Equal goes left
        assert_eq!(tree.leaf_for(&[3.0]), 20.0);
        assert_eq!(tree.evaluate(&[3.0]), 10.0);
        assert_eq!(tree.leaf_for(&[]), 0.0);
        assert_eq!(tree.num_leaves(), 2);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate().is_ok());

        let invalid = Tree::new(
            vec![
                Node::internal(0, 0, 2.5, 5, 2),
                Node::leaf(1, 10.0),
                Node::leaf(2, 20.0),
            ],
            1.0,
        );
        assert!(invalid.validate().is_err());

        let cyclic = Tree::new(vec![Node::internal(0, 0, 2.5, 0, 0)], 1.0);
        assert!(cyclic.validate().is_err());

        assert!(Tree::new(vec![], 1.0).validate().is_err());
    }
}

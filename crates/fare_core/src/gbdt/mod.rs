//! Gradient-boosted regression tree inference
//!
//! - `tree`: flat-array regression trees with `<=` traversal
//! - `model`: the ensemble and its validation

pub mod model;
pub mod tree;

pub use model::{Model, MODEL_VERSION};
pub use tree::{Node, Tree};

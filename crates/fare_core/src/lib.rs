//! Taxi fare prediction core
//!
//! Data model and inference building blocks shared by the trainer:
//!
//! Modules:
//! - `schema`: the fixed trip row schema and column names
//! - `dataset`: CSV loading into an ordered in-memory dataset
//! - `frame`: columnar table that transforms read from and append to
//! - `encoding`: one-hot vocabularies with all-zero encoding for unseen values
//! - `transforms`: copy, one-hot and concatenate column transforms
//! - `gbdt`: regression tree ensemble inference and persistence
//! - `metrics`: R², RMSE, MSE and MAE
//! - `errors`: shared error type

pub mod dataset;
pub mod encoding;
pub mod errors;
pub mod frame;
pub mod gbdt;
pub mod metrics;
pub mod schema;
pub mod transforms;

pub use dataset::{Dataset, DatasetSummary};
pub use encoding::OneHotEncoder;
pub use errors::{FareError, Result};
pub use frame::{Column, Frame};
pub use gbdt::{Model, Node, Tree};
pub use metrics::RegressionMetrics;
pub use schema::{ColumnKind, TripRecord, TRIP_COLUMNS};
pub use transforms::{FittedTransform, Transform};

//! Error types shared by the fare prediction crates

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, transforming, training, evaluating or predicting
#[derive(Error, Debug)]
pub enum FareError {
    /// Input file missing or unreadable
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Column count or field type does not match the trip schema
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Training set empty, malformed, or pipeline does not resolve
    #[error("Training error: {0}")]
    Training(String),

    /// Test set empty or scoring failed
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Single-row input could not be scored
    #[error("Prediction error: {0}")]
    Prediction(String),

    /// Persisted model invalid or unreadable
    #[error("Model error: {0}")]
    Model(String),

    /// A transform referenced a column that is not in the frame
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// A transform received a column of the wrong kind
    #[error("Column '{column}' has kind {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A column added to a frame does not match its row count
    #[error("Column '{column}' has {found} rows, frame has {expected}")]
    RowCount {
        column: String,
        expected: usize,
        found: usize,
    },

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FareError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for fare prediction operations
pub type Result<T> = std::result::Result<T, FareError>;

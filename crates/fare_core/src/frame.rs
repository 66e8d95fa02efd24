//! Columnar in-memory table
//!
//! Transforms read and append named columns. A frame is built from a
//! [`Dataset`] (or a single trip) and grows as a fitted pipeline runs.

use crate::dataset::Dataset;
use crate::errors::{FareError, Result};
use crate::schema::{self, TripRecord};

/// A single named column of values, one entry per row
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Number(Vec<f32>),
    /// Row-major fixed-width vectors
    Vector { width: usize, values: Vec<f32> },
}

impl Column {
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Text(_) => "Text",
            Column::Number(_) => "Number",
            Column::Vector { .. } => "Vector",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Number(v) => v.len(),
            Column::Vector { width, values } => {
                if *width == 0 {
                    0
                } else {
                    values.len() / width
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of f32 slots this column contributes to a concatenation
    pub fn width(&self) -> Option<usize> {
        match self {
            Column::Text(_) => None,
            Column::Number(_) => Some(1),
            Column::Vector { width, .. } => Some(*width),
        }
    }

    /// Row slice for numeric and vector columns
    pub fn row_values(&self, row: usize) -> Option<&[f32]> {
        match self {
            Column::Text(_) => None,
            Column::Number(v) => v.get(row..row + 1),
            Column::Vector { width, values } => values.get(row * width..(row + 1) * width),
        }
    }
}

/// Named columns with a shared row count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    rows: usize,
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    /// Build the seven trip columns from a dataset
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::from_records(&dataset.records)
    }

    /// Build a one-row frame
    pub fn from_record(record: &TripRecord) -> Self {
        Self::from_records(std::slice::from_ref(record))
    }

    pub fn from_records(records: &[TripRecord]) -> Self {
        let mut frame = Self::new(records.len());
        let text = |f: fn(&TripRecord) -> &str| -> Column {
            Column::Text(records.iter().map(|r| f(r).to_string()).collect())
        };
        let number = |f: fn(&TripRecord) -> f32| -> Column {
            Column::Number(records.iter().map(f).collect())
        };

        frame.columns = vec![
            (schema::VENDOR_ID.to_string(), text(|r| r.vendor_id.as_str())),
            (schema::RATE_CODE.to_string(), text(|r| r.rate_code.as_str())),
            (
                schema::PASSENGER_COUNT.to_string(),
                number(|r| r.passenger_count as f32),
            ),
            (schema::TRIP_TIME.to_string(), number(|r| r.trip_time as f32)),
            (schema::TRIP_DISTANCE.to_string(), number(|r| r.trip_distance)),
            (schema::PAYMENT_TYPE.to_string(), text(|r| r.payment_type.as_str())),
            (schema::FARE_AMOUNT.to_string(), number(|r| r.fare_amount)),
        ];
        frame
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| FareError::MissingColumn(name.to_string()))
    }

    pub fn text(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Text(values) => Ok(values),
            other => Err(FareError::ColumnType {
                column: name.to_string(),
                expected: "Text",
                found: other.kind(),
            }),
        }
    }

    pub fn numbers(&self, name: &str) -> Result<&[f32]> {
        match self.column(name)? {
            Column::Number(values) => Ok(values),
            other => Err(FareError::ColumnType {
                column: name.to_string(),
                expected: "Number",
                found: other.kind(),
            }),
        }
    }

    /// Vector column as (width, row-major values)
    pub fn vectors(&self, name: &str) -> Result<(usize, &[f32])> {
        match self.column(name)? {
            Column::Vector { width, values } => Ok((*width, values)),
            other => Err(FareError::ColumnType {
                column: name.to_string(),
                expected: "Vector",
                found: other.kind(),
            }),
        }
    }

    /// Add a column, replacing any column with the same name
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if column.len() != self.rows && !(self.rows == 0 && column.is_empty()) {
            return Err(FareError::RowCount {
                column: name,
                expected: self.rows,
                found: column.len(),
            });
        }

        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }
}

//! CSV dataset loading
//!
//! Reads header-having, comma-separated trip files into an ordered
//! [`Dataset`]. Columns bind by position, in [`TRIP_COLUMNS`] order.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, instrument};

use crate::errors::{FareError, Result};
use crate::schema::{TripRecord, TRIP_COLUMNS};

/// Ordered trips read from one file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<TripRecord>,
}

/// Aggregate view of a dataset for logging
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub fare_min: f32,
    pub fare_max: f32,
    pub fare_mean: f64,
    pub vendors: usize,
    pub rate_codes: usize,
    pub payment_types: usize,
}

impl Dataset {
    pub fn new(records: Vec<TripRecord>) -> Self {
        Self { records }
    }

    /// Load a dataset from a CSV file with a header row
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FareError::io(path, e))?;
        let dataset = Self::from_reader(file).map_err(|err| match err {
            FareError::Io { source, .. } => FareError::io(path, source),
            other => other,
        })?;
        debug!(rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    /// Load a dataset from any reader producing CSV text with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header = reader.headers().map_err(csv_error)?.clone();
        if header.is_empty() {
            return Ok(Self::default());
        }
        if header.len() != TRIP_COLUMNS.len() {
            return Err(FareError::parse(
                1,
                format!(
                    "expected {} header columns, got {}",
                    TRIP_COLUMNS.len(),
                    header.len()
                ),
            ));
        }

        let mut records = Vec::new();
        let mut row = StringRecord::new();
        while reader.read_record(&mut row).map_err(csv_error)? {
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            if row.len() == 1 && row[0].is_empty() {
                continue;
            }
            records.push(parse_trip(&row, line)?);
        }

        Ok(Self { records })
    }

    /// Get number of trips
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summary statistics, `None` for an empty dataset
    pub fn summary(&self) -> Option<DatasetSummary> {
        if self.records.is_empty() {
            return None;
        }

        let mut fare_min = f32::INFINITY;
        let mut fare_max = f32::NEG_INFINITY;
        let mut fare_sum = 0.0f64;
        let mut vendors = BTreeSet::new();
        let mut rate_codes = BTreeSet::new();
        let mut payment_types = BTreeSet::new();

        for record in &self.records {
            fare_min = fare_min.min(record.fare_amount);
            fare_max = fare_max.max(record.fare_amount);
            fare_sum += record.fare_amount as f64;
            vendors.insert(record.vendor_id.as_str());
            rate_codes.insert(record.rate_code.as_str());
            payment_types.insert(record.payment_type.as_str());
        }

        Some(DatasetSummary {
            rows: self.records.len(),
            fare_min,
            fare_max,
            fare_mean: fare_sum / self.records.len() as f64,
            vendors: vendors.len(),
            rate_codes: rate_codes.len(),
            payment_types: payment_types.len(),
        })
    }
}

impl From<Vec<TripRecord>> for Dataset {
    fn from(records: Vec<TripRecord>) -> Self {
        Self::new(records)
    }
}

fn parse_trip(row: &StringRecord, line: u64) -> Result<TripRecord> {
    if row.len() != TRIP_COLUMNS.len() {
        return Err(FareError::parse(
            line,
            format!("expected {} columns, got {}", TRIP_COLUMNS.len(), row.len()),
        ));
    }

    Ok(TripRecord {
        vendor_id: row[0].to_string(),
        rate_code: row[1].to_string(),
        passenger_count: parse_field(row, 2, line)?,
        trip_time: parse_field(row, 3, line)?,
        trip_distance: parse_finite(row, 4, line)?,
        payment_type: row[5].to_string(),
        fare_amount: parse_finite(row, 6, line)?,
    })
}

fn parse_field<T: FromStr>(row: &StringRecord, idx: usize, line: u64) -> Result<T> {
    let raw = &row[idx];
    raw.parse::<T>().map_err(|_| {
        FareError::parse(
            line,
            format!("column {} ({}): invalid value '{}'", idx + 1, TRIP_COLUMNS[idx], raw),
        )
    })
}

/// Float field that must be finite; `NaN` and `inf` parse as f32 but are rejected
fn parse_finite(row: &StringRecord, idx: usize, line: u64) -> Result<f32> {
    let value: f32 = parse_field(row, idx, line)?;
    if !value.is_finite() {
        return Err(FareError::parse(
            line,
            format!("column {} ({}): non-finite value '{}'", idx + 1, TRIP_COLUMNS[idx], &row[idx]),
        ));
    }
    Ok(value)
}

fn csv_error(err: csv::Error) -> FareError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => FareError::io("<reader>", source),
        other => FareError::parse(line, format!("{:?}", other)),
    }
}

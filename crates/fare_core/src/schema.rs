//! Fixed row schema for taxi trips
//!
//! Column order matches the input CSV files:
//! `vendorId, rateCode, passengerCount, tripTime, tripDistance, paymentType, fareAmount`.

use serde::{Deserialize, Serialize};

pub const VENDOR_ID: &str = "VendorId";
pub const RATE_CODE: &str = "RateCode";
pub const PASSENGER_COUNT: &str = "PassengerCount";
pub const TRIP_TIME: &str = "TripTime";
pub const TRIP_DISTANCE: &str = "TripDistance";
pub const PAYMENT_TYPE: &str = "PaymentType";
pub const FARE_AMOUNT: &str = "FareAmount";

/// Column names in file order
pub const TRIP_COLUMNS: [&str; 7] = [
    VENDOR_ID,
    RATE_CODE,
    PASSENGER_COUNT,
    TRIP_TIME,
    TRIP_DISTANCE,
    PAYMENT_TYPE,
    FARE_AMOUNT,
];

/// Kind of value a schema column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Categorical code kept as text
    Text,
    /// Scalar numeric value
    Number,
    /// Fixed-width numeric vector produced by a transform
    Vector,
}

/// Kind of each column in [`TRIP_COLUMNS`] order
pub const TRIP_COLUMN_KINDS: [ColumnKind; 7] = [
    ColumnKind::Text,
    ColumnKind::Text,
    ColumnKind::Number,
    ColumnKind::Number,
    ColumnKind::Number,
    ColumnKind::Text,
    ColumnKind::Number,
];

/// One historical taxi trip
///
/// Categorical codes (`vendor_id`, `rate_code`, `payment_type`) are kept as
/// text; they are never used in arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vendor_id: String,
    pub rate_code: String,
    pub passenger_count: i32,
    /// Trip duration in seconds
    pub trip_time: i32,
    pub trip_distance: f32,
    pub payment_type: String,
    /// Training label; a placeholder (0) when the fare is unknown
    pub fare_amount: f32,
}

impl TripRecord {
    /// The sample trip scored by the single-prediction run.
    ///
    /// Its observed fare is 15.5.
    pub fn sample() -> Self {
        Self {
            vendor_id: "VTS".to_string(),
            rate_code: "1".to_string(),
            passenger_count: 1,
            trip_time: 1140,
            trip_distance: 3.75,
            payment_type: "CRD".to_string(),
            fare_amount: 0.0,
        }
    }
}

//! Column transforms
//!
//! A [`Transform`] is an unfitted column operation. Fitting it against a
//! frame yields a [`FittedTransform`] that can be applied to any frame with
//! the same input columns.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoding::OneHotEncoder;
use crate::errors::{FareError, Result};
use crate::frame::{Column, Frame};
use crate::schema::ColumnKind;

/// Unfitted column operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// Copy a numeric column under a new name
    CopyColumn { output: String, input: String },
    /// Encode a text column as one-hot vectors
    OneHotEncoding { output: String, input: String },
    /// Join numeric and vector columns into one vector, in input order
    Concatenate { output: String, inputs: Vec<String> },
}

impl Transform {
    pub fn copy_column(output: impl Into<String>, input: impl Into<String>) -> Self {
        Self::CopyColumn {
            output: output.into(),
            input: input.into(),
        }
    }

    pub fn one_hot_encoding(output: impl Into<String>, input: impl Into<String>) -> Self {
        Self::OneHotEncoding {
            output: output.into(),
            input: input.into(),
        }
    }

    pub fn concatenate<I, S>(output: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Concatenate {
            output: output.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Self::CopyColumn { output, .. }
            | Self::OneHotEncoding { output, .. }
            | Self::Concatenate { output, .. } => output,
        }
    }

    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::CopyColumn { input, .. } | Self::OneHotEncoding { input, .. } => {
                vec![input.as_str()]
            }
            Self::Concatenate { inputs, .. } => inputs.iter().map(String::as_str).collect(),
        }
    }

    /// Check inputs against the columns known so far and register the output.
    ///
    /// `known` holds the columns available upstream of this transform.
    pub fn resolve(&self, known: &mut Vec<(String, ColumnKind)>) -> Result<()> {
        let kind_of = |name: &str| -> Result<ColumnKind> {
            known
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, k)| *k)
                .ok_or_else(|| FareError::MissingColumn(name.to_string()))
        };

        let output_kind = match self {
            Self::CopyColumn { input, .. } => {
                expect_kind(input, kind_of(input.as_str())?, &[ColumnKind::Number])?;
                ColumnKind::Number
            }
            Self::OneHotEncoding { input, .. } => {
                expect_kind(input, kind_of(input.as_str())?, &[ColumnKind::Text])?;
                ColumnKind::Vector
            }
            Self::Concatenate { inputs, .. } => {
                if inputs.is_empty() {
                    return Err(FareError::Training(format!(
                        "concatenation into '{}' has no inputs",
                        self.output()
                    )));
                }
                for input in inputs {
                    expect_kind(
                        input,
                        kind_of(input.as_str())?,
                        &[ColumnKind::Number, ColumnKind::Vector],
                    )?;
                }
                ColumnKind::Vector
            }
        };

        let output = self.output().to_string();
        known.retain(|(n, _)| *n != output);
        known.push((output, output_kind));
        Ok(())
    }

    /// Learn this transform's state from a frame
    pub fn fit(&self, frame: &Frame) -> Result<FittedTransform> {
        Ok(match self {
            Self::CopyColumn { output, input } => {
                frame.numbers(input)?;
                FittedTransform::CopyColumn {
                    output: output.clone(),
                    input: input.clone(),
                }
            }
            Self::OneHotEncoding { output, input } => {
                let encoder = OneHotEncoder::fit(frame.text(input)?);
                debug!(column = %input, categories = encoder.width(), "one-hot vocabulary learned");
                FittedTransform::OneHotEncoding {
                    output: output.clone(),
                    input: input.clone(),
                    encoder,
                }
            }
            Self::Concatenate { output, inputs } => FittedTransform::Concatenate {
                output: output.clone(),
                inputs: inputs.clone(),
            },
        })
    }
}

fn expect_kind(column: &str, found: ColumnKind, allowed: &[ColumnKind]) -> Result<()> {
    if allowed.contains(&found) {
        return Ok(());
    }
    Err(FareError::ColumnType {
        column: column.to_string(),
        expected: kind_name(allowed[0]),
        found: kind_name(found),
    })
}

fn kind_name(kind: ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "Text",
        ColumnKind::Number => "Number",
        ColumnKind::Vector => "Vector",
    }
}

/// Transform with learned state, ready to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FittedTransform {
    CopyColumn {
        output: String,
        input: String,
    },
    OneHotEncoding {
        output: String,
        input: String,
        encoder: OneHotEncoder,
    },
    Concatenate {
        output: String,
        inputs: Vec<String>,
    },
}

impl FittedTransform {
    pub fn output(&self) -> &str {
        match self {
            Self::CopyColumn { output, .. }
            | Self::OneHotEncoding { output, .. }
            | Self::Concatenate { output, .. } => output,
        }
    }

    /// Append this transform's output column to the frame
    pub fn apply(&self, frame: &mut Frame) -> Result<()> {
        let column = match self {
            Self::CopyColumn { input, .. } => Column::Number(frame.numbers(input)?.to_vec()),
            Self::OneHotEncoding { input, encoder, .. } => Column::Vector {
                width: encoder.width(),
                values: encoder.encode_all(frame.text(input)?),
            },
            Self::Concatenate { inputs, .. } => concatenate(frame, inputs)?,
        };
        frame.set_column(self.output(), column)
    }
}

fn concatenate(frame: &Frame, inputs: &[String]) -> Result<Column> {
    let mut sources = Vec::with_capacity(inputs.len());
    for input in inputs {
        let column = frame.column(input)?;
        let width = column.width().ok_or_else(|| FareError::ColumnType {
            column: input.clone(),
            expected: "Number",
            found: column.kind(),
        })?;
        sources.push((column, width));
    }

    let width: usize = sources.iter().map(|(_, w)| w).sum();
    let rows = frame.rows();
    let mut values = Vec::with_capacity(rows * width);
    for row in 0..rows {
        for (column, _) in &sources {
            if let Some(slice) = column.row_values(row) {
                values.extend_from_slice(slice);
            }
        }
    }

    Ok(Column::Vector { width, values })
}

/// Fit each transform in order, applying it before fitting the next
pub fn fit_chain(transforms: &[Transform], frame: &mut Frame) -> Result<Vec<FittedTransform>> {
    let mut fitted = Vec::with_capacity(transforms.len());
    for transform in transforms {
        let step = transform.fit(frame)?;
        step.apply(frame)?;
        fitted.push(step);
    }
    Ok(fitted)
}

/// Apply fitted transforms in order
pub fn apply_chain(fitted: &[FittedTransform], frame: &mut Frame) -> Result<()> {
    for step in fitted {
        step.apply(frame)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, TripRecord, TRIP_COLUMNS, TRIP_COLUMN_KINDS};

    fn trips() -> Vec<TripRecord> {
        let mut second = TripRecord::sample();
        second.vendor_id = "CMT".to_string();
        second.payment_type = "CSH".to_string();
        second.trip_distance = 1.5;
        second.fare_amount = 8.0;
        vec![TripRecord::sample(), second]
    }

    fn known_trip_columns() -> Vec<(String, ColumnKind)> {
        TRIP_COLUMNS
            .iter()
            .zip(TRIP_COLUMN_KINDS.iter())
            .map(|(n, k)| (n.to_string(), *k))
            .collect()
    }

    #[test]
    fn test_fit_chain_builds_feature_vector() {
        let mut frame = Frame::from_records(&trips());
        let transforms = vec![
            Transform::copy_column("Label", schema::FARE_AMOUNT),
            Transform::one_hot_encoding("VendorIdEncoded", schema::VENDOR_ID),
            Transform::concatenate("Features", ["VendorIdEncoded", schema::TRIP_DISTANCE]),
        ];

        let fitted = fit_chain(&transforms, &mut frame).unwrap();
        assert_eq!(fitted.len(), 3);

        assert_eq!(frame.numbers("Label").unwrap(), [0.0, 8.0]);
        let (width, values) = frame.vectors("Features").unwrap();
        assert_eq!(width, 3);
        assert_eq!(values, [1.0, 0.0, 3.75, 0.0, 1.0, 1.5]);
    }

    #[test]
    fn test_apply_chain_encodes_unseen_as_zero() {
        let mut train = Frame::from_records(&trips());
        let transforms = vec![
            Transform::one_hot_encoding("VendorIdEncoded", schema::VENDOR_ID),
            Transform::concatenate("Features", ["VendorIdEncoded", schema::PASSENGER_COUNT]),
        ];
        let fitted = fit_chain(&transforms, &mut train).unwrap();

        let mut unseen = TripRecord::sample();
        unseen.vendor_id = "NEW".to_string();
        let mut frame = Frame::from_record(&unseen);
        apply_chain(&fitted, &mut frame).unwrap();

        assert_eq!(frame.vectors("Features").unwrap(), (3, &[0.0, 0.0, 1.0][..]));
    }

    #[test]
    fn test_resolve_detects_missing_upstream_column() {
        let mut known = known_trip_columns();
        let concat = Transform::concatenate("Features", ["VendorIdEncoded"]);
        assert!(matches!(
            concat.resolve(&mut known),
            Err(FareError::MissingColumn(name)) if name == "VendorIdEncoded"
        ));

        let encode = Transform::one_hot_encoding("VendorIdEncoded", schema::VENDOR_ID);
        encode.resolve(&mut known).unwrap();
        concat.resolve(&mut known).unwrap();
        assert!(known.iter().any(|(n, k)| n == "Features" && *k == ColumnKind::Vector));
    }

    #[test]
    fn test_resolve_checks_kinds() {
        let mut known = known_trip_columns();
        let encode_number = Transform::one_hot_encoding("Bad", schema::TRIP_DISTANCE);
        assert!(matches!(
            encode_number.resolve(&mut known),
            Err(FareError::ColumnType { expected: "Text", .. })
        ));

        let concat_text = Transform::concatenate("Bad", [schema::PAYMENT_TYPE]);
        assert!(concat_text.resolve(&mut known).is_err());
    }
}

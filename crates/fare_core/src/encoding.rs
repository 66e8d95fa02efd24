//! One-hot encoding for categorical text columns
//!
//! Categories are learned from training values in order of first
//! occurrence. Values never seen during fitting encode to an all-zero
//! vector instead of failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fitted one-hot vocabulary for a single column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct OneHotEncoder {
    categories: Vec<String>,
    index: HashMap<String, usize>,
}

impl OneHotEncoder {
    /// Learn categories from observed values
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut encoder = Self::default();
        for value in values {
            let value = value.as_ref();
            if !encoder.index.contains_key(value) {
                encoder.index.insert(value.to_string(), encoder.categories.len());
                encoder.categories.push(value.to_string());
            }
        }
        encoder
    }

    /// Categories in slot order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Output vector width
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Slot for a category, `None` if it was not seen at fit time
    pub fn slot(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    /// Write the encoding of `value` into `out`, which must be `width()` long
    pub fn encode_into(&self, value: &str, out: &mut [f32]) {
        out.fill(0.0);
        if let Some(slot) = self.slot(value) {
            out[slot] = 1.0;
        }
    }

    pub fn encode(&self, value: &str) -> Vec<f32> {
        let mut out = vec![0.0; self.width()];
        self.encode_into(value, &mut out);
        out
    }

    /// Encode many values into one row-major buffer
    pub fn encode_all<S: AsRef<str>>(&self, values: &[S]) -> Vec<f32> {
        let width = self.width();
        let mut out = vec![0.0; values.len() * width];
        if width == 0 {
            return out;
        }
        for (value, chunk) in values.iter().zip(out.chunks_mut(width)) {
            if let Some(slot) = self.slot(value.as_ref()) {
                chunk[slot] = 1.0;
            }
        }
        out
    }

    /// Recover the category from an encoding produced by this encoder
    pub fn decode(&self, encoded: &[f32]) -> Option<&str> {
        if encoded.len() != self.width() {
            return None;
        }
        let mut hot = encoded.iter().enumerate().filter(|(_, v)| **v != 0.0);
        match (hot.next(), hot.next()) {
            (Some((slot, _)), None) => Some(self.categories[slot].as_str()),
            _ => None,
        }
    }
}

impl From<Vec<String>> for OneHotEncoder {
    fn from(categories: Vec<String>) -> Self {
        Self::fit(categories)
    }
}

impl From<OneHotEncoder> for Vec<String> {
    fn from(encoder: OneHotEncoder) -> Self {
        encoder.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_first_occurrence_order() {
        let encoder = OneHotEncoder::fit(["VTS", "CMT", "VTS", "DDS"]);
        assert_eq!(encoder.categories(), ["VTS", "CMT", "DDS"]);
        assert_eq!(encoder.width(), 3);
        assert_eq!(encoder.slot("CMT"), Some(1));
    }

    #[test]
    fn test_encode_and_decode_round_trip() {
        let encoder = OneHotEncoder::fit(["CRD", "CSH", "NOC"]);
        for category in encoder.categories() {
            let encoded = encoder.encode(category);
            assert_eq!(encoded.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(encoder.decode(&encoded), Some(category.as_str()));
        }
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let encoder = OneHotEncoder::fit(["VTS", "CMT"]);
        let encoded = encoder.encode("XYZ");
        assert_eq!(encoded, vec![0.0, 0.0]);
        assert_eq!(encoder.decode(&encoded), None);
    }

    #[test]
    fn test_encode_all_is_row_major() {
        let encoder = OneHotEncoder::fit(["1", "2"]);
        let encoded = encoder.encode_all(&["2", "5", "1"]);
        assert_eq!(encoded, vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_serde_keeps_vocabulary() {
        let encoder = OneHotEncoder::fit(["b", "a"]);
        let json = serde_json::to_string(&encoder).unwrap();
        assert_eq!(json, r#"["b","a"]"#);

        let restored: OneHotEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoder);
        assert_eq!(restored.slot("a"), Some(1));
    }
}

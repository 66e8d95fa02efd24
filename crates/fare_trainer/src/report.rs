//! Console report blocks

use taxi_fare_core::RegressionMetrics;

/// Known fare of the fixed sample trip
pub const REFERENCE_FARE: f32 = 15.5;

const METRICS_RULE: &str = "************************";
const PREDICTION_RULE: &str = "*********************************";

/// Format with at most `max_places` decimals, dropping trailing zeros
pub fn format_decimal(value: f64, max_places: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let mut text = format!("{:.*}", max_places, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Like [`format_decimal`] but without a leading zero: `0.25` is `.25` and
/// anything that rounds to zero is empty
pub fn format_fraction(value: f64, max_places: usize) -> String {
    let text = format_decimal(value, max_places);
    if text == "0" {
        String::new()
    } else if let Some(rest) = text.strip_prefix("0.") {
        format!(".{}", rest)
    } else if let Some(rest) = text.strip_prefix("-0.") {
        format!("-.{}", rest)
    } else {
        text
    }
}

/// R² and RMSE block, at most 2 decimals each; RMSE has no leading zero
pub fn metrics_block(metrics: &RegressionMetrics) -> String {
    [
        String::new(),
        METRICS_RULE.to_string(),
        "*       Model Quality metrics evaluation        ".to_string(),
        "*--------------------------".to_string(),
        format!("*       Rsquared Score:     {}", format_decimal(metrics.r_squared, 2)),
        format!(
            "*       Root Mean Squared Error:    {}",
            format_fraction(metrics.rmse, 2)
        ),
    ]
    .join("\n")
}

/// Predicted fare (at most 4 decimals) next to the expected one
pub fn prediction_block(predicted: f32, expected: f32) -> String {
    [
        PREDICTION_RULE.to_string(),
        format!(
            "Predicted Fare: {}, actual fare: {}",
            format_decimal(predicted as f64, 4),
            format_decimal(expected as f64, 4)
        ),
        PREDICTION_RULE.to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.9134, 2), "0.91");
        assert_eq!(format_decimal(15.5, 4), "15.5");
        assert_eq!(format_decimal(3.0, 2), "3");
        assert_eq!(format_decimal(-0.001, 2), "0");
        assert_eq!(format_decimal(-1.256, 2), "-1.26");
        assert_eq!(format_decimal(12.0, 0), "12");
    }

    #[test]
    fn test_format_fraction() {
        assert_eq!(format_fraction(0.2512, 2), ".25");
        assert_eq!(format_fraction(-0.5, 2), "-.5");
        assert_eq!(format_fraction(3.2871, 2), "3.29");
        assert_eq!(format_fraction(0.001, 2), "");
        assert_eq!(format_fraction(10.0, 2), "10");
    }

    #[test]
    fn test_small_rmse_has_no_leading_zero() {
        let metrics = RegressionMetrics {
            r_squared: 0.99,
            rmse: 0.2512,
            mse: 0.0631,
            mae: 0.2,
            count: 4,
        };
        let block = metrics_block(&metrics);
        assert!(block.contains("*       Rsquared Score:     0.99"));
        assert!(block.ends_with("*       Root Mean Squared Error:    .25"));
    }

    #[test]
    fn test_metrics_block() {
        let metrics = RegressionMetrics {
            r_squared: 0.9123,
            rmse: 3.2871,
            mse: 10.8,
            mae: 1.1,
            count: 10,
        };
        let block = metrics_block(&metrics);
        assert!(block.contains("*       Rsquared Score:     0.91"));
        assert!(block.contains("*       Root Mean Squared Error:    3.29"));
        assert!(block.starts_with('\n'));
    }

    #[test]
    fn test_prediction_block() {
        let block = prediction_block(15.123456, REFERENCE_FARE);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Predicted Fare: 15.1235, actual fare: 15.5");
    }
}

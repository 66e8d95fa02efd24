//! Feature binning
//!
//! Each feature is discretized once per fit. A feature with at most
//! `max_bins` distinct values gets one bin per value; otherwise bin
//! boundaries sit at equal-count quantiles. Boundaries are inclusive upper
//! bounds, so `value <= bound` matches tree traversal.

/// Bin boundaries for one feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBins {
    /// Inclusive upper bounds, the last one is `+inf`
    upper_bounds: Vec<f32>,
}

impl FeatureBins {
    /// Derive boundaries from a column of values
    pub fn fit(values: &[f32], max_bins: usize) -> Self {
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f32::total_cmp);

        let mut distinct: Vec<(f32, usize)> = Vec::new();
        for v in sorted {
            match distinct.last_mut() {
                Some((last, count)) if *last == v => *count += 1,
                _ => distinct.push((v, 1)),
            }
        }

        let total: usize = distinct.iter().map(|(_, c)| c).sum();
        let max_bins = max_bins.max(2);
        let every_value = distinct.len() <= max_bins;

        let mut upper_bounds = Vec::with_capacity(distinct.len().min(max_bins));
        let mut seen = 0usize;
        for pair in distinct.windows(2) {
            let (value, count) = pair[0];
            let next = pair[1].0;
            seen += count;

            let target = (upper_bounds.len() + 1) * total / max_bins;
            if every_value || (seen >= target && upper_bounds.len() + 1 < max_bins) {
                upper_bounds.push(midpoint(value, next));
            }
        }
        upper_bounds.push(f32::INFINITY);

        Self { upper_bounds }
    }

    pub fn num_bins(&self) -> usize {
        self.upper_bounds.len()
    }

    /// Bin index for a value; NaN lands in the last bin
    pub fn bin(&self, value: f32) -> usize {
        if value.is_nan() {
            return self.upper_bounds.len() - 1;
        }
        self.upper_bounds.partition_point(|&bound| bound < value)
    }

    /// Split threshold that sends bins `0..=bin` left
    pub fn threshold(&self, bin: usize) -> f32 {
        self.upper_bounds[bin]
    }
}

/// A point strictly below `b` and not below `a`
fn midpoint(a: f32, b: f32) -> f32 {
    let mid = a + (b - a) / 2.0;
    if mid >= b || !mid.is_finite() {
        a
    } else {
        mid
    }
}

/// Column-major matrix of bin indices
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    rows: usize,
    features: Vec<FeatureBins>,
    bins: Vec<u16>,
}

impl BinnedMatrix {
    /// Bin a row-major feature matrix
    pub fn from_rows(values: &[f32], rows: usize, num_features: usize, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, u16::MAX as usize);
        let mut features = Vec::with_capacity(num_features);
        let mut bins = Vec::with_capacity(rows * num_features);
        let mut column = Vec::with_capacity(rows);

        for f in 0..num_features {
            column.clear();
            column.extend((0..rows).map(|r| values[r * num_features + f]));

            let mapper = FeatureBins::fit(&column, max_bins);
            bins.extend(column.iter().map(|&v| mapper.bin(v) as u16));
            features.push(mapper);
        }

        Self {
            rows,
            features,
            bins,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature_bins(&self, feature: usize) -> &FeatureBins {
        &self.features[feature]
    }

    /// Bins per feature, in feature order
    pub fn layout(&self) -> Vec<usize> {
        self.features.iter().map(FeatureBins::num_bins).collect()
    }

    /// Bin indices of one feature for every row
    pub fn column(&self, feature: usize) -> &[u16] {
        &self.bins[feature * self.rows..(feature + 1) * self.rows]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_bin_per_distinct_value() {
        let bins = FeatureBins::fit(&[0.0, 1.0, 0.0, 1.0], 255);
        assert_eq!(bins.num_bins(), 2);
        assert_eq!(bins.threshold(0), 0.5);
        assert_eq!(bins.bin(0.0), 0);
        assert_eq!(bins.bin(1.0), 1);
        assert_eq!(bins.bin(0.5), 0);
        assert_eq!(bins.bin(f32::NAN), 1);
    }

    #[test]
    fn test_quantile_bins_are_capped() {
        let values: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let bins = FeatureBins::fit(&values, 10);
        assert_eq!(bins.num_bins(), 10);

        let mut counts = vec![0usize; bins.num_bins()];
        for &v in &values {
            counts[bins.bin(v)] += 1;
        }
        assert!(counts.iter().all(|&c| c >= 90 && c <= 110));
    }

    #[test]
    fn test_bins_match_thresholds() {
        let values = [1.5f32, 3.75, 0.2, 3.75, 12.0, 0.2];
        let bins = FeatureBins::fit(&values, 255);
        for &v in &values {
            let bin = bins.bin(v);
            for split in 0..bins.num_bins() - 1 {
                assert_eq!(bin <= split, v <= bins.threshold(split));
            }
        }
    }

    #[test]
    fn test_adjacent_floats_stay_separated() {
        let a = 1.0f32;
        let b = f32::from_bits(a.to_bits() + 1);
        let bins = FeatureBins::fit(&[a, b], 255);
        assert_ne!(bins.bin(a), bins.bin(b));
    }

    #[test]
    fn test_binned_matrix_layout() {
        // 3 rows x 2 features, row-major
        let values = [0.0, 10.0, 1.0, 20.0, 0.0, 30.0];
        let matrix = BinnedMatrix::from_rows(&values, 3, 2, 255);

        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.num_features(), 2);
        assert_eq!(matrix.layout(), vec![2, 3]);
        assert_eq!(matrix.column(0), &[0, 1, 0]);
        assert_eq!(matrix.column(1), &[0, 1, 2]);
    }
}

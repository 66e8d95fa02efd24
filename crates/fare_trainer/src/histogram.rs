//! Gradient histograms
//!
//! Per-feature, per-bin sums of gradients, hessians and row counts for the
//! rows of one leaf. A sibling's histogram is derived by subtracting the
//! smaller child's histogram from the parent's.

use crate::binning::BinnedMatrix;

/// Accumulated statistics for one bin
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BinStat {
    pub grad: f64,
    pub hess: f64,
    pub count: u32,
}

impl BinStat {
    pub fn add(&mut self, other: &BinStat) {
        self.grad += other.grad;
        self.hess += other.hess;
        self.count += other.count;
    }

    pub fn minus(&self, other: &BinStat) -> BinStat {
        BinStat {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
            count: self.count - other.count,
        }
    }
}

/// Flat histogram over all features of a binned matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    offsets: Vec<usize>,
    stats: Vec<BinStat>,
}

impl Histogram {
    fn empty(layout: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(layout.len() + 1);
        let mut total = 0;
        offsets.push(0);
        for &bins in layout {
            total += bins;
            offsets.push(total);
        }
        Self {
            offsets,
            stats: vec![BinStat::default(); total],
        }
    }

    /// Accumulate the given rows
    pub fn build(matrix: &BinnedMatrix, rows: &[usize], gradients: &[f64], hessians: &[f64]) -> Self {
        let mut hist = Self::empty(&matrix.layout());

        for feature in 0..matrix.num_features() {
            let column = matrix.column(feature);
            let stats = &mut hist.stats[hist.offsets[feature]..hist.offsets[feature + 1]];
            for &row in rows {
                let stat = &mut stats[column[row] as usize];
                stat.grad += gradients[row];
                stat.hess += hessians[row];
                stat.count += 1;
            }
        }

        hist
    }

    /// `self - other`, bin by bin
    pub fn subtract(&self, other: &Histogram) -> Histogram {
        Histogram {
            offsets: self.offsets.clone(),
            stats: self
                .stats
                .iter()
                .zip(&other.stats)
                .map(|(a, b)| a.minus(b))
                .collect(),
        }
    }

    pub fn num_features(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn feature(&self, feature: usize) -> &[BinStat] {
        &self.stats[self.offsets[feature]..self.offsets[feature + 1]]
    }

    /// Totals over all rows, read from the first feature
    pub fn totals(&self) -> BinStat {
        let mut total = BinStat::default();
        if self.num_features() > 0 {
            for stat in self.feature(0) {
                total.add(stat);
            }
        }
        total
    }
}

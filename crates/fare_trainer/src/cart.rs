//! Regression tree builder
//!
//! Grows a single tree leaf-wise: at every step the leaf with the best
//! histogram split is divided, until the leaf budget is spent or no split
//! has positive gain. Leaf outputs are the Newton step `-G/H`.

use taxi_fare_core::gbdt::{Node, Tree};

use crate::binning::BinnedMatrix;
use crate::deterministic::SplitTieBreaker;
use crate::histogram::{BinStat, Histogram};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub num_leaves: usize,
    pub min_samples_leaf: usize,
    pub min_split_gain: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            num_leaves: 20,
            min_samples_leaf: 10,
            min_split_gain: 0.0,
        }
    }
}

/// Best split found for a leaf
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    bin: usize,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// A current leaf of the tree being grown
struct OpenLeaf {
    node: usize,
    rows: Vec<usize>,
    hist: Histogram,
    totals: BinStat,
    split: Option<SplitCandidate>,
}

/// Build a regression tree from binned features and per-row gradients
pub struct CartBuilder<'a> {
    config: TreeConfig,
    matrix: &'a BinnedMatrix,
    gradients: &'a [f64],
    hessians: &'a [f64],
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        matrix: &'a BinnedMatrix,
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        assert_eq!(matrix.rows(), gradients.len());
        assert_eq!(matrix.rows(), hessians.len());

        Self {
            config,
            matrix,
            gradients,
            hessians,
        }
    }

    /// Build a tree over the given rows; leaves hold raw `-G/H` values
    pub fn build(&self, rows: Vec<usize>, weight: f64) -> Tree {
        let mut nodes = vec![Node::leaf(0, 0.0)];
        let mut next_leaf_id = 1usize;

        let hist = Histogram::build(self.matrix, &rows, self.gradients, self.hessians);
        let mut open = vec![self.open_leaf(0, 0, rows, hist)];

        while open.len() < self.config.num_leaves {
            let Some(pick) = self.best_leaf(&open) else {
                break;
            };
            let leaf = open.swap_remove(pick);
            let Some(split) = leaf.split.clone() else {
                break;
            };

            let (left_rows, right_rows) = self.partition(&leaf.rows, split.feature_idx, split.bin);

            // Build the smaller child directly, derive the larger one.
            let (left_hist, right_hist) = if left_rows.len() <= right_rows.len() {
                let left = Histogram::build(self.matrix, &left_rows, self.gradients, self.hessians);
                let right = leaf.hist.subtract(&left);
                (left, right)
            } else {
                let right = Histogram::build(self.matrix, &right_rows, self.gradients, self.hessians);
                let left = leaf.hist.subtract(&right);
                (left, right)
            };

            let left_idx = nodes.len();
            let right_idx = left_idx + 1;
            let threshold = self
                .matrix
                .feature_bins(split.feature_idx)
                .threshold(split.bin);
            nodes[leaf.node] = Node::internal(
                leaf.node as i32,
                split.feature_idx as i32,
                threshold,
                left_idx as i32,
                right_idx as i32,
            );
            nodes.push(Node::leaf(left_idx as i32, 0.0));
            nodes.push(Node::leaf(right_idx as i32, 0.0));

            open.push(self.open_leaf(left_idx, next_leaf_id, left_rows, left_hist));
            open.push(self.open_leaf(right_idx, next_leaf_id + 1, right_rows, right_hist));
            next_leaf_id += 2;
        }

        for leaf in &open {
            nodes[leaf.node] = Node::leaf(leaf.node as i32, leaf_value(&leaf.totals));
        }

        Tree::new(nodes, weight)
    }

    fn open_leaf(&self, node: usize, leaf_id: usize, rows: Vec<usize>, hist: Histogram) -> OpenLeaf {
        let totals = hist.totals();
        let split = self.find_best_split(&hist, &totals, leaf_id);
        OpenLeaf {
            node,
            rows,
            hist,
            totals,
            split,
        }
    }

    /// Index of the open leaf whose split wins, `None` when no leaf can split
    fn best_leaf(&self, open: &[OpenLeaf]) -> Option<usize> {
        let mut best: Option<(usize, &SplitCandidate)> = None;
        for (i, leaf) in open.iter().enumerate() {
            if let Some(split) = &leaf.split {
                if best.map_or(true, |(_, current)| split.beats(current)) {
                    best = Some((i, split));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Find best split using the leaf histogram
    fn find_best_split(&self, hist: &Histogram, totals: &BinStat, leaf_id: usize) -> Option<SplitCandidate> {
        let min_count = self.config.min_samples_leaf.max(1) as u32;
        if totals.count < 2 * min_count {
            return None;
        }

        let parent_score = score(totals);
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..hist.num_features() {
            let bins = hist.feature(feature_idx);
            let mut left = BinStat::default();

            for (bin, stat) in bins.iter().enumerate().take(bins.len().saturating_sub(1)) {
                left.add(stat);
                let right = totals.minus(&left);

                if left.count < min_count || right.count < min_count {
                    continue;
                }
                if left.hess <= 0.0 || right.hess <= 0.0 {
                    continue;
                }

                let gain = score(&left) + score(&right) - parent_score;
                if !(gain > self.config.min_split_gain) {
                    continue;
                }

                let candidate = SplitCandidate {
                    feature_idx,
                    bin,
                    gain,
                    tie_breaker: SplitTieBreaker::new(feature_idx, bin, leaf_id),
                };
                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn partition(&self, rows: &[usize], feature_idx: usize, bin: usize) -> (Vec<usize>, Vec<usize>) {
        let column = self.matrix.column(feature_idx);
        rows.iter().copied().partition(|&row| (column[row] as usize) <= bin)
    }
}

/// `G² / H`, the loss reduction of a leaf before the parent term
fn score(stat: &BinStat) -> f64 {
    if stat.hess > 0.0 {
        stat.grad * stat.grad / stat.hess
    } else {
        0.0
    }
}

/// Optimal leaf value `-G/H`
fn leaf_value(stat: &BinStat) -> f64 {
    if stat.hess > 0.0 {
        -stat.grad / stat.hess
    } else {
        0.0
    }
}

//! Deterministic utilities for reproducible training
//!
//! Provides a seeded LCG for row subsampling and the tie-breaking order
//! used when two splits have the same gain.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses the glibc constants
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 1103515245;
    const INCREMENT: u64 = 12345;
    const MODULUS: u64 = 1 << 31;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed % Self::MODULUS),
        }
    }

    /// Next value in [0, 2^31)
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 & (Self::MODULUS - 1)) as u32
    }

    /// Next value in [0, 1)
    pub fn next_unit(&mut self) -> f64 {
        self.next_u32() as f64 / Self::MODULUS as f64
    }
}

/// Pick a subset of `0..n` keeping each row with probability `fraction`.
///
/// Indices come back sorted. A fraction of 1 or more returns every row; the
/// result is never empty when `n > 0`.
pub fn sample_rows(n: usize, fraction: f64, rng: &mut LcgRng) -> Vec<usize> {
    if fraction >= 1.0 {
        return (0..n).collect();
    }

    let mut rows: Vec<usize> = (0..n).filter(|_| rng.next_unit() < fraction).collect();
    if rows.is_empty() && n > 0 {
        rows.push(rng.next_u32() as usize % n);
    }
    rows
}

/// Deterministic tie-breaker for split selection
/// Lower (feature_idx, bin, leaf_id) wins when gains are equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub bin: usize,
    pub leaf_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, bin: usize, leaf_id: usize) -> Self {
        Self {
            feature_idx,
            bin,
            leaf_id,
        }
    }
}

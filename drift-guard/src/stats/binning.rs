//! Equal-width binning and the binned distribution distances (PSI, KL).
//!
//! Bin edges are always derived from the historical sample and then applied
//! unchanged to the recent sample. Recent values outside the historical range
//! are clipped into the first or last bin.

use tracing::trace;

/// Equal-width bin edges over a sample's finite range.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Builds `bins` equal-width bins spanning `[min, max]` of the sample.
    ///
    /// A sample with a single distinct value spans `[v - 0.5, v + 0.5]`; an
    /// empty sample spans `[0, 1]`. `bins` is raised to at least one.
    pub fn from_sample(sample: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lo, mut hi) = sample
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        if lo > hi {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = hi - lo;
        let mut edges: Vec<f64> = (0..=bins)
            .map(|i| lo + width * i as f64 / bins as f64)
            .collect();
        edges[bins] = hi;

        Self { edges }
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    /// Always false: at least one bin exists.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The `len() + 1` edge values.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Index of the bin holding `value`, clipping out-of-range values.
    ///
    /// Bins are half-open `[e_i, e_i+1)` except the last, which also holds
    /// its upper edge. Returns `None` for NaN.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let last = self.len() - 1;
        let upper = self.edges.partition_point(|&edge| edge <= value);
        Some(upper.saturating_sub(1).min(last))
    }

    /// Per-bin counts of `sample`, as floating point for downstream smoothing.
    pub fn counts(&self, sample: &[f64]) -> Vec<f64> {
        let mut counts = vec![0.0; self.len()];
        for &value in sample {
            if let Some(idx) = self.bin_index(value) {
                counts[idx] += 1.0;
            }
        }
        counts
    }
}

/// Normalizes counts to a probability vector. An all-zero vector yields NaNs.
pub fn normalize(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    counts.iter().map(|c| c / total).collect()
}

/// Population Stability Index between a historical and a recent sample.
///
/// `epsilon` is added to every bin count of both histograms before
/// normalization. The sum is reported as a magnitude, so floating point noise
/// around zero never produces a negative index.
pub fn population_stability_index(
    historical: &[f64],
    recent: &[f64],
    bins: usize,
    epsilon: f64,
) -> f64 {
    let edges = BinEdges::from_sample(historical, bins);
    let smooth = |counts: Vec<f64>| counts.into_iter().map(|c| c + epsilon).collect::<Vec<_>>();

    let hist_probs = normalize(&smooth(edges.counts(historical)));
    let recent_probs = normalize(&smooth(edges.counts(recent)));

    let psi: f64 = hist_probs
        .iter()
        .zip(&recent_probs)
        .map(|(&h, &r)| (r - h) * (r / h).ln())
        .sum();

    trace!(psi, bins = edges.len(), "computed population stability index");
    psi.abs()
}

/// Elementwise relative entropy term `x * ln(x / y)` with the usual limits.
fn relative_entropy(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() {
        f64::NAN
    } else if x > 0.0 && y > 0.0 {
        x * (x / y).ln()
    } else if x == 0.0 && y >= 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

/// Kullback-Leibler divergence `D(p_hist || p_recent)` over shared bins.
///
/// No smoothing is applied: a bin with historical mass but no recent mass
/// makes the divergence infinite, and an empty sample makes it NaN.
pub fn kl_divergence(historical: &[f64], recent: &[f64], bins: usize) -> f64 {
    let edges = BinEdges::from_sample(historical, bins);
    let hist_probs = normalize(&edges.counts(historical));
    let recent_probs = normalize(&edges.counts(recent));

    let kl: f64 = hist_probs
        .iter()
        .zip(&recent_probs)
        .map(|(&p, &q)| relative_entropy(p, q))
        .sum();

    trace!(kl, bins = edges.len(), "computed kl divergence");
    // Rounding can leave identical histograms a hair below zero.
    if kl < 0.0 {
        0.0
    } else {
        kl
    }
}

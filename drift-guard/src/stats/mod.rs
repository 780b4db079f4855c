//! Statistical test primitives used by the drift detectors.
//!
//! Each primitive is a pure function over `f64` slices (or a contingency
//! table) and returns raw numbers. Non-finite results are valid outputs here;
//! interpreting them is left to the detectors and the monitor.

pub mod binning;
pub mod contingency;
pub mod cusum;
pub mod descriptive;
pub mod ks;
pub mod special;
pub mod ztest;

pub use binning::{kl_divergence, population_stability_index, BinEdges};
pub use contingency::{chi2_contingency, cramers_v, ChiSquaredOutcome, ContingencyTable};
pub use cusum::cusum_crossings;
pub use descriptive::{mean, sample_std, sample_variance};
pub use ks::{ks_2samp, KsOutcome};
pub use ztest::{z_test, z_test_with_sizes, ZTestOutcome};

//! Drift detectors and the dispatcher that selects them.
//!
//! Every detector is built from a historical and a recent [`Dataset`] plus
//! [`DetectorParams`], and answers one question per column through
//! [`DriftDetector::detect_drift`]: did the distribution move, and by how much?
//!
//! ## Available methods
//!
//! | Identifier | Detector | Decision | Reported statistic |
//! |---|---|---|---|
//! | `chi_squared_test` | [`ChiSquaredTest`] | `p < alpha` | p-value |
//! | `cramers_v_test` | [`CramersVTest`] | `p < alpha` | Cramér's V |
//! | `ks_test` | [`KsTest`] | `p < alpha` | p-value |
//! | `psi_calculator` | [`PsiCalculator`] | `psi > threshold` | PSI |
//! | `z_test` | [`ZTest`] | `abs(z) > z_critical` | p-value |
//! | `cusum` | [`Cusum`] | any crossing | number of crossings |
//! | `kl_divergence` | [`KlDivergence`] | `kl > threshold` | KL divergence |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use drift_guard::detectors::{Detector, DetectorParams, DriftDetector, DriftMethod};
//!
//! let detector = Detector::new(
//!     "z_test".parse::<DriftMethod>()?,
//!     Arc::new(historical),
//!     Arc::new(recent),
//!     &DetectorParams::default(),
//! );
//! let result = detector.detect_drift("amount")?;
//! println!("drift: {} ({})", result.drift_detected, result.statistic);
//! ```

use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ColumnConfig;
use crate::dataset::Dataset;
use crate::error::{DriftError, Result};

pub mod categorical;
pub mod numerical;

pub use categorical::{ChiSquaredTest, CramersVTest};
pub use numerical::{Cusum, KlDivergence, KsTest, PsiCalculator, ZTest};

/// Tuning knobs shared by the detectors. Each detector reads the subset it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Significance level for the hypothesis tests.
    pub alpha: f64,
    /// Number of equal-width bins for PSI and KL divergence.
    pub bins: usize,
    /// Additive smoothing for PSI bin counts.
    pub epsilon: f64,
    /// Decision threshold for PSI, KL divergence and CUSUM.
    pub threshold: f64,
}

/// Upper bound on the histogram size for PSI and KL divergence.
pub const MAX_BINS: usize = 10_000;

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bins: 10,
            epsilon: 1e-5,
            threshold: 0.1,
        }
    }
}

impl DetectorParams {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Rejects parameters no detector can work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(DriftError::Configuration(format!(
                "alpha must be within (0, 1), got {}",
                self.alpha
            )));
        }
        if self.bins == 0 || self.bins > MAX_BINS {
            return Err(DriftError::Configuration(format!(
                "bins must be within [1, {MAX_BINS}], got {}",
                self.bins
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(DriftError::Configuration(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(DriftError::Configuration(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Raw outcome of a detector. The statistic may be NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub drift_detected: bool,
    pub statistic: f64,
}

impl DriftResult {
    pub fn new(drift_detected: bool, statistic: f64) -> Self {
        Self {
            drift_detected,
            statistic,
        }
    }

    /// Creates a result indicating no drift.
    pub fn no_drift(statistic: f64) -> Self {
        Self::new(false, statistic)
    }

    /// Creates a result indicating drift.
    pub fn drift_detected(statistic: f64) -> Self {
        Self::new(true, statistic)
    }
}

/// Uniform contract of all drift detectors.
pub trait DriftDetector: Debug + Send + Sync {
    /// The method this detector implements.
    fn method(&self) -> DriftMethod;

    /// Compares the column between the historical and recent slices.
    ///
    /// Fails with [`DriftError::ColumnNotFound`] when either slice lacks the
    /// column and [`DriftError::TypeMismatch`] when a numeric detector is
    /// pointed at a non-numeric column.
    fn detect_drift(&self, column: &str) -> Result<DriftResult>;
}

/// Closed set of detection methods, addressed by their configuration identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftMethod {
    ZTest,
    PsiCalculator,
    ChiSquaredTest,
    CramersVTest,
    KsTest,
    Cusum,
    KlDivergence,
}

impl DriftMethod {
    /// Every method, in identifier registration order.
    pub const ALL: [DriftMethod; 7] = [
        DriftMethod::ZTest,
        DriftMethod::PsiCalculator,
        DriftMethod::ChiSquaredTest,
        DriftMethod::CramersVTest,
        DriftMethod::KsTest,
        DriftMethod::Cusum,
        DriftMethod::KlDivergence,
    ];

    /// The configuration identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZTest => "z_test",
            Self::PsiCalculator => "psi_calculator",
            Self::ChiSquaredTest => "chi_squared_test",
            Self::CramersVTest => "cramers_v_test",
            Self::KsTest => "ks_test",
            Self::Cusum => "cusum",
            Self::KlDivergence => "kl_divergence",
        }
    }

    /// Whether the method compares category frequencies rather than numbers.
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::ChiSquaredTest | Self::CramersVTest)
    }
}

impl fmt::Display for DriftMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriftMethod {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| DriftError::unknown_method(s))
    }
}

/// A constructed detector of any method.
#[derive(Debug)]
pub enum Detector {
    ChiSquared(ChiSquaredTest),
    CramersV(CramersVTest),
    Ks(KsTest),
    Psi(PsiCalculator),
    Z(ZTest),
    Cusum(Cusum),
    KlDivergence(KlDivergence),
}

impl Detector {
    /// Builds the detector for `method`.
    pub fn new(
        method: DriftMethod,
        historical: Arc<Dataset>,
        recent: Arc<Dataset>,
        params: &DetectorParams,
    ) -> Self {
        match method {
            DriftMethod::ChiSquaredTest => {
                Self::ChiSquared(ChiSquaredTest::new(historical, recent, params))
            }
            DriftMethod::CramersVTest => {
                Self::CramersV(CramersVTest::new(historical, recent, params))
            }
            DriftMethod::KsTest => Self::Ks(KsTest::new(historical, recent, params)),
            DriftMethod::PsiCalculator => Self::Psi(PsiCalculator::new(historical, recent, params)),
            DriftMethod::ZTest => Self::Z(ZTest::new(historical, recent, params)),
            DriftMethod::Cusum => Self::Cusum(Cusum::new(historical, recent, params)),
            DriftMethod::KlDivergence => {
                Self::KlDivergence(KlDivergence::new(historical, recent, params))
            }
        }
    }

    /// Resolves a column's method identifier and parameter overrides.
    ///
    /// Fails with [`DriftError::UnknownMethod`] for unregistered identifiers.
    pub fn from_config(
        column: &ColumnConfig,
        historical: Arc<Dataset>,
        recent: Arc<Dataset>,
    ) -> Result<Self> {
        let method: DriftMethod = column.method.parse()?;
        let params = column.params();
        params.validate()?;
        Ok(Self::new(method, historical, recent, &params))
    }

    fn inner(&self) -> &dyn DriftDetector {
        match self {
            Self::ChiSquared(d) => d,
            Self::CramersV(d) => d,
            Self::Ks(d) => d,
            Self::Psi(d) => d,
            Self::Z(d) => d,
            Self::Cusum(d) => d,
            Self::KlDivergence(d) => d,
        }
    }
}

impl DriftDetector for Detector {
    fn method(&self) -> DriftMethod {
        self.inner().method()
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        self.inner().detect_drift(column)
    }
}

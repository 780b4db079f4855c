//! Two-sample z-test on means.

use super::descriptive::{mean, sample_std};
use super::special::{normal_ppf, normal_sf};

/// Result of a two-sample z-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZTestOutcome {
    pub z: f64,
    pub z_critical: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    pub drift_detected: bool,
}

/// Compares the means of two samples with an unpooled-variance z statistic.
///
/// The critical value is the two-sided `1 - alpha / 2` normal quantile. NaN
/// statistics never count as drift.
pub fn z_test(historical: &[f64], recent: &[f64], alpha: f64) -> ZTestOutcome {
    z_test_with_sizes(historical, recent, historical.len(), recent.len(), alpha)
}

/// [`z_test`] with the sample sizes in the standard error given explicitly.
///
/// Drift detection passes the row counts of each slice, so rows with a
/// missing value still count towards `n` while the mean and deviation come
/// from the observed values.
pub fn z_test_with_sizes(
    historical: &[f64],
    recent: &[f64],
    historical_rows: usize,
    recent_rows: usize,
    alpha: f64,
) -> ZTestOutcome {
    let n1 = historical_rows as f64;
    let n2 = recent_rows as f64;

    let s1 = sample_std(historical);
    let s2 = sample_std(recent);
    let pooled = (s1 * s1 / n1 + s2 * s2 / n2).sqrt();
    let z = (mean(historical) - mean(recent)) / pooled;

    let z_critical = normal_ppf(1.0 - alpha / 2.0);
    let p_value = 2.0 * normal_sf(z.abs());

    ZTestOutcome {
        z,
        z_critical,
        p_value,
        drift_detected: z.abs() > z_critical,
    }
}

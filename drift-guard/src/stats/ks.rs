//! Two-sample Kolmogorov-Smirnov test.

use super::special::kolmogorov_survival;

/// Result of a two-sample KS test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsOutcome {
    /// Maximum distance between the two empirical CDFs.
    pub statistic: f64,
    pub p_value: f64,
}

/// Largest sample size for which the exact p-value is computed.
pub const EXACT_MAX_SAMPLE: usize = 10_000;

/// Two-sample KS test.
///
/// The p-value is exact when both samples hold at most
/// [`EXACT_MAX_SAMPLE`] values and asymptotic (with Stephens' correction)
/// otherwise. NaN values are ignored. Either sample being empty yields NaN
/// for both the statistic and the p-value.
pub fn ks_2samp(first: &[f64], second: &[f64]) -> KsOutcome {
    let mut a: Vec<f64> = first.iter().copied().filter(|v| !v.is_nan()).collect();
    let mut b: Vec<f64> = second.iter().copied().filter(|v| !v.is_nan()).collect();

    if a.is_empty() || b.is_empty() {
        return KsOutcome {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    }

    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n1, n2) = (a.len(), b.len());
    let (mut i, mut j) = (0usize, 0usize);
    let (mut cdf_a, mut cdf_b) = (0.0f64, 0.0f64);
    let mut d = 0.0f64;

    // Advance through each run of tied values before comparing the CDFs.
    while i < n1 && j < n2 {
        let (x, y) = (a[i], b[j]);
        if x <= y {
            while i < n1 && a[i] == x {
                i += 1;
            }
            cdf_a = i as f64 / n1 as f64;
        }
        if y <= x {
            while j < n2 && b[j] == y {
                j += 1;
            }
            cdf_b = j as f64 / n2 as f64;
        }
        d = d.max((cdf_a - cdf_b).abs());
    }

    let p_value = if n1.max(n2) <= EXACT_MAX_SAMPLE {
        exact_p_value(d, n1, n2)
    } else {
        asymptotic_p_value(d, n1, n2)
    };

    KsOutcome {
        statistic: d,
        p_value,
    }
}

/// `P(D >= d)` under the null, by counting the monotone lattice paths from
/// `(0, 0)` to `(m, n)` that stay strictly inside the band `|i/m - j/n| < d`.
///
/// `paths[j]` holds the in-band path count to `(i, j)` divided by
/// `C(i + n, i)`, so the final cell is a probability and nothing overflows.
fn exact_p_value(d: f64, n1: usize, n2: usize) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let (mf, nf) = (m as f64, n as f64);
    // Nudge below the attainable value so float noise in `d` cannot drop it.
    let band = (0.5 + (d * mf * nf - 1e-7).floor()) / (mf * nf);

    let mut paths: Vec<f64> = (0..=n)
        .map(|j| if j as f64 / nf > band { 0.0 } else { 1.0 })
        .collect();
    for i in 1..=m {
        let scale = i as f64 / (i + n) as f64;
        let x = i as f64 / mf;
        paths[0] = if x > band { 0.0 } else { scale * paths[0] };
        for j in 1..=n {
            paths[j] = if (x - j as f64 / nf).abs() > band {
                0.0
            } else {
                scale * paths[j] + paths[j - 1]
            };
        }
    }

    (1.0 - paths[n]).clamp(0.0, 1.0)
}

fn asymptotic_p_value(d: f64, n1: usize, n2: usize) -> f64 {
    let effective = (n1 * n2) as f64 / (n1 + n2) as f64;
    let root = effective.sqrt();
    kolmogorov_survival((root + 0.12 + 0.11 / root) * d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples() {
        let sample: Vec<f64> = (0..40).map(f64::from).collect();
        let outcome = ks_2samp(&sample, &sample);
        assert_eq!(outcome.statistic, 0.0);
        assert_eq!(outcome.p_value, 1.0);
    }

    #[test]
    fn test_disjoint_samples() {
        let a: Vec<f64> = (0..50).map(f64::from).collect();
        let b: Vec<f64> = (100..150).map(f64::from).collect();
        let outcome = ks_2samp(&a, &b);
        assert_eq!(outcome.statistic, 1.0);
        assert!(outcome.p_value < 1e-10);
    }

    #[test]
    fn test_small_samples_use_exact_distribution() {
        // Two of the twenty orderings reach D = 1.
        let outcome = ks_2samp(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_eq!(outcome.statistic, 1.0);
        assert!((outcome.p_value - 0.1).abs() < 1e-9, "p = {}", outcome.p_value);

        let outcome = ks_2samp(&[1.0, 2.0, 3.0, 4.0], &[3.0, 4.0, 5.0, 6.0]);
        assert!((outcome.p_value - 27.0 / 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_unequal_sizes_exact_is_symmetric() {
        let a = [0.1, 0.4, 0.9, 1.3, 2.2];
        let b = [0.5, 1.1, 1.7, 2.5, 2.9, 3.3, 4.0];
        let ab = ks_2samp(&a, &b);
        let ba = ks_2samp(&b, &a);
        assert_eq!(ab.statistic, ba.statistic);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
        assert!(ab.p_value > 0.0 && ab.p_value < 1.0);
    }

    #[test]
    fn test_large_samples_use_asymptotic_distribution() {
        let a: Vec<f64> = (0..=EXACT_MAX_SAMPLE).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..20).map(|i| i as f64 * 500.0 + 0.5).collect();
        let outcome = ks_2samp(&a, &b);
        let expected = asymptotic_p_value(outcome.statistic, a.len(), b.len());
        assert_eq!(outcome.p_value, expected);
    }

    #[test]
    fn test_partial_overlap_statistic() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [3.0, 4.0, 5.0, 6.0];
        let outcome = ks_2samp(&a, &b);
        assert!((outcome.statistic - 0.5).abs() < 1e-12);
        assert!(outcome.p_value > 0.05);
    }

    #[test]
    fn test_ties_are_grouped() {
        let a = [1.0, 1.0, 1.0, 2.0];
        let b = [1.0, 2.0, 2.0, 2.0];
        let outcome = ks_2samp(&a, &b);
        assert!((outcome.statistic - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_sample_is_nan() {
        let outcome = ks_2samp(&[], &[1.0, 2.0]);
        assert!(outcome.statistic.is_nan());
        assert!(outcome.p_value.is_nan());

        let outcome = ks_2samp(&[f64::NAN], &[1.0]);
        assert!(outcome.statistic.is_nan());
    }
}

//! Two-sided cumulative sum change detection.

/// Returns the indices where the cumulative sums of deviations from
/// `target_mean` cross `threshold`.
///
/// The upper sum accumulates positive deviations and the lower sum negative
/// ones. After a crossing both sums restart at zero. A NaN element (a
/// missing value) keeps its index but resets both sums without crossing.
pub fn cusum_crossings(series: &[f64], target_mean: f64, threshold: f64) -> Vec<usize> {
    let mut upper = 0.0f64;
    let mut lower = 0.0f64;
    let mut crossings = Vec::new();

    for (idx, &value) in series.iter().enumerate() {
        let deviation = value - target_mean;
        if deviation.is_nan() {
            upper = 0.0;
            lower = 0.0;
            continue;
        }
        upper = (upper + deviation).max(0.0);
        lower = (lower + deviation).min(0.0);
        if upper > threshold || lower < -threshold {
            crossings.push(idx);
            upper = 0.0;
            lower = 0.0;
        }
    }

    crossings
}

//! Descriptive statistics shared by the location and shift tests.

/// Arithmetic mean; NaN for an empty sample.
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return f64::NAN;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Sample variance with Bessel's correction (ddof = 1); NaN below two values.
pub fn sample_variance(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        return f64::NAN;
    }
    let m = mean(sample);
    let squared: f64 = sample.iter().map(|v| (v - m) * (v - m)).sum();
    squared / (sample.len() - 1) as f64
}

/// Sample standard deviation (ddof = 1); NaN below two values.
pub fn sample_std(sample: &[f64]) -> f64 {
    sample_variance(sample).sqrt()
}

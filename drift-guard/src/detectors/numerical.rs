//! Detectors for numeric columns.
//!
//! All of them extract the column from both slices (casting any Arrow numeric
//! type to `f64`) and hand the values to a primitive in [`crate::stats`].
//! CUSUM keeps null rows in place; the others drop them.

use std::sync::Arc;

use tracing::trace;

use super::{DetectorParams, DriftDetector, DriftMethod, DriftResult};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::stats::{
    cusum_crossings, kl_divergence, ks_2samp, mean, population_stability_index,
    z_test_with_sizes,
};

fn numeric_columns(
    historical: &Dataset,
    recent: &Dataset,
    column: &str,
) -> Result<(Vec<f64>, Vec<f64>)> {
    // Resolve the column on both sides before checking types.
    historical.column(column)?;
    recent.column(column)?;
    Ok((
        historical.numeric_values(column)?,
        recent.numeric_values(column)?,
    ))
}

/// Two-sample Kolmogorov-Smirnov test; reports the p-value.
#[derive(Debug, Clone)]
pub struct KsTest {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    alpha: f64,
}

impl KsTest {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            alpha: params.alpha,
        }
    }
}

impl DriftDetector for KsTest {
    fn method(&self) -> DriftMethod {
        DriftMethod::KsTest
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let (historical, recent) = numeric_columns(&self.historical, &self.recent, column)?;
        let outcome = ks_2samp(&historical, &recent);
        trace!(column, d = outcome.statistic, p_value = outcome.p_value, "ks test");
        Ok(DriftResult::new(outcome.p_value < self.alpha, outcome.p_value))
    }
}

/// Population Stability Index over historical-range bins.
#[derive(Debug, Clone)]
pub struct PsiCalculator {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    bins: usize,
    epsilon: f64,
    threshold: f64,
}

impl PsiCalculator {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            bins: params.bins,
            epsilon: params.epsilon,
            threshold: params.threshold,
        }
    }
}

impl DriftDetector for PsiCalculator {
    fn method(&self) -> DriftMethod {
        DriftMethod::PsiCalculator
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let (historical, recent) = numeric_columns(&self.historical, &self.recent, column)?;
        let psi = population_stability_index(&historical, &recent, self.bins, self.epsilon);
        Ok(DriftResult::new(psi > self.threshold, psi))
    }
}

/// Two-sample z-test on the means; reports the two-sided p-value.
///
/// Means and deviations use the non-null values; the sample sizes are the
/// slice row counts, nulls included.
#[derive(Debug, Clone)]
pub struct ZTest {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    alpha: f64,
}

impl ZTest {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            alpha: params.alpha,
        }
    }
}

impl DriftDetector for ZTest {
    fn method(&self) -> DriftMethod {
        DriftMethod::ZTest
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let (historical, recent) = numeric_columns(&self.historical, &self.recent, column)?;
        let outcome = z_test_with_sizes(
            &historical,
            &recent,
            self.historical.num_rows(),
            self.recent.num_rows(),
            self.alpha,
        );
        trace!(
            column,
            z = outcome.z,
            z_critical = outcome.z_critical,
            p_value = outcome.p_value,
            "z test"
        );
        Ok(DriftResult::new(outcome.drift_detected, outcome.p_value))
    }
}

/// Two-sided CUSUM over the recent values followed by the historical ones.
///
/// The target is the historical mean. The reported statistic is the number of
/// threshold crossings; [`Cusum::crossings`] returns their indices.
#[derive(Debug, Clone)]
pub struct Cusum {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    threshold: f64,
}

impl Cusum {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            threshold: params.threshold,
        }
    }

    /// Row indices into the concatenated `recent ++ historical` series where
    /// a cumulative sum crossed the threshold.
    ///
    /// Null rows keep their position and reset both sums.
    pub fn crossings(&self, column: &str) -> Result<Vec<usize>> {
        self.historical.column(column)?;
        self.recent.column(column)?;
        let historical = self.historical.numeric_series(column)?;
        let recent = self.recent.numeric_series(column)?;

        let observed: Vec<f64> = historical.iter().copied().filter(|v| !v.is_nan()).collect();
        let target = mean(&observed);
        let series: Vec<f64> = recent.iter().chain(&historical).copied().collect();
        Ok(cusum_crossings(&series, target, self.threshold))
    }
}

impl DriftDetector for Cusum {
    fn method(&self) -> DriftMethod {
        DriftMethod::Cusum
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let crossings = self.crossings(column)?;
        trace!(column, crossings = ?crossings, "cusum");
        Ok(DriftResult::new(
            !crossings.is_empty(),
            crossings.len() as f64,
        ))
    }
}

/// Kullback-Leibler divergence of the historical from the recent histogram.
#[derive(Debug, Clone)]
pub struct KlDivergence {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    bins: usize,
    threshold: f64,
}

impl KlDivergence {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            bins: params.bins,
            threshold: params.threshold,
        }
    }
}

impl DriftDetector for KlDivergence {
    fn method(&self) -> DriftMethod {
        DriftMethod::KlDivergence
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let (historical, recent) = numeric_columns(&self.historical, &self.recent, column)?;
        let kl = kl_divergence(&historical, &recent, self.bins);
        Ok(DriftResult::new(kl > self.threshold, kl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriftError;
    use crate::stats::special::normal_sf;
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    fn values(name: &str, values: Vec<Option<f64>>) -> Arc<Dataset> {
        let labels: Vec<&str> = values.iter().map(|_| "x").collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("amount", DataType::Float64, true),
            Field::new("label", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(values)),
                Arc::new(StringArray::from(labels)),
            ],
        )
        .unwrap();
        Arc::new(Dataset::new(name, batch))
    }

    fn dense(range: std::ops::Range<i32>, offset: f64) -> Vec<Option<f64>> {
        range.map(|i| Some(f64::from(i % 20) + offset)).collect()
    }

    #[test]
    fn test_shift_detected_by_every_numeric_detector() {
        let historical = values("h", dense(0..200, 0.0));
        let recent = values("r", dense(0..200, 40.0));
        let params = DetectorParams::default();

        let ks = KsTest::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(ks.drift_detected);
        assert!(ks.statistic < 0.05);

        let psi = PsiCalculator::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(psi.drift_detected);
        assert!(psi.statistic > 0.1);

        let z = ZTest::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(z.drift_detected);
        assert!(z.statistic < 0.05);

        let cusum = Cusum::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(cusum.drift_detected);
        assert!(cusum.statistic >= 1.0);

        let kl = KlDivergence::new(historical, recent, &params)
            .detect_drift("amount")
            .unwrap();
        assert!(kl.drift_detected);
        assert_eq!(kl.statistic, f64::INFINITY);
    }

    #[test]
    fn test_identical_slices_not_detected() {
        let historical = values("h", dense(0..200, 0.0));
        let recent = values("r", dense(0..100, 0.0));
        let params = DetectorParams::default();

        let ks = KsTest::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(!ks.drift_detected);

        let psi = PsiCalculator::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(!psi.drift_detected);
        assert!(psi.statistic < 1e-9);

        let z = ZTest::new(historical.clone(), recent.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(!z.drift_detected);

        let kl = KlDivergence::new(historical, recent, &params)
            .detect_drift("amount")
            .unwrap();
        assert!(!kl.drift_detected);
        assert!(kl.statistic.abs() < 1e-12);
    }

    #[test]
    fn test_cusum_reports_separated_crossings() {
        let historical = values("h", vec![Some(0.0); 8]);
        let mut recent = vec![Some(0.0); 10];
        recent[2] = Some(1.0);
        recent[7] = Some(1.0);
        let recent = values("r", recent);

        let params = DetectorParams::default().with_threshold(0.5);
        let detector = Cusum::new(historical, recent, &params);
        assert_eq!(detector.crossings("amount").unwrap(), vec![2, 7]);

        let result = detector.detect_drift("amount").unwrap();
        assert!(result.drift_detected);
        assert_eq!(result.statistic, 2.0);
    }

    #[test]
    fn test_nulls_are_ignored() {
        let historical = values("h", vec![Some(1.0), None, Some(3.0), None, Some(2.0)]);
        let recent = values("r", vec![None, Some(2.0), Some(1.0), Some(3.0)]);
        let result = ZTest::new(historical, recent, &DetectorParams::default())
            .detect_drift("amount")
            .unwrap();
        assert!(!result.drift_detected);
        assert!((result.statistic - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_test_sample_sizes_count_null_rows() {
        let mut historical: Vec<Option<f64>> = (0..5).map(|i| Some(f64::from(i))).collect();
        let mut recent: Vec<Option<f64>> = (2..7).map(|i| Some(f64::from(i))).collect();
        historical.extend(vec![None; 15]);
        recent.extend(vec![None; 15]);

        let result = ZTest::new(
            values("h", historical),
            values("r", recent),
            &DetectorParams::default(),
        )
        .detect_drift("amount")
        .unwrap();
        // Means 2 and 4, variances 2.5, twenty rows per slice: z = -4.
        assert!(result.drift_detected);
        assert!((result.statistic - 2.0 * normal_sf(4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_ks_small_samples_use_exact_p_value() {
        let historical = values("h", vec![Some(1.0), Some(2.0), Some(3.0)]);
        let recent = values("r", vec![Some(4.0), Some(5.0), Some(6.0)]);
        let result = KsTest::new(historical, recent, &DetectorParams::default())
            .detect_drift("amount")
            .unwrap();
        assert!(!result.drift_detected);
        assert!((result.statistic - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_cusum_null_rows_keep_their_position() {
        let historical = values("h", vec![Some(0.0); 4]);
        let recent = values("r", vec![None, None, Some(0.0), Some(1.0)]);
        let detector = Cusum::new(
            historical.clone(),
            recent,
            &DetectorParams::default().with_threshold(0.5),
        );
        assert_eq!(detector.crossings("amount").unwrap(), vec![3]);

        // The null at index 1 clears the 0.4 accumulated before it.
        let recent = values("r", vec![Some(0.4), None, Some(0.4), Some(0.4)]);
        let detector = Cusum::new(
            historical,
            recent,
            &DetectorParams::default().with_threshold(0.5),
        );
        assert_eq!(detector.crossings("amount").unwrap(), vec![3]);
    }

    #[test]
    fn test_degenerate_inputs_do_not_panic() {
        let empty = values("h", vec![]);
        let single = values("r", vec![Some(5.0)]);
        let params = DetectorParams::default();

        let ks = KsTest::new(empty.clone(), single.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(ks.statistic.is_nan());
        assert!(!ks.drift_detected);

        let z = ZTest::new(single.clone(), single.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(z.statistic.is_nan());

        let kl = KlDivergence::new(single.clone(), empty.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(kl.statistic.is_nan());
        assert!(!kl.drift_detected);

        let psi = PsiCalculator::new(empty.clone(), empty.clone(), &params)
            .detect_drift("amount")
            .unwrap();
        assert!(psi.statistic.is_finite());

        let cusum = Cusum::new(empty, single, &params)
            .detect_drift("amount")
            .unwrap();
        assert_eq!(cusum.statistic, 0.0);
    }

    #[test]
    fn test_string_column_is_type_mismatch() {
        let historical = values("h", dense(0..10, 0.0));
        let recent = values("r", dense(0..10, 0.0));
        let err = KsTest::new(historical, recent, &DetectorParams::default())
            .detect_drift("label")
            .unwrap_err();
        assert!(matches!(err, DriftError::TypeMismatch { .. }));
    }
}

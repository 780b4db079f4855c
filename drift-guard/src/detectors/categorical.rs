//! Detectors for categorical columns.
//!
//! Both detectors cross-tabulate the historical and recent values of a
//! column. Rows are paired by position, so the table has one entry per
//! index present in both slices; pairs where either side is null are dropped.

use std::sync::Arc;

use tracing::trace;

use super::{DetectorParams, DriftDetector, DriftMethod, DriftResult};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::stats::{chi2_contingency, cramers_v, ContingencyTable};

fn contingency_table(historical: &Dataset, recent: &Dataset, column: &str) -> Result<ContingencyTable> {
    let historical = historical.categorical_values(column)?;
    let recent = recent.categorical_values(column)?;
    let pairs = historical
        .iter()
        .zip(&recent)
        .filter_map(|(h, r)| Some((h.as_deref()?, r.as_deref()?)));
    Ok(ContingencyTable::from_pairs(pairs))
}

/// Chi-squared test of association; reports the p-value.
#[derive(Debug, Clone)]
pub struct ChiSquaredTest {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    alpha: f64,
}

impl ChiSquaredTest {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            alpha: params.alpha,
        }
    }
}

impl DriftDetector for ChiSquaredTest {
    fn method(&self) -> DriftMethod {
        DriftMethod::ChiSquaredTest
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let table = contingency_table(&self.historical, &self.recent, column)?;
        let outcome = chi2_contingency(&table);
        trace!(
            column,
            chi2 = outcome.statistic,
            dof = outcome.dof,
            p_value = outcome.p_value,
            "chi-squared test"
        );
        Ok(DriftResult::new(outcome.p_value < self.alpha, outcome.p_value))
    }
}

/// Cramér's V effect size; decides on the chi-squared p-value.
#[derive(Debug, Clone)]
pub struct CramersVTest {
    historical: Arc<Dataset>,
    recent: Arc<Dataset>,
    alpha: f64,
}

impl CramersVTest {
    pub fn new(historical: Arc<Dataset>, recent: Arc<Dataset>, params: &DetectorParams) -> Self {
        Self {
            historical,
            recent,
            alpha: params.alpha,
        }
    }
}

impl DriftDetector for CramersVTest {
    fn method(&self) -> DriftMethod {
        DriftMethod::CramersVTest
    }

    fn detect_drift(&self, column: &str) -> Result<DriftResult> {
        let table = contingency_table(&self.historical, &self.recent, column)?;
        let outcome = chi2_contingency(&table);
        let v = cramers_v(&table);
        trace!(column, cramers_v = v, p_value = outcome.p_value, "cramer's v");
        Ok(DriftResult::new(outcome.p_value < self.alpha, v))
    }
}

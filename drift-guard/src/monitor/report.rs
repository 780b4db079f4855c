//! Drift report produced by a monitor run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ColumnConfig;
use crate::detectors::{DriftMethod, DriftResult};
use crate::error::DriftError;

/// Replaces a non-finite statistic with `0.0`.
///
/// Returns the sanitized value and whether a replacement happened. Applying
/// it to its own output is a no-op.
pub fn sanitize_statistic(statistic: f64) -> (f64, bool) {
    if statistic.is_finite() {
        (statistic, false)
    } else {
        (0.0, true)
    }
}

/// Report entry for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub method: DriftMethod,
    pub drift_detected: bool,
    /// Always finite.
    pub statistic: f64,
    /// The detector produced NaN or an infinity, reported here as `0.0`.
    pub degenerate: bool,
}

impl ColumnDrift {
    /// Builds an entry from a raw detector result, sanitizing the statistic.
    pub fn from_result(method: DriftMethod, result: DriftResult) -> Self {
        let (statistic, degenerate) = sanitize_statistic(result.statistic);
        Self {
            method,
            drift_detected: result.drift_detected,
            statistic,
            degenerate,
        }
    }

    /// The `(drift_detected, statistic)` pair.
    pub fn status(&self) -> (bool, f64) {
        (self.drift_detected, self.statistic)
    }
}

/// A table or column that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftFailure {
    pub table: String,
    /// Absent when the whole table failed (loading, validation, split).
    pub column: Option<String>,
    /// The configured method identifier, as written.
    pub method: Option<String>,
    pub error: String,
    /// Whether the failure stems from configuration rather than data.
    pub configuration: bool,
}

impl DriftFailure {
    /// A failure affecting the whole table.
    pub fn for_table(table: impl Into<String>, error: &DriftError) -> Self {
        Self {
            table: table.into(),
            column: None,
            method: None,
            error: error.to_string(),
            configuration: error.is_configuration_error(),
        }
    }

    /// A failure affecting one configured column.
    pub fn for_column(table: impl Into<String>, column: &ColumnConfig, error: &DriftError) -> Self {
        Self {
            table: table.into(),
            column: Some(column.name.clone()),
            method: Some(column.method.clone()),
            error: error.to_string(),
            configuration: error.is_configuration_error(),
        }
    }
}

/// Timing and provenance of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Timestamp when the run started.
    pub start_time: Option<DateTime<Utc>>,
    /// Timestamp when the run completed.
    pub end_time: Option<DateTime<Utc>>,
    /// Seed of the split RNG, when one was configured.
    pub seed: Option<u64>,
}

impl RunMetadata {
    pub fn record_start(&mut self) {
        self.start_time = Some(Utc::now());
    }

    pub fn record_end(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Run duration, once both timestamps are recorded.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Aggregate counts over a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub tables: usize,
    pub columns: usize,
    pub drifted: usize,
    pub degenerate: usize,
    pub failures: usize,
}

/// Per-table, per-column drift statuses of one run.
///
/// # Example
///
/// ```rust,ignore
/// let report = monitor.run().await?;
/// for (table, columns) in report.statuses() {
///     for (column, (drift, statistic)) in columns {
///         println!("{table}.{column}: drift={drift} statistic={statistic}");
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    tables: BTreeMap<String, BTreeMap<String, ColumnDrift>>,
    failures: Vec<DriftFailure>,
    metadata: RunMetadata,
}

impl DriftReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a column entry, replacing any previous entry for the same column.
    pub fn record(&mut self, table: impl Into<String>, column: impl Into<String>, drift: ColumnDrift) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), drift);
    }

    pub fn record_failure(&mut self, failure: DriftFailure) {
        self.failures.push(failure);
    }

    /// Looks up one column entry.
    pub fn get(&self, table: &str, column: &str) -> Option<&ColumnDrift> {
        self.tables.get(table)?.get(column)
    }

    /// Entries grouped by table.
    pub fn tables(&self) -> &BTreeMap<String, BTreeMap<String, ColumnDrift>> {
        &self.tables
    }

    /// Iterates over `(table, column, entry)` in table then column order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &ColumnDrift)> {
        self.tables.iter().flat_map(|(table, columns)| {
            columns
                .iter()
                .map(move |(column, drift)| (table.as_str(), column.as_str(), drift))
        })
    }

    pub fn failures(&self) -> &[DriftFailure] {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// True when a failure came from the configuration rather than the data.
    pub fn has_configuration_failures(&self) -> bool {
        self.failures.iter().any(|failure| failure.configuration)
    }

    /// True when any column reports drift.
    pub fn drift_detected(&self) -> bool {
        self.entries().any(|(_, _, drift)| drift.drift_detected)
    }

    /// The bare `table -> column -> (drift_detected, statistic)` mapping.
    pub fn statuses(&self) -> BTreeMap<String, BTreeMap<String, (bool, f64)>> {
        self.tables
            .iter()
            .map(|(table, columns)| {
                let columns = columns
                    .iter()
                    .map(|(column, drift)| (column.clone(), drift.status()))
                    .collect();
                (table.clone(), columns)
            })
            .collect()
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut RunMetadata {
        &mut self.metadata
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            tables: self.tables.len(),
            columns: 0,
            drifted: 0,
            degenerate: 0,
            failures: self.failures.len(),
        };
        for (_, _, drift) in self.entries() {
            summary.columns += 1;
            summary.drifted += usize::from(drift.drift_detected);
            summary.degenerate += usize::from(drift.degenerate);
        }
        summary
    }
}

//! Running detectors over configured tables and collecting the outcome.
//!
//! [`DriftMonitor`] drives a run; [`DriftReport`] is what it returns.

mod report;
mod runner;

pub use report::{
    sanitize_statistic, ColumnDrift, DriftFailure, DriftReport, ReportSummary, RunMetadata,
};
pub use runner::{DriftMonitor, ProgressCallback};

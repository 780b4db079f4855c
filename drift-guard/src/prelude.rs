//! Prelude for commonly used types and traits in drift-guard.

pub use crate::config::{ColumnConfig, MonitorConfig, TableConfig};
pub use crate::dataset::Dataset;
pub use crate::detectors::{Detector, DetectorParams, DriftDetector, DriftMethod, DriftResult};
pub use crate::error::{DriftError, ErrorContext, Result};
pub use crate::formatters::{HumanFormatter, JsonFormatter, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::monitor::{ColumnDrift, DriftMonitor, DriftReport};
pub use crate::schema::{ColumnCheck, ColumnSchema, ColumnType, TableSchema};
pub use crate::sources::{FileFormat, FileLoader, InMemoryLoader, TableLoader};

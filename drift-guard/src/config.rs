//! Monitor configuration.
//!
//! A [`MonitorConfig`] is an explicit value: it is parsed from TOML (or built
//! in code) and handed to [`DriftMonitor::new`](crate::monitor::DriftMonitor::new).
//! Nothing here reads process-wide state.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::detectors::DetectorParams;
use crate::error::{DriftError, ErrorContext, Result};
use crate::logging::setup::LoggingConfig;
use crate::schema::TableSchema;
use crate::sources::FileFormat;

/// Default share of rows assigned to the historical slice.
pub const DEFAULT_HISTORICAL_FRACTION: f64 = 0.8;

fn default_historical_fraction() -> f64 {
    DEFAULT_HISTORICAL_FRACTION
}

fn default_level() -> String {
    "info".to_string()
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub monitor: MonitorSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// Named schemas tables can refer to.
    #[serde(default)]
    pub schemas: BTreeMap<String, TableSchema>,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

/// `[monitor]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSection {
    #[serde(default = "default_historical_fraction")]
    pub historical_fraction: f64,
    /// Seed for the split RNG; OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            historical_fraction: DEFAULT_HISTORICAL_FRACTION,
            seed: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Full `EnvFilter` directive, overriding `level`.
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            filter: None,
        }
    }
}

impl LoggingSection {
    /// Converts the section into a subscriber configuration.
    pub fn to_logging_config(&self) -> Result<LoggingConfig> {
        let level = Level::from_str(&self.level).map_err(|_| {
            DriftError::Configuration(format!("invalid log level '{}'", self.level))
        })?;
        let mut config = LoggingConfig::default()
            .with_drift_level(level)
            .with_json_format(self.json);
        if let Some(filter) = &self.filter {
            config = config.with_env_filter(filter.clone());
        }
        Ok(config)
    }
}

/// One monitored table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Report name; defaults to `source`.
    #[serde(default)]
    pub name: Option<String>,
    /// Locator understood by the loader (a path for the file loader).
    pub source: String,
    /// Explicit format; inferred from the extension when absent.
    #[serde(default)]
    pub format: Option<FileFormat>,
    /// Name of an entry in `schemas`.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

impl TableConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            name: None,
            source: source.into(),
            format: None,
            schema: None,
            columns: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    /// Name used in the report and in log events.
    pub fn table_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.source)
    }
}

/// One monitored column and the detector applied to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    /// Detection method identifier, resolved at dispatch time.
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            alpha: None,
            bins: None,
            epsilon: None,
            threshold: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Default parameters with this column's overrides applied.
    pub fn params(&self) -> DetectorParams {
        let defaults = DetectorParams::default();
        DetectorParams {
            alpha: self.alpha.unwrap_or(defaults.alpha),
            bins: self.bins.unwrap_or(defaults.bins),
            epsilon: self.epsilon.unwrap_or(defaults.epsilon),
            threshold: self.threshold.unwrap_or(defaults.threshold),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.monitor.seed = Some(seed);
        self
    }

    pub fn with_historical_fraction(mut self, fraction: f64) -> Self {
        self.monitor.historical_fraction = fraction;
        self
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: TableSchema) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.tables.push(table);
        self
    }

    /// Resolves the schema a table refers to.
    pub fn schema_for(&self, table: &TableConfig) -> Result<Option<&TableSchema>> {
        match &table.schema {
            None => Ok(None),
            Some(name) => self.schemas.get(name).map(Some).ok_or_else(|| {
                DriftError::Configuration(format!(
                    "table '{}' refers to unknown schema '{name}'",
                    table.table_name()
                ))
            }),
        }
    }

    /// Checks structural consistency.
    ///
    /// Method identifiers are resolved at dispatch time, where an unknown
    /// method fails only its own column.
    pub fn validate(&self) -> Result<()> {
        let fraction = self.monitor.historical_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(DriftError::Configuration(format!(
                "historical_fraction must be within [0, 1], got {fraction}"
            )));
        }

        self.logging.to_logging_config()?;

        for (name, schema) in &self.schemas {
            schema
                .validate_definition()
                .map_err(|e| DriftError::Configuration(format!("schema '{name}': {e}")))?;
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            let name = table.table_name();
            if !seen.insert(name) {
                return Err(DriftError::Configuration(format!(
                    "table '{name}' is configured more than once"
                )));
            }
            self.schema_for(table)?;
            let mut columns = HashSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(DriftError::Configuration(format!(
                        "table '{name}': column '{}' is configured more than once",
                        column.name
                    )));
                }
                column.params().validate().map_err(|e| {
                    DriftError::Configuration(format!(
                        "table '{name}', column '{}': {e}",
                        column.name
                    ))
                })?;
            }
        }

        Ok(())
    }
}

//! Error types for the drift-guard library.
//!
//! All fallible operations return [`DriftError`] through the crate-wide
//! [`Result`] alias. Numeric degeneracy (a test producing NaN or infinity) is
//! not an error: detectors return the raw value and the
//! monitor sanitizes it when building the report.

use thiserror::Error;

/// The main error type for drift-guard.
#[derive(Error, Debug)]
pub enum DriftError {
    /// A configured detection method identifier is not registered.
    #[error("Unknown drift detection method: '{method}'")]
    UnknownMethod {
        /// The identifier exactly as it appeared in configuration
        method: String,
    },

    /// A configured column is absent from one of the dataset slices.
    #[error("Column '{column}' not found in dataset '{dataset}'")]
    ColumnNotFound { column: String, dataset: String },

    /// A column has a type the requested operation cannot use.
    #[error("Type mismatch for column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Invalid or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A dataset did not satisfy its declared schema.
    #[error("Schema validation failed for '{table}': {}", .violations.join("; "))]
    SchemaViolation {
        /// Table the schema was applied to
        table: String,
        /// Every violation found, in column order
        violations: Vec<String>,
    },

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "csv", "parquet")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when parsing configuration or data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error from serialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DriftError>`.
pub type Result<T> = std::result::Result<T, DriftError>;

impl DriftError {
    /// Creates an unknown method error.
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(column: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
            dataset: dataset.into(),
        }
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true for errors caused by configuration rather than data or I/O.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownMethod { .. }
                | Self::ColumnNotFound { .. }
                | Self::TypeMismatch { .. }
                | Self::Configuration(_)
        )
    }
}

impl From<toml::de::Error> for DriftError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<DriftError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            DriftError::Internal(inner) => DriftError::Internal(format!("{}: {}", f(), inner)),
            DriftError::Io(io) => DriftError::data_source_with_source("io", f(), Box::new(io)),
            other => DriftError::Internal(format!("{}: {}", f(), other)),
        })
    }
}

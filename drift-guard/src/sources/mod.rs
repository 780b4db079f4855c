//! Table loaders for the drift monitor.
//!
//! A [`TableLoader`] turns a configured table into a [`Dataset`]. The file
//! loader reads CSV, JSON and Parquet through DataFusion; the in-memory loader
//! serves record batches that were produced elsewhere.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TableConfig;
use crate::dataset::Dataset;
use crate::error::Result;

mod file;
mod memory;

pub use file::{FileLoader, FileLoaderOptions};
pub use memory::InMemoryLoader;

/// Loads a configured table into memory.
///
/// # Examples
///
/// ```rust,ignore
/// use drift_guard::sources::{FileLoader, TableLoader};
///
/// # async fn example(table: &drift_guard::config::TableConfig) -> drift_guard::Result<()> {
/// let loader = FileLoader::new();
/// let dataset = loader.load(table).await?;
/// println!("{} rows", dataset.num_rows());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TableLoader: Debug + Send + Sync {
    /// Loads the table described by `table`, naming the dataset after
    /// [`TableConfig::table_name`].
    async fn load(&self, table: &TableConfig) -> Result<Dataset>;

    /// Returns a human-readable description of this loader.
    fn description(&self) -> String;
}

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    /// A JSON array of objects, or newline-delimited JSON objects.
    Json,
    Parquet,
}

impl FileFormat {
    /// Infers the format from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "json" | "jsonl" | "ndjson" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Parquet => "parquet",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! In-memory table loader.

use std::collections::HashMap;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use tracing::debug;

use super::TableLoader;
use crate::config::TableConfig;
use crate::dataset::Dataset;
use crate::error::{DriftError, Result};

/// Serves record batches registered under a locator.
///
/// The locator is matched against [`TableConfig::source`], so the same
/// configuration can run against files or against data built in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    tables: HashMap<String, RecordBatch>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `batch` under `source`, replacing any previous entry.
    pub fn with_table(mut self, source: impl Into<String>, batch: RecordBatch) -> Self {
        self.insert(source, batch);
        self
    }

    pub fn insert(&mut self, source: impl Into<String>, batch: RecordBatch) {
        self.tables.insert(source.into(), batch);
    }
}

#[async_trait]
impl TableLoader for InMemoryLoader {
    async fn load(&self, table: &TableConfig) -> Result<Dataset> {
        let batch = self.tables.get(&table.source).ok_or_else(|| {
            DriftError::data_source(
                "memory",
                format!("no in-memory table registered as '{}'", table.source),
            )
        })?;
        debug!(source = %table.source, rows = batch.num_rows(), "Serving in-memory table");
        Ok(Dataset::new(table.table_name(), batch.clone()))
    }

    fn description(&self) -> String {
        format!("in-memory loader ({} tables)", self.tables.len())
    }
}

//! File-backed table loader built on DataFusion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::json::reader::{infer_json_schema_from_iterator, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::prelude::*;
use tracing::{debug, info, instrument};

use super::{FileFormat, TableLoader};
use crate::config::TableConfig;
use crate::dataset::Dataset;
use crate::error::{DriftError, Result};

/// Options for reading delimited files.
#[derive(Debug, Clone)]
pub struct FileLoaderOptions {
    /// Whether CSV files have a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for FileLoaderOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            schema_infer_max_records: 1000,
        }
    }
}

/// Reads tables from the local filesystem.
///
/// Relative locators are resolved against the base directory when one is
/// set, which lets a configuration file refer to data next to it.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base_dir: Option<PathBuf>,
    options: FileLoaderOptions,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative paths against `base_dir`.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_options(mut self, options: FileLoaderOptions) -> Self {
        self.options = options;
        self
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn read_csv(&self, ctx: &SessionContext, path: &str, extension: &str) -> Result<Dataset> {
        // Tab-separated files override the configured delimiter.
        let delimiter = if extension.eq_ignore_ascii_case(".tsv") {
            b'\t'
        } else {
            self.options.delimiter
        };
        let options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(delimiter)
            .schema_infer_max_records(self.options.schema_infer_max_records)
            .file_extension(extension);
        let df = ctx.read_csv(path, options).await?;
        collect(path, df).await
    }

    async fn read_ndjson(
        &self,
        ctx: &SessionContext,
        path: &str,
        extension: &str,
    ) -> Result<Dataset> {
        let mut options = NdJsonReadOptions::default().file_extension(extension);
        options.schema_infer_max_records = self.options.schema_infer_max_records;
        let df = ctx.read_json(path, options).await?;
        collect(path, df).await
    }

    async fn read_parquet(
        &self,
        ctx: &SessionContext,
        path: &str,
        extension: &str,
    ) -> Result<Dataset> {
        let mut options = ParquetReadOptions::default();
        options.file_extension = extension;
        let df = ctx.read_parquet(path, options).await?;
        collect(path, df).await
    }

    async fn read_json(&self, ctx: &SessionContext, path: &str, extension: &str) -> Result<Dataset> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DriftError::data_source_with_source("json", format!("cannot read '{path}'"), Box::new(e))
        })?;

        if content.trim_start().starts_with('[') {
            debug!(path, "reading JSON array document");
            json_array_to_dataset(path, &content)
        } else {
            self.read_ndjson(ctx, path, extension).await
        }
    }
}

async fn collect(name: &str, df: DataFrame) -> Result<Dataset> {
    let planned = df.schema().inner().clone();
    let batches = df.collect().await?;
    let schema = batches.first().map(RecordBatch::schema).unwrap_or(planned);
    Dataset::from_batches(name, schema, &batches)
}

/// Decodes a JSON array of flat objects into a single record batch.
fn json_array_to_dataset(name: &str, content: &str) -> Result<Dataset> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(content)?;
    if let Some(position) = rows.iter().position(|row| !row.is_object()) {
        return Err(DriftError::data_source(
            "json",
            format!("element {position} of '{name}' is not an object"),
        ));
    }

    let schema = Arc::new(infer_json_schema_from_iterator(rows.iter().map(Ok))?);
    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(rows.len().max(1))
        .build_decoder()?;
    decoder.serialize(&rows)?;
    let batch = decoder
        .flush()?
        .unwrap_or_else(|| RecordBatch::new_empty(schema));
    Ok(Dataset::new(name, batch))
}

#[async_trait]
impl TableLoader for FileLoader {
    #[instrument(skip(self, table), fields(table.name = %table.table_name(), source = %table.source))]
    async fn load(&self, table: &TableConfig) -> Result<Dataset> {
        let path = self.resolve(&table.source);
        let format = table
            .format
            .or_else(|| FileFormat::from_path(&path))
            .ok_or_else(|| {
                DriftError::Configuration(format!(
                    "cannot infer file format of '{}'; set `format` explicitly",
                    table.source
                ))
            })?;

        tokio::fs::metadata(&path).await.map_err(|e| {
            DriftError::data_source_with_source(
                format.as_str(),
                format!("cannot access '{}'", path.display()),
                Box::new(e),
            )
        })?;

        let path_str = path.to_str().ok_or_else(|| {
            DriftError::Configuration("Path contains invalid UTF-8".to_string())
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        info!(
            table.name = %table.table_name(),
            source.path = %path.display(),
            source.format = %format,
            "Loading table"
        );

        let ctx = SessionContext::new();
        let dataset = match format {
            FileFormat::Csv => self.read_csv(&ctx, path_str, &extension).await?,
            FileFormat::Json => self.read_json(&ctx, path_str, &extension).await?,
            FileFormat::Parquet => self.read_parquet(&ctx, path_str, &extension).await?,
        };

        debug!(
            rows = dataset.num_rows(),
            columns = dataset.schema().fields().len(),
            "Loaded table"
        );
        Ok(Dataset::new(table.table_name(), dataset.batch().clone()))
    }

    fn description(&self) -> String {
        match &self.base_dir {
            Some(base) => format!("file loader (base: {})", base.display()),
            None => "file loader".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(source: &str) -> TableConfig {
        TableConfig {
            name: Some("orders".to_string()),
            source: source.to_string(),
            format: None,
            schema: None,
            columns: Vec::new(),
        }
    }

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_csv() {
        let file = temp_file(".csv", "id,amount,channel\n1,10.5,web\n2,11.0,app\n3,9.5,web\n");
        let dataset = FileLoader::new()
            .load(&table(file.path().to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(dataset.name(), "orders");
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(
            dataset.numeric_values("amount").unwrap(),
            vec![10.5, 11.0, 9.5]
        );
    }

    #[tokio::test]
    async fn test_load_ndjson() {
        let file = temp_file(".jsonl", "{\"a\": 1, \"b\": \"x\"}\n{\"a\": 2, \"b\": \"y\"}\n");
        let dataset = FileLoader::new()
            .load(&table(file.path().to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(dataset.numeric_values("a").unwrap(), vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_load_json_array() {
        let file = temp_file(".json", "[{\"a\": 1.5, \"b\": \"x\"}, {\"a\": 2.5, \"b\": null}]");
        let dataset = FileLoader::new()
            .load(&table(file.path().to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(
            dataset.categorical_values("b").unwrap(),
            vec![Some("x".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_relative_path_uses_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("events.csv"), "v\n1\n2\n").unwrap();

        let dataset = FileLoader::new()
            .with_base_dir(dir.path())
            .load(&table("events.csv"))
            .await
            .unwrap();
        assert_eq!(dataset.num_rows(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_data_source_error() {
        let err = FileLoader::new()
            .load(&table("/definitely/not/here.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, DriftError::DataSource { .. }));
    }

    #[tokio::test]
    async fn test_unknown_extension_requires_format() {
        let err = FileLoader::new()
            .load(&table("data.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, DriftError::Configuration(_)));
    }
}

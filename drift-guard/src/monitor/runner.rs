//! Orchestration of a full monitoring run.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, instrument, warn};

use super::report::{ColumnDrift, DriftFailure, DriftReport};
use crate::config::{ColumnConfig, MonitorConfig, TableConfig};
use crate::dataset::Dataset;
use crate::detectors::{Detector, DriftDetector};
use crate::error::{DriftError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::sources::TableLoader;
use crate::{log_column, log_data_op};

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Runs every configured detector over every configured table.
///
/// Each table is loaded, validated against its schema when one is
/// configured, and split once into a historical and a recent slice. Every
/// configured column is then handed to its detector. A failing table or
/// column is recorded in the report and the run moves on, unless
/// [`DriftMonitor::continue_on_error`] was turned off.
///
/// # Example
///
/// ```rust,ignore
/// use drift_guard::prelude::*;
///
/// # async fn example() -> drift_guard::Result<()> {
/// let config = MonitorConfig::from_file("drift.toml")?;
/// let monitor = DriftMonitor::new(config, FileLoader::new()).with_seed(42);
/// let report = monitor.run().await?;
/// println!("drift detected: {}", report.drift_detected());
/// # Ok(())
/// # }
/// ```
pub struct DriftMonitor {
    config: MonitorConfig,
    loader: Arc<dyn TableLoader>,
    /// Overrides the configured seed.
    seed: Option<u64>,
    continue_on_error: bool,
    log_config: LogConfig,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for DriftMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriftMonitor")
            .field("tables", &self.config.tables.len())
            .field("loader", &self.loader)
            .field("seed", &self.seed())
            .field("continue_on_error", &self.continue_on_error)
            .finish()
    }
}

impl DriftMonitor {
    pub fn new<L: TableLoader + 'static>(config: MonitorConfig, loader: L) -> Self {
        Self::with_shared_loader(config, Arc::new(loader))
    }

    /// Creates a monitor around a loader that is shared elsewhere.
    pub fn with_shared_loader(config: MonitorConfig, loader: Arc<dyn TableLoader>) -> Self {
        Self {
            config,
            loader,
            seed: None,
            continue_on_error: true,
            log_config: LogConfig::default(),
            on_progress: None,
        }
    }

    /// Seeds the split RNG, taking precedence over `[monitor].seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets whether to continue running after a table or column fails.
    ///
    /// When false, the first failure aborts the run and is returned as the
    /// error.
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Sets a callback receiving the completed share of tables, in `[0, 1]`.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The effective seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed.or(self.config.monitor.seed)
    }

    /// Executes the run.
    ///
    /// The split RNG is created once per call, so a seeded monitor returns
    /// identical reports on every call over the same data.
    #[instrument(skip(self), fields(
        tables = self.config.tables.len(),
        seed = ?self.seed(),
        continue_on_error = self.continue_on_error
    ))]
    pub async fn run(&self) -> Result<DriftReport> {
        info!("Starting drift monitoring run");

        let mut rng = match self.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut report = DriftReport::new();
        report.metadata_mut().seed = self.seed();
        report.metadata_mut().record_start();

        let total = self.config.tables.len();
        for (index, table) in self.config.tables.iter().enumerate() {
            let name = table.table_name();
            match self.prepare_table(table, &mut rng).await {
                Ok((historical, recent)) => {
                    for column in &table.columns {
                        match self.detect_column(name, column, historical.clone(), recent.clone())
                        {
                            Ok(drift) => report.record(name, &column.name, drift),
                            Err(e) => self.handle_failure(
                                &mut report,
                                DriftFailure::for_column(name, column, &e),
                                e,
                            )?,
                        }
                    }
                }
                Err(e) => {
                    self.handle_failure(&mut report, DriftFailure::for_table(name, &e), e)?
                }
            }

            if let Some(callback) = &self.on_progress {
                callback((index + 1) as f64 / total as f64);
            }
        }

        report.metadata_mut().record_end();
        self.emit_results(&report);
        Ok(report)
    }

    /// Loads, validates and splits one table.
    async fn prepare_table(
        &self,
        table: &TableConfig,
        rng: &mut StdRng,
    ) -> Result<(Arc<Dataset>, Arc<Dataset>)> {
        let name = table.table_name();
        log_data_op!(
            self.log_config,
            table = name,
            loader = %self.loader.description(),
            "Loading table"
        );
        let dataset = self.loader.load(table).await?;

        let dataset = match self.config.schema_for(table)? {
            Some(schema) => schema.validate(name, dataset)?,
            None => dataset,
        };

        let fraction = self.config.monitor.historical_fraction;
        let (historical, recent) = dataset.split(fraction, rng)?;
        log_data_op!(
            self.log_config,
            table = name,
            rows = dataset.num_rows(),
            historical_rows = historical.num_rows(),
            recent_rows = recent.num_rows(),
            "Split table"
        );
        Ok((Arc::new(historical), Arc::new(recent)))
    }

    fn detect_column(
        &self,
        table: &str,
        column: &ColumnConfig,
        historical: Arc<Dataset>,
        recent: Arc<Dataset>,
    ) -> Result<ColumnDrift> {
        let detector = Detector::from_config(column, historical, recent)?;
        let method = detector.method();
        let result = detector.detect_drift(&column.name)?;
        log_column!(
            self.log_config,
            table,
            column = %column.name,
            method = %method,
            drift_detected = result.drift_detected,
            statistic = result.statistic,
            "Detector finished"
        );

        let drift = ColumnDrift::from_result(method, result);
        if drift.degenerate {
            warn!(
                table,
                column = %column.name,
                method = %method,
                raw_statistic = %result.statistic,
                "Non-finite statistic reported as 0.0"
            );
        }
        Ok(drift)
    }

    fn handle_failure(
        &self,
        report: &mut DriftReport,
        failure: DriftFailure,
        err: DriftError,
    ) -> Result<()> {
        error!(
            table = %failure.table,
            column = ?failure.column,
            method = ?failure.method,
            error = %truncate_field(&failure.error, self.log_config.max_field_length),
            "Drift evaluation failed"
        );
        report.record_failure(failure);
        if self.continue_on_error {
            Ok(())
        } else {
            Err(err)
        }
    }

    fn emit_results(&self, report: &DriftReport) {
        for (table, column, drift) in report.entries() {
            info!(
                table,
                column,
                method = %drift.method,
                drift_detected = drift.drift_detected,
                statistic = drift.statistic,
                degenerate = drift.degenerate,
                "Drift status"
            );
        }

        let summary = report.summary();
        let duration_ms = report
            .metadata()
            .duration()
            .map(|d| d.num_milliseconds())
            .unwrap_or_default();
        info!(
            tables = summary.tables,
            columns = summary.columns,
            drifted = summary.drifted,
            degenerate = summary.degenerate,
            failures = summary.failures,
            duration_ms,
            "Drift monitoring completed"
        );
        if summary.failures > 0 {
            debug!(failures = summary.failures, "Some tables or columns were skipped");
        }
    }
}

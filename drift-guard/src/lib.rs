//! # drift-guard - Statistical drift monitoring for tabular data
//!
//! drift-guard compares a historical slice of a table with a recent slice and
//! decides, column by column, whether the distribution moved. Tables are
//! loaded through DataFusion into Arrow record batches, optionally validated
//! against a declared schema, split at random, and handed to one of seven
//! statistical detectors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drift_guard::prelude::*;
//!
//! # async fn example() -> drift_guard::Result<()> {
//! let config = MonitorConfig::from_toml_str(r#"
//!     [monitor]
//!     historical_fraction = 0.8
//!     seed = 42
//!
//!     [[tables]]
//!     source = "orders.csv"
//!     columns = [
//!         { name = "amount", method = "z_test" },
//!         { name = "basket_size", method = "psi_calculator", threshold = 0.2 },
//!         { name = "channel", method = "chi_squared_test" },
//!     ]
//! "#)?;
//!
//! let report = DriftMonitor::new(config, FileLoader::new()).run().await?;
//! for (table, column, drift) in report.entries() {
//!     println!("{table}.{column}: {} ({})", drift.drift_detected, drift.statistic);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Detection methods
//!
//! | Identifier | Column kind | Statistic |
//! |---|---|---|
//! | `chi_squared_test` | categorical | p-value |
//! | `cramers_v_test` | categorical | Cramér's V |
//! | `ks_test` | numeric | p-value |
//! | `psi_calculator` | numeric | PSI |
//! | `z_test` | numeric | p-value |
//! | `cusum` | numeric | crossing count |
//! | `kl_divergence` | numeric | KL divergence |
//!
//! Statistics that come out NaN or infinite (empty slices, zero variance,
//! empty histogram bins) are reported as `0.0` with a `degenerate` flag.
//!
//! ## Architecture
//!
//! - **`config`**: TOML configuration of tables, columns, schemas and logging
//! - **`sources`**: Table loaders (CSV, JSON, Parquet files; in-memory batches)
//! - **`schema`**: Declarative column schemas with type coercion and checks
//! - **`dataset`**: Arrow-backed table with seeded random splitting
//! - **`stats`**: Statistical primitives (distributions, tests, binning)
//! - **`detectors`**: The seven drift detectors and their dispatcher
//! - **`monitor`**: Orchestration and the drift report
//! - **`formatters`**: Human, JSON and Markdown report rendering
//! - **`logging`**: `tracing` helpers and subscriber setup

pub mod config;
pub mod dataset;
pub mod detectors;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod monitor;
pub mod prelude;
pub mod schema;
pub mod sources;
pub mod stats;

pub use error::{DriftError, Result};

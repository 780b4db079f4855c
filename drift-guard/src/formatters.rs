//! Rendering drift reports for people and machines.
//!
//! # Examples
//!
//! ```rust
//! use drift_guard::formatters::{HumanFormatter, ReportFormatter};
//! use drift_guard::monitor::DriftReport;
//!
//! let report = DriftReport::new();
//! let output = HumanFormatter::new().with_colors(false).format(&report).unwrap();
//! assert!(output.contains("No drift detected"));
//! ```

use std::fmt::Write;

use crate::error::{DriftError, Result};
use crate::monitor::DriftReport;

/// Options shared by the formatters.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the failures section
    pub include_failures: bool,
    /// Maximum number of failures to display (`None` for all)
    pub max_failures: Option<usize>,
    /// Whether to use colorized output (human formatter only)
    pub use_colors: bool,
    /// Whether to include run timestamps
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_failures: true,
            max_failures: None,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Configuration for CI logs: no colors, capped failure list.
    pub fn ci() -> Self {
        Self {
            include_failures: true,
            max_failures: Some(50),
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_failures(mut self, include: bool) -> Self {
        self.include_failures = include;
        self
    }

    pub fn with_max_failures(mut self, max: usize) -> Self {
        self.max_failures = Some(max);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

/// Turns a [`DriftReport`] into text.
pub trait ReportFormatter {
    fn format(&self, report: &DriftReport) -> Result<String>;
}

fn render_error(e: std::fmt::Error) -> DriftError {
    DriftError::Internal(format!("Failed to render report: {e}"))
}

/// Serializes the report as JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &DriftReport) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.map_err(|e| DriftError::Serialization(format!("Failed to serialize report: {e}")))
    }
}

/// Aligned console table of column statuses, followed by any failures.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.config.use_colors = use_colors;
        self
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.config.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn render(&self, report: &DriftReport, out: &mut String) -> std::fmt::Result {
        let summary = report.summary();

        writeln!(out)?;
        if summary.drifted > 0 {
            writeln!(out, "{}", self.paint("Drift detected", "31"))?;
        } else {
            writeln!(out, "{}", self.paint("No drift detected", "32"))?;
        }

        if self.config.include_timestamps {
            if let Some(start) = report.metadata().start_time {
                writeln!(out, "Started: {start}")?;
            }
            if let Some(duration) = report.metadata().duration() {
                writeln!(out, "Duration: {}ms", duration.num_milliseconds())?;
            }
        }
        if let Some(seed) = report.metadata().seed {
            writeln!(out, "Seed: {seed}")?;
        }
        writeln!(
            out,
            "Tables: {}  Columns: {}  Drifted: {}  Failures: {}",
            summary.tables, summary.columns, summary.drifted, summary.failures
        )?;

        if summary.columns > 0 {
            let headers = ["TABLE", "COLUMN", "METHOD", "DRIFT", "STATISTIC"];
            let rows: Vec<[String; 5]> = report
                .entries()
                .map(|(table, column, drift)| {
                    let statistic = if drift.degenerate {
                        format!("{:.6} (degenerate)", drift.statistic)
                    } else {
                        format!("{:.6}", drift.statistic)
                    };
                    [
                        table.to_string(),
                        column.to_string(),
                        drift.method.to_string(),
                        if drift.drift_detected { "yes" } else { "no" }.to_string(),
                        statistic,
                    ]
                })
                .collect();

            let mut widths = headers.map(str::len);
            for row in &rows {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }

            writeln!(out)?;
            let header: Vec<String> = headers
                .iter()
                .zip(widths)
                .map(|(h, w)| format!("{h:<w$}"))
                .collect();
            writeln!(out, "{}", header.join("  ").trim_end())?;
            for row in &rows {
                let mut line = String::new();
                for (i, (cell, width)) in row.iter().zip(widths).enumerate() {
                    if i > 0 {
                        line.push_str("  ");
                    }
                    let padded = format!("{cell:<width$}");
                    if i == 3 && cell == "yes" {
                        line.push_str(&self.paint(&padded, "31"));
                    } else {
                        line.push_str(&padded);
                    }
                }
                writeln!(out, "{}", line.trim_end())?;
            }
        }

        let failures = report.failures();
        if self.config.include_failures && !failures.is_empty() {
            let shown = self
                .config
                .max_failures
                .map_or(failures.len(), |max| max.min(failures.len()));

            writeln!(out)?;
            writeln!(out, "{}", self.paint("Failures:", "33"))?;
            for failure in &failures[..shown] {
                let target = match &failure.column {
                    Some(column) => format!("{}.{column}", failure.table),
                    None => failure.table.clone(),
                };
                match &failure.method {
                    Some(method) => writeln!(out, "  {target} [{method}]: {}", failure.error)?,
                    None => writeln!(out, "  {target}: {}", failure.error)?,
                }
            }
            if failures.len() > shown {
                writeln!(out, "  ... and {} more failures", failures.len() - shown)?;
            }
        }

        writeln!(out)
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &DriftReport) -> Result<String> {
        let mut output = String::new();
        self.render(report, &mut output).map_err(render_error)?;
        Ok(output)
    }
}

/// Markdown table suitable for pull request comments or docs.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self { heading_level: 2 }
    }

    /// Sets the heading level for the report title (1-6).
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(&self, report: &DriftReport, out: &mut String) -> std::fmt::Result {
        let hashes = "#".repeat(usize::from(self.heading_level));
        let summary = report.summary();
        let status = if summary.drifted > 0 {
            "DRIFT DETECTED"
        } else {
            "NO DRIFT"
        };
        writeln!(out, "{hashes} Drift Report - {status}")?;
        writeln!(out)?;
        writeln!(out, "| Table | Column | Method | Drift | Statistic |")?;
        writeln!(out, "|---|---|---|---|---|")?;
        for (table, column, drift) in report.entries() {
            writeln!(
                out,
                "| {table} | {column} | `{}` | {} | {:.6}{} |",
                drift.method,
                if drift.drift_detected { "yes" } else { "no" },
                drift.statistic,
                if drift.degenerate { " *" } else { "" }
            )?;
        }
        if summary.degenerate > 0 {
            writeln!(out)?;
            writeln!(out, "\\* statistic was not finite and is reported as 0.0")?;
        }

        if report.has_failures() {
            writeln!(out)?;
            writeln!(out, "{hashes}# Failures")?;
            writeln!(out)?;
            for failure in report.failures() {
                let column = failure.column.as_deref().unwrap_or("*");
                writeln!(out, "- **{}.{column}**: {}", failure.table, failure.error)?;
            }
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &DriftReport) -> Result<String> {
        let mut output = String::new();
        self.render(report, &mut output).map_err(render_error)?;
        Ok(output)
    }
}

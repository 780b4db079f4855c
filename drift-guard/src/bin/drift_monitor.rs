//! drift-monitor
//!
//! Runs the drift detectors described by a TOML configuration file and
//! prints the resulting report.
//!
//! Exit codes: `0` on success, `1` when the configuration cannot be used
//! (including unknown methods and missing columns recorded in the report) or
//! the run aborts, `2` when `--fail-on-drift` is set and drift was found.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use drift_guard::config::MonitorConfig;
use drift_guard::formatters::{HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter};
use drift_guard::logging::setup::init_logging;
use drift_guard::logging::LogConfig;
use drift_guard::monitor::{DriftMonitor, DriftReport};
use drift_guard::sources::FileLoader;
use drift_guard::DriftError;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the monitor configuration file
    #[arg(short, long, default_value = "drift.toml")]
    config: PathBuf,

    /// Seed for the historical/recent split, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Report format written to stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Exit with status 2 when any column drifted
    #[arg(long)]
    fail_on_drift: bool,

    /// Abort on the first failing table or column
    #[arg(long)]
    fail_fast: bool,

    /// Log every detector dispatch
    #[arg(short, long)]
    verbose: bool,

    /// Disable colors in the human report
    #[arg(long)]
    no_color: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_DRIFT: u8 = 2;

/// Exit status for a completed run.
fn exit_status(report: &DriftReport, fail_on_drift: bool) -> u8 {
    if report.has_configuration_failures() {
        EXIT_FAILURE
    } else if fail_on_drift && report.drift_detected() {
        EXIT_DRIFT
    } else {
        EXIT_SUCCESS
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args).await {
        Ok(report) => {
            if report.has_configuration_failures() {
                error!(
                    failures = report.failures().len(),
                    "configuration errors recorded in the report"
                );
            }
            ExitCode::from(exit_status(&report, args.fail_on_drift))
        }
        Err(e) => {
            error!(error = %e, "drift-monitor failed");
            eprintln!("drift-monitor: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<DriftReport, DriftError> {
    let config = MonitorConfig::from_file(&args.config)?;

    if let Err(e) = init_logging(config.logging.to_logging_config()?) {
        eprintln!("drift-monitor: logging disabled: {e}");
    }

    let base_dir = args
        .config
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    info!(
        config = %args.config.display(),
        tables = config.tables.len(),
        "Loaded configuration"
    );

    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let mut monitor = DriftMonitor::new(config, FileLoader::new().with_base_dir(base_dir))
        .continue_on_error(!args.fail_fast)
        .with_log_config(log_config);
    if let Some(seed) = args.seed {
        monitor = monitor.with_seed(seed);
    }

    let report = monitor.run().await?;

    let output = match args.format {
        OutputFormat::Human => HumanFormatter::new()
            .with_colors(!args.no_color)
            .format(&report)?,
        OutputFormat::Json => JsonFormatter::new().format(&report)?,
        OutputFormat::Markdown => MarkdownFormatter::new().format(&report)?,
    };
    println!("{output}");
    Ok(report)
}

//! XWFC Application Library
//!
//! This crate contains the configuration, setup, execution and reporting
//! logic of the XWFC grid demo.

pub mod benchmark;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;
pub mod visualization;

use clap::Parser;
use std::ffi::OsString;

pub use config::{AppConfig, Settings};
pub use error::AppError;

/// Parses the process arguments and runs the selected mode.
pub fn run() -> anyhow::Result<()> {
    run_with_args(std::env::args_os())
}

/// Runs the demo with explicit arguments (the first one is the program name).
pub fn run_with_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = AppConfig::parse_from(args);
    let settings = config.resolve()?;
    logging::init_logger(settings.global_log_level, settings.progress_log_level);

    log::info!("XWFC App Starting");
    log::debug!("Resolved settings: {:?}", settings);

    if settings.benchmark_mode {
        setup::execution::run_benchmark_mode(&settings)?;
    } else {
        if settings.benchmark_csv_output.is_some() {
            log::warn!("--benchmark-csv-output is ignored without --benchmark-mode");
        }
        setup::execution::run_standard_mode(&settings)?;
    }

    log::info!("XWFC App Finished.");
    Ok(())
}

//! Logging setup for the application.

use crate::config::{GlobalLogLevel, ProgressLogLevel};
use env_logger::{Builder, Env};
use log::LevelFilter;

impl From<GlobalLogLevel> for LevelFilter {
    fn from(level: GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

impl From<ProgressLogLevel> for LevelFilter {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

/// Initializes the logger.
///
/// `global` applies to every module and `progress` to the progress reports;
/// directives in `RUST_LOG` are parsed afterwards and refine both per module
/// (e.g. `RUST_LOG=xwfc_core::propagator=trace`).
/// Calling this twice keeps the first logger.
pub fn init_logger(global: GlobalLogLevel, progress: ProgressLogLevel) {
    let mut builder = Builder::new();
    builder.filter_level(global.into());
    builder.filter_module("xwfc_app::progress", progress.into());
    builder.parse_env(Env::default());

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping it");
        return;
    }
    log::debug!(
        "Logger initialized with global log level: {global:?}, progress log level: {progress:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LevelFilter::from(GlobalLogLevel::Trace), LevelFilter::Trace);
        assert_eq!(LevelFilter::from(GlobalLogLevel::Warn), LevelFilter::Warn);
        assert_eq!(LevelFilter::from(GlobalLogLevel::default()), LevelFilter::Info);
        assert_eq!(LevelFilter::from(ProgressLogLevel::Debug), LevelFilter::Debug);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logger(GlobalLogLevel::Warn, ProgressLogLevel::Info);
        init_logger(GlobalLogLevel::Debug, ProgressLogLevel::Trace);
    }
}

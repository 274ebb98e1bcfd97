use thiserror::Error;
use xwfc_core::{StateError, WfcError};
use xwfc_rules::LoadError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Settings Error: {0}")]
    Settings(#[from] figment::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule Loading Error: {0}")]
    Rules(#[from] LoadError),

    #[error("XWFC Core Error: {0}")]
    WfcCore(#[from] WfcError),

    #[error("State Error: {0}")]
    State(#[from] StateError),

    #[error("Cell ({x}, {y}) is not resolved ({candidates} candidates), cannot save")]
    Unresolved { x: usize, y: usize, candidates: usize },

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Eager and stepped solver disagree on seeds {0:?}")]
    BenchmarkMismatch(Vec<u64>),

    #[error("Snapshot Error: {0}")]
    Snapshot(String),
}

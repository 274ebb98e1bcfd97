//! Concrete entanglement rules for XWFC and loading them from rule files.

use thiserror::Error;

pub mod cached;
pub mod connection_state;
pub mod formats;
pub mod generator;
pub mod loader;
pub mod ruleset;
pub mod types;

pub use cached::CachedRules;
pub use connection_state::ConnectionStateRules;
pub use ruleset::{LoadedRules, RuleSet};
pub use types::{AdjacencyRules, Module, ModuleSet, RuleSetError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules format (e.g., RON/JSON): {0}")]
    ParseError(String),
    #[error("Invalid rule data: {0}")]
    InvalidData(String),
    #[error("Unsupported rule file format: {0}")]
    UnsupportedFormat(String),
    #[error("Required feature not enabled: {0}")]
    FeatureNotEnabled(String),
}

impl From<RuleSetError> for LoadError {
    fn from(error: RuleSetError) -> Self {
        Self::InvalidData(format!("Rule set error: {error}"))
    }
}

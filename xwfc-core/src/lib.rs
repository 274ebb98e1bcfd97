//! Core library for Exclusive Wave Function Collapse (XWFC).
//! Defines the state representation, the rule and topology interfaces, and the solver.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Entropy-based selection of the next variable to observe.
pub mod entropy;
/// 2D grid topology with attributes.
pub mod grid;
/// Constraint propagation over the connection graph.
pub mod propagator;
/// Compatibility rules between pure states.
pub mod rules;
/// The XWFC solver.
pub mod runner;
/// Pure and superposed states.
pub mod state;
/// The wave function system: one superposed state per topology vertex.
pub mod system;
/// Graph interface the system is built over.
pub mod topology;

pub use crate::entropy::SelectionStrategy;
pub use crate::grid::{BoundaryMode, GridTopology};
pub use crate::propagator::PropagationError;
pub use crate::rules::{ConnectionType, EntanglementRules};
pub use crate::runner::{
    CollapseConfig, CollapseConfigBuilder, CollapseStats, CollapseSteps, ProgressCallback, Step,
    WaveFunctionCollapse,
};
pub use crate::state::{PureState, StateError, SuperposedState, MAX_LOCAL_DIMENSION};
pub use crate::system::{WaveFunctionSystem, WaveVariable};
pub use crate::topology::{IncidentEdge, Topology};

/// Errors that can occur while building or collapsing a wave function system.
#[derive(Error, Debug)]
pub enum WfcError {
    /// A vertex names an exclusion class the rules cannot represent.
    #[error("Invalid exclusion class for variable {variable}: {source}")]
    InvalidExclusionClass {
        variable: system::WaveVariable,
        #[source]
        source: StateError,
    },
    /// A vertex carries a negative exclusion class attribute.
    #[error("Variable {variable} has negative exclusion class {class}")]
    NegativeExclusionClass {
        variable: system::WaveVariable,
        class: i64,
    },
    /// A variable handle outside the system.
    #[error("Unknown wave variable {0}")]
    UnknownVariable(system::WaveVariable),
    /// Invalid state construction.
    #[error("State error: {0}")]
    State(#[from] StateError),
    /// A contradiction remained with no decision left to undo.
    #[error("No solution: search exhausted after {observations} observations and {backtracks} backtracks")]
    Exhausted { observations: u64, backtracks: u64 },
    /// The configured maximum number of observations was reached.
    #[error("Maximum number of observations ({0}) reached")]
    StepLimitReached(u64),
    /// The progress callback requested to stop.
    #[error("Collapse aborted: {0}")]
    Aborted(String),
    /// A snapshot does not fit the system it is restored into.
    #[error("Snapshot holds {found} variables, system has {expected}")]
    SnapshotMismatch { expected: usize, found: usize },
    /// Error related to loading or saving a checkpoint.
    #[error("Checkpoint error: {0}")]
    CheckpointError(String),
    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Information about the current state of a collapse, passed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// Observations performed so far in this run.
    pub observations: u64,
    /// Variables currently holding exactly one pure state.
    pub resolved_variables: usize,
    pub total_variables: usize,
    pub backtracks: u64,
    pub restarts: u64,
    /// Time elapsed since the run started.
    pub elapsed_time: Duration,
}

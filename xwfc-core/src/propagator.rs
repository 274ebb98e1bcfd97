//! Depth-first constraint propagation over an explicit frontier stack.

use crate::rules::{ConnectionType, EntanglementRules};
use crate::system::{WaveFunctionSystem, WaveVariable};
use crate::topology::Topology;
use log::trace;
use thiserror::Error;

/// Errors that can occur during the constraint propagation phase.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PropagationError {
    /// A variable's possibility set became empty.
    #[error("Contradiction detected during propagation at variable {0}")]
    Contradiction(WaveVariable),
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    variable: WaveVariable,
    next_connection: usize,
}

/// Pending propagation work: one frame per variable whose change has not yet
/// been pushed through all of its outgoing connections.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    frames: Vec<Frame>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules propagation out of `variable`. The most recent push runs first.
    pub fn push(&mut self, variable: WaveVariable) {
        self.frames.push(Frame {
            variable,
            next_connection: 0,
        });
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

/// Outcome of relaxing a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationStep {
    /// Nothing left to propagate.
    Idle,
    /// The destination already satisfied the constraint.
    Unchanged {
        source: WaveVariable,
        destination: WaveVariable,
        connection_type: ConnectionType,
    },
    /// The destination lost some states and was scheduled for propagation.
    Narrowed {
        source: WaveVariable,
        destination: WaveVariable,
        connection_type: ConnectionType,
    },
    /// The destination lost all of its states; the frontier was discarded.
    Contradiction {
        source: WaveVariable,
        destination: WaveVariable,
        connection_type: ConnectionType,
    },
}

/// Relaxes the next pending connection of the frontier.
///
/// Frames whose connections are all processed are popped without counting
/// as a step. On contradiction the emptied state stays written and the whole
/// frontier is dropped; restoring a consistent state is the caller's job.
pub fn propagate_step<T: Topology, R: EntanglementRules>(
    system: &mut WaveFunctionSystem<T, R>,
    frontier: &mut Frontier,
) -> PropagationStep {
    loop {
        let Some(frame) = frontier.frames.last_mut() else {
            return PropagationStep::Idle;
        };
        let source = frame.variable;
        let Some(&connection) = system
            .outgoing_connections(source)
            .get(frame.next_connection)
        else {
            frontier.frames.pop();
            continue;
        };
        frame.next_connection += 1;

        let destination = connection.destination;
        let connection_type = connection.connection_type;
        let allowed = system.rules().allowed_states(
            system.state(source),
            connection_type,
            system.state(destination),
        );
        let narrowed = system.state(destination).mask_by(&allowed);
        if narrowed == *system.state(destination) {
            return PropagationStep::Unchanged {
                source,
                destination,
                connection_type,
            };
        }

        trace!(
            "Narrowed {} via {} (type {}): {} -> {}",
            destination,
            source,
            connection_type,
            system.state(destination),
            narrowed
        );
        let emptied = narrowed.is_empty();
        *system.state_mut(destination) = narrowed;
        if emptied {
            frontier.clear();
            return PropagationStep::Contradiction {
                source,
                destination,
                connection_type,
            };
        }
        frontier.push(destination);
        return PropagationStep::Narrowed {
            source,
            destination,
            connection_type,
        };
    }
}

/// Propagates the current state of `origin` until a local fixed point.
///
/// Single-origin entry point for callers that edit waves by hand through
/// `set_wave`. The solver drives [`propagate_step`] itself so it can pause
/// between edges.
///
/// # Errors
///
/// Returns `PropagationError::Contradiction` naming the first variable that
/// was emptied. Changes made before the contradiction are not rolled back.
pub fn propagate<T: Topology, R: EntanglementRules>(
    system: &mut WaveFunctionSystem<T, R>,
    origin: WaveVariable,
) -> Result<(), PropagationError> {
    let mut frontier = Frontier::new();
    frontier.push(origin);
    loop {
        match propagate_step(system, &mut frontier) {
            PropagationStep::Idle => return Ok(()),
            PropagationStep::Contradiction { destination, .. } => {
                return Err(PropagationError::Contradiction(destination))
            }
            PropagationStep::Unchanged { .. } | PropagationStep::Narrowed { .. } => {}
        }
    }
}

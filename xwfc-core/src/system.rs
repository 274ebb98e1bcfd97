use crate::rules::{ConnectionType, EntanglementRules};
use crate::state::{PureState, SuperposedState};
use crate::topology::Topology;
use crate::WfcError;
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Boundary attribute value meaning "not forced".
pub const UNCONSTRAINED_BOUNDARY: i64 = -1;

/// Handle of one topology vertex as a slot of the state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveVariable(pub usize);

impl fmt::Display for WaveVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed, typed edge leaving a wave variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub destination: WaveVariable,
    /// Already oriented for traversal away from the source variable.
    pub connection_type: ConnectionType,
}

/// An edge whose two resolved endpoints are not allowed next to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub source: WaveVariable,
    pub destination: WaveVariable,
    pub connection_type: ConnectionType,
}

/// Owns the state vector over the vertices of a topology.
#[derive(Debug)]
pub struct WaveFunctionSystem<T: Topology, R: EntanglementRules> {
    topology: T,
    rules: R,
    global_dimension: usize,
    exclusion_class_attribute: Option<String>,
    boundary_attribute: Option<String>,
    vertices: Vec<T::Vertex>,
    ids: HashMap<T::Vertex, WaveVariable>,
    connections: Vec<Vec<Connection>>,
    waves: Vec<SuperposedState>,
}

impl<T: Topology, R: EntanglementRules> WaveFunctionSystem<T, R> {
    /// Creates the system and initializes every variable through [`Self::reset`].
    ///
    /// # Arguments
    ///
    /// * `topology` - Graph supplying vertices, attributes and typed edges.
    /// * `rules` - Compatibility rules over the pure states.
    /// * `global_dimension` - Stride between exclusion classes (max class size).
    /// * `exclusion_class_attribute` - Vertex attribute holding the exclusion class (default 0).
    /// * `boundary_attribute` - Vertex attribute holding a forced pure state
    ///   ([`UNCONSTRAINED_BOUNDARY`] or absent for none).
    ///
    /// # Errors
    ///
    /// Returns a `WfcError` if some vertex uses an exclusion class whose
    /// dimension is zero, wider than the state width, or larger than
    /// `global_dimension`.
    pub fn new(
        topology: T,
        rules: R,
        global_dimension: usize,
        exclusion_class_attribute: Option<&str>,
        boundary_attribute: Option<&str>,
    ) -> Result<Self, WfcError> {
        let vertices = topology.vertices();
        let ids: HashMap<T::Vertex, WaveVariable> = vertices
            .iter()
            .enumerate()
            .map(|(index, &vertex)| (vertex, WaveVariable(index)))
            .collect();
        if ids.len() != vertices.len() {
            warn!(
                "Topology reported {} vertices but only {} are distinct",
                vertices.len(),
                ids.len()
            );
        }

        let connection_types = rules.connection_type_count();
        let mut connections = Vec::with_capacity(vertices.len());
        for &vertex in &vertices {
            let mut outgoing = Vec::new();
            for edge in topology.incident_edges(vertex) {
                let Some(&destination) = ids.get(&edge.other) else {
                    warn!(
                        "Skipping dangling edge from {:?} to unknown vertex {:?}",
                        vertex, edge.other
                    );
                    continue;
                };
                if edge.connection_type >= connection_types {
                    warn!(
                        "Skipping edge from {:?} with connection type {} (rules define {})",
                        vertex, edge.connection_type, connection_types
                    );
                    continue;
                }
                let connection_type = if edge.outgoing {
                    edge.connection_type
                } else {
                    rules.dual_connection(edge.connection_type)
                };
                outgoing.push(Connection {
                    destination,
                    connection_type,
                });
            }
            connections.push(outgoing);
        }

        let mut system = Self {
            topology,
            rules,
            global_dimension,
            exclusion_class_attribute: exclusion_class_attribute.map(str::to_owned),
            boundary_attribute: boundary_attribute.map(str::to_owned),
            vertices,
            ids,
            connections,
            waves: Vec::new(),
        };
        system.reset()?;
        debug!(
            "Wave function system ready: {} variables, global dimension {}",
            system.variable_count(),
            global_dimension
        );
        Ok(system)
    }

    /// Restores every variable to its initial distribution.
    ///
    /// Boundary-forced variables hold exactly their forced pure state (or
    /// nothing, if it lies outside their class); all others are equiprobable
    /// within their exclusion class.
    ///
    /// # Errors
    ///
    /// Fails on negative exclusion classes or invalid class dimensions.
    pub fn reset(&mut self) -> Result<(), WfcError> {
        let mut waves = Vec::with_capacity(self.vertices.len());
        for (index, &vertex) in self.vertices.iter().enumerate() {
            let variable = WaveVariable(index);
            let class = self.exclusion_class_of(variable, vertex)?;
            let local = self.rules.dimension_in_exclusion_class(class);
            let state = match self.boundary_of(vertex) {
                Some(forced) => {
                    let mut state = SuperposedState::none(self.global_dimension, local, class)
                        .map_err(|source| WfcError::InvalidExclusionClass { variable, source })?;
                    state.add(forced);
                    state
                }
                None => SuperposedState::equiprobable_in_class(self.global_dimension, local, class)
                    .map_err(|source| WfcError::InvalidExclusionClass { variable, source })?,
            };
            waves.push(state);
        }
        self.waves = waves;
        Ok(())
    }

    fn exclusion_class_of(
        &self,
        variable: WaveVariable,
        vertex: T::Vertex,
    ) -> Result<usize, WfcError> {
        let Some(name) = self.exclusion_class_attribute.as_deref() else {
            return Ok(0);
        };
        match self.topology.int_attribute(vertex, name) {
            None => Ok(0),
            Some(class) => {
                usize::try_from(class).map_err(|_| WfcError::NegativeExclusionClass { variable, class })
            }
        }
    }

    fn boundary_of(&self, vertex: T::Vertex) -> Option<PureState> {
        let name = self.boundary_attribute.as_deref()?;
        let value = self.topology.int_attribute(vertex, name)?;
        if value < UNCONSTRAINED_BOUNDARY {
            warn!(
                "Treating boundary value {} of {:?} as unconstrained",
                value, vertex
            );
        }
        usize::try_from(value).ok().map(PureState)
    }

    /// Current belief of `variable`.
    pub fn wave(&self, variable: WaveVariable) -> Option<&SuperposedState> {
        self.waves.get(variable.0)
    }

    /// Overwrites the belief of `variable`.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::UnknownVariable` if `variable` is out of bounds.
    pub fn set_wave(
        &mut self,
        variable: WaveVariable,
        state: SuperposedState,
    ) -> Result<(), WfcError> {
        let slot = self
            .waves
            .get_mut(variable.0)
            .ok_or(WfcError::UnknownVariable(variable))?;
        *slot = state;
        Ok(())
    }

    pub(crate) fn state(&self, variable: WaveVariable) -> &SuperposedState {
        &self.waves[variable.0]
    }

    pub(crate) fn state_mut(&mut self, variable: WaveVariable) -> &mut SuperposedState {
        &mut self.waves[variable.0]
    }

    pub(crate) fn states(&self) -> &[SuperposedState] {
        &self.waves
    }

    /// Outgoing connections of `variable`, empty for unknown variables.
    pub fn outgoing_connections(&self, variable: WaveVariable) -> &[Connection] {
        self.connections
            .get(variable.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All wave variables in topology order.
    pub fn variables(&self) -> impl Iterator<Item = WaveVariable> + '_ {
        (0..self.waves.len()).map(WaveVariable)
    }

    pub fn variable_count(&self) -> usize {
        self.waves.len()
    }

    /// The topology vertex behind `variable`.
    pub fn vertex(&self, variable: WaveVariable) -> Option<T::Vertex> {
        self.vertices.get(variable.0).copied()
    }

    /// The wave variable assigned to `vertex`.
    pub fn variable_of(&self, vertex: T::Vertex) -> Option<WaveVariable> {
        self.ids.get(&vertex).copied()
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn global_dimension(&self) -> usize {
        self.global_dimension
    }

    /// Copy of the whole state vector.
    pub fn snapshot(&self) -> Vec<SuperposedState> {
        self.waves.clone()
    }

    /// Replaces the whole state vector with a previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::SnapshotMismatch` if the snapshot has a different length.
    pub fn restore(&mut self, snapshot: Vec<SuperposedState>) -> Result<(), WfcError> {
        if snapshot.len() != self.waves.len() {
            return Err(WfcError::SnapshotMismatch {
                expected: self.waves.len(),
                found: snapshot.len(),
            });
        }
        self.waves = snapshot;
        Ok(())
    }

    /// Number of variables resolved to exactly one pure state.
    pub fn resolved_count(&self) -> usize {
        self.waves.iter().filter(|wave| wave.is_resolved()).count()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.waves.iter().all(SuperposedState::is_resolved)
    }

    /// The resolved pure state per variable, `None` where still ambiguous or empty.
    pub fn resolved_assignment(&self) -> Vec<Option<PureState>> {
        self.waves
            .iter()
            .map(SuperposedState::resolved_state)
            .collect()
    }

    /// Every connection whose resolved endpoints the rules reject.
    pub fn violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for source in self.variables() {
            let Some(x) = self.state(source).resolved_state() else {
                continue;
            };
            for connection in self.outgoing_connections(source) {
                let Some(y) = self.state(connection.destination).resolved_state() else {
                    continue;
                };
                if !self.rules.allows(x, connection.connection_type, y) {
                    violations.push(Violation {
                        source,
                        destination: connection.destination,
                        connection_type: connection.connection_type,
                    });
                }
            }
        }
        violations
    }

    /// Writes the state vector as JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if writing fails.
    #[cfg(feature = "serde")]
    pub fn write_snapshot<W: std::io::Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, &self.waves)
    }

    /// Reads a state vector written by [`Self::write_snapshot`] and restores it.
    ///
    /// # Errors
    ///
    /// Fails if the JSON is malformed or the snapshot does not match this system.
    #[cfg(feature = "serde")]
    pub fn read_snapshot<Rd: std::io::Read>(&mut self, reader: Rd) -> Result<(), WfcError> {
        let snapshot: Vec<SuperposedState> = serde_json::from_reader(reader)
            .map_err(|e| WfcError::CheckpointError(e.to_string()))?;
        self.restore(snapshot)
    }
}

//! Rules derived from per-module connection-state vectors.

use crate::types::{ModuleSet, RuleSetError};
use log::debug;
use nalgebra::DVector;
use std::collections::HashMap;
use xwfc_core::{ConnectionType, EntanglementRules, PureState};

/// Compatibility through shared connection states.
///
/// Every module declares one vector per connection type. Across a connection
/// of type `t`, modules `x` and `y` fit iff `state(x, t) == state(y, dual(t))`.
/// Being an equality on the two sides of one edge, the relation is
/// symmetric under the dual map by construction.
#[derive(Debug, Clone)]
pub struct ConnectionStateRules {
    states: HashMap<PureState, Vec<DVector<i32>>>,
    dimension: usize,
    duals: Vec<ConnectionType>,
    class_dimensions: Vec<usize>,
}

impl ConnectionStateRules {
    /// Creates the rules from one vector per connection type for every module.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError::InvalidConnectionState` if a module is missing,
    /// declares the wrong number of vectors, or uses a different vector
    /// dimension than the others.
    pub fn new(
        modules: &ModuleSet,
        states: HashMap<PureState, Vec<DVector<i32>>>,
    ) -> Result<Self, RuleSetError> {
        let mut dimension = None;
        for module in modules.modules() {
            let invalid = |reason: String| RuleSetError::InvalidConnectionState {
                module: module.name.clone(),
                reason,
            };
            let vectors = states
                .get(&module.state)
                .ok_or_else(|| invalid("no connection states declared".to_owned()))?;
            if vectors.len() != modules.connection_type_count() {
                return Err(invalid(format!(
                    "expected {} connection types, found {}",
                    modules.connection_type_count(),
                    vectors.len()
                )));
            }
            for vector in vectors {
                match dimension {
                    None => dimension = Some(vector.len()),
                    Some(expected) if expected != vector.len() => {
                        return Err(invalid(format!(
                            "vector dimension {} differs from {}",
                            vector.len(),
                            expected
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
        let dimension = dimension.unwrap_or(0);
        debug!(
            "Connection-state rules: {} modules, vector dimension {}",
            states.len(),
            dimension
        );
        Ok(Self {
            states,
            dimension,
            duals: modules.duals().to_vec(),
            class_dimensions: modules.class_dimensions().to_vec(),
        })
    }

    /// Common dimension of every connection-state vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Vector `module` exposes on its `connection_type` side.
    pub fn connection_state(
        &self,
        module: PureState,
        connection_type: ConnectionType,
    ) -> Option<&DVector<i32>> {
        self.states.get(&module)?.get(connection_type)
    }
}

impl EntanglementRules for ConnectionStateRules {
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool {
        let dual = self.dual_connection(connection_type);
        match (
            self.connection_state(x, connection_type),
            self.connection_state(y, dual),
        ) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        self.duals
            .get(connection_type)
            .copied()
            .unwrap_or(connection_type)
    }

    fn dimension_in_exclusion_class(&self, exclusion_class: usize) -> usize {
        self.class_dimensions
            .get(exclusion_class)
            .copied()
            .unwrap_or(0)
    }

    fn connection_type_count(&self) -> usize {
        self.duals.len()
    }

    fn exclusion_class_count(&self) -> usize {
        self.class_dimensions.len()
    }
}

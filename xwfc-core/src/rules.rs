use crate::state::{PureState, SuperposedState};
use std::fmt::Debug;

/// Directional label of a relation between two wave variables.
pub type ConnectionType = usize;

/// Pairwise compatibility between pure states across a typed connection.
///
/// Implementations must be symmetric under [`EntanglementRules::dual_connection`]:
/// `allows(x, t, y) == allows(y, dual_connection(t), x)`.
pub trait EntanglementRules: Debug {
    /// Whether `y` may sit at the far end of a `connection_type` edge leaving `x`.
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool;

    /// The subset of `y_template`'s exclusion class compatible with at least
    /// one component of `x` across `connection_type`.
    ///
    /// Overrides may cache or batch the computation but must return exactly
    /// what [`naive_allowed_states`] returns.
    fn allowed_states(
        &self,
        x: &SuperposedState,
        connection_type: ConnectionType,
        y_template: &SuperposedState,
    ) -> SuperposedState {
        naive_allowed_states(self, x, connection_type, y_template)
    }

    /// The label of the same edge seen from its other endpoint. Must be an involution.
    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType;

    /// Number of valid pure states in `exclusion_class`.
    fn dimension_in_exclusion_class(&self, exclusion_class: usize) -> usize;

    /// Size of the connection type alphabet.
    fn connection_type_count(&self) -> usize;

    /// Number of exclusion classes the rules define states for.
    fn exclusion_class_count(&self) -> usize;
}

/// Derives `allowed_states` from `allows` by brute force over
/// `x.components() × y_template`'s class.
pub fn naive_allowed_states<R: EntanglementRules + ?Sized>(
    rules: &R,
    x: &SuperposedState,
    connection_type: ConnectionType,
    y_template: &SuperposedState,
) -> SuperposedState {
    let mut allowed = y_template.empty_like();
    let base = y_template.class_offset();
    let candidates: Vec<PureState> = (0..y_template.local_dimension())
        .map(|offset| PureState(base + offset))
        .collect();
    for source in x.components() {
        for &candidate in &candidates {
            if !allowed.project(candidate) && rules.allows(source, connection_type, candidate) {
                allowed.add(candidate);
            }
        }
    }
    allowed
}

impl<R: EntanglementRules + ?Sized> EntanglementRules for Box<R> {
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool {
        (**self).allows(x, connection_type, y)
    }

    fn allowed_states(
        &self,
        x: &SuperposedState,
        connection_type: ConnectionType,
        y_template: &SuperposedState,
    ) -> SuperposedState {
        (**self).allowed_states(x, connection_type, y_template)
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        (**self).dual_connection(connection_type)
    }

    fn dimension_in_exclusion_class(&self, exclusion_class: usize) -> usize {
        (**self).dimension_in_exclusion_class(exclusion_class)
    }

    fn connection_type_count(&self) -> usize {
        (**self).connection_type_count()
    }

    fn exclusion_class_count(&self) -> usize {
        (**self).exclusion_class_count()
    }
}

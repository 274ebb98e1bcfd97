use crate::types::{ModuleSet, RuleSetError};
use log::debug;
use xwfc_core::{ConnectionType, PureState};

/// Generates the full adjacency matrix from a list of allowed tuples.
///
/// Each tuple `(x, y, t)` allows `y` at the far end of a `t` connection
/// leaving `x`. The same physical edge seen from `y` has type `dual(t)`, so
/// the mirrored entry `(y, x, dual(t))` is set as well.
///
/// # Arguments
/// * `base_rules`: Allowed `(x, y, connection type)` tuples over absolute pure states.
/// * `modules`: Registry supplying the state space and the dual map.
///
/// # Returns
/// The flattened matrix, indexed `t * n * n + x * n + y` with
/// `n = modules.state_space()`.
///
/// # Errors
/// Returns a `RuleSetError` if a tuple names a state without a module or a
/// connection type outside the alphabet.
pub fn generate_symmetric_rules(
    base_rules: &[(PureState, PureState, ConnectionType)],
    modules: &ModuleSet,
) -> Result<Vec<bool>, RuleSetError> {
    let num_states = modules.state_space();
    let num_types = modules.connection_type_count();
    let mut allowed = vec![false; num_types * num_states * num_states];
    debug!(
        "Generating symmetric rules: modules={}, states={}, connection_types={}, matrix_size={}",
        modules.len(),
        num_states,
        num_types,
        allowed.len()
    );

    for &(x, y, connection_type) in base_rules {
        for state in [x, y] {
            if modules.module(state).is_none() {
                return Err(RuleSetError::UnknownState(state));
            }
        }
        if connection_type >= num_types {
            return Err(RuleSetError::UnknownConnectionType(connection_type));
        }
        let dual = modules.dual(connection_type);
        allowed[connection_type * num_states * num_states + x.0 * num_states + y.0] = true;
        allowed[dual * num_states * num_states + y.0 * num_states + x.0] = true;
    }
    debug!(
        "Generated rule vector with {} true entries.",
        allowed.iter().filter(|&&x| x).count()
    );
    Ok(allowed)
}

use crate::connection_state::ConnectionStateRules;
use crate::types::{AdjacencyRules, ModuleSet};
use xwfc_core::{ConnectionType, EntanglementRules, PureState, SuperposedState};

/// Any of the rule strategies a rule file can describe.
#[derive(Debug, Clone)]
pub enum RuleSet {
    Adjacency(AdjacencyRules),
    ConnectionState(ConnectionStateRules),
}

impl RuleSet {
    /// Short label of the strategy, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Adjacency(_) => "adjacency",
            Self::ConnectionState(_) => "connection-state",
        }
    }
}

impl EntanglementRules for RuleSet {
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool {
        match self {
            Self::Adjacency(rules) => rules.allows(x, connection_type, y),
            Self::ConnectionState(rules) => rules.allows(x, connection_type, y),
        }
    }

    fn allowed_states(
        &self,
        x: &SuperposedState,
        connection_type: ConnectionType,
        y_template: &SuperposedState,
    ) -> SuperposedState {
        match self {
            Self::Adjacency(rules) => rules.allowed_states(x, connection_type, y_template),
            Self::ConnectionState(rules) => rules.allowed_states(x, connection_type, y_template),
        }
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        match self {
            Self::Adjacency(rules) => rules.dual_connection(connection_type),
            Self::ConnectionState(rules) => rules.dual_connection(connection_type),
        }
    }

    fn dimension_in_exclusion_class(&self, exclusion_class: usize) -> usize {
        match self {
            Self::Adjacency(rules) => rules.dimension_in_exclusion_class(exclusion_class),
            Self::ConnectionState(rules) => rules.dimension_in_exclusion_class(exclusion_class),
        }
    }

    fn connection_type_count(&self) -> usize {
        match self {
            Self::Adjacency(rules) => rules.connection_type_count(),
            Self::ConnectionState(rules) => rules.connection_type_count(),
        }
    }

    fn exclusion_class_count(&self) -> usize {
        match self {
            Self::Adjacency(rules) => rules.exclusion_class_count(),
            Self::ConnectionState(rules) => rules.exclusion_class_count(),
        }
    }
}

/// Output of a rule-file parser: the registry plus the rules built over it.
#[derive(Debug, Clone)]
pub struct LoadedRules {
    pub modules: ModuleSet,
    pub rules: RuleSet,
}

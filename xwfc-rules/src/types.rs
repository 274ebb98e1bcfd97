use crate::generator::generate_symmetric_rules;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;
use xwfc_core::{ConnectionType, EntanglementRules, PureState, MAX_LOCAL_DIMENSION};

/// Errors that can occur while assembling a module registry or a rule table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleSetError {
    /// No modules were declared.
    #[error("Module set cannot be empty.")]
    NoModules,
    /// No connection types were declared.
    #[error("At least one connection type is required.")]
    NoConnectionTypes,
    /// Two modules share a name.
    #[error("Duplicate module name: {0}")]
    DuplicateModule(String),
    /// An exclusion class holds more modules than a state can represent.
    #[error("Exclusion class {class} has {count} modules (max {max})", max = MAX_LOCAL_DIMENSION)]
    ClassTooLarge { class: usize, count: usize },
    /// The dual map is not an involution over the connection types.
    #[error("Connection type {0} has no valid dual")]
    InvalidDual(ConnectionType),
    /// A rule refers to a pure state the registry does not define.
    #[error("Unknown pure state: {0}")]
    UnknownState(PureState),
    /// A rule refers to a connection type outside the alphabet.
    #[error("Unknown connection type: {0}")]
    UnknownConnectionType(ConnectionType),
    /// Connection-state vectors disagree in dimension or coverage.
    #[error("Invalid connection state for module {module}: {reason}")]
    InvalidConnectionState { module: String, reason: String },
}

/// One registered module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub exclusion_class: usize,
    /// Absolute pure state: `class * global_dimension + position in class`.
    pub state: PureState,
}

/// Registry of modules, their exclusion classes and the connection-type alphabet.
///
/// Modules are numbered in declaration order within their class, so the
/// pure states of class `c` are `c * global_dimension ..`.
#[derive(Debug, Clone)]
pub struct ModuleSet {
    modules: Vec<Module>,
    by_name: HashMap<String, usize>,
    by_state: HashMap<PureState, usize>,
    class_dimensions: Vec<usize>,
    global_dimension: usize,
    connection_types: Vec<String>,
    duals: Vec<ConnectionType>,
}

impl ModuleSet {
    /// Creates a new `ModuleSet`.
    ///
    /// # Arguments
    ///
    /// * `connection_types` - Names of the connection types, indexed by `ConnectionType`.
    /// * `duals` - The dual of every connection type. Must be an involution.
    /// * `modules` - `(name, exclusion class)` pairs in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a `RuleSetError` for empty inputs, duplicate names, an invalid
    /// dual map or a class with more than [`MAX_LOCAL_DIMENSION`] modules.
    pub fn new(
        connection_types: Vec<String>,
        duals: Vec<ConnectionType>,
        modules: Vec<(String, usize)>,
    ) -> Result<Self, RuleSetError> {
        if connection_types.is_empty() {
            return Err(RuleSetError::NoConnectionTypes);
        }
        if modules.is_empty() {
            return Err(RuleSetError::NoModules);
        }
        for t in 0..connection_types.len() {
            let valid = duals
                .get(t)
                .and_then(|&dual| duals.get(dual))
                .is_some_and(|&back| back == t);
            if !valid {
                return Err(RuleSetError::InvalidDual(t));
            }
        }
        if duals.len() != connection_types.len() {
            return Err(RuleSetError::InvalidDual(connection_types.len()));
        }

        let class_count = modules.iter().map(|(_, class)| class + 1).max().unwrap_or(1);
        let mut class_dimensions = vec![0; class_count];
        let mut positions = Vec::with_capacity(modules.len());
        for (name, class) in &modules {
            positions.push(class_dimensions[*class]);
            class_dimensions[*class] += 1;
            if class_dimensions[*class] > MAX_LOCAL_DIMENSION {
                return Err(RuleSetError::ClassTooLarge {
                    class: *class,
                    count: class_dimensions[*class],
                });
            }
            debug!("Registered module '{}' in class {}", name, class);
        }
        let global_dimension = class_dimensions.iter().copied().max().unwrap_or(1);

        let mut registry = Self {
            modules: Vec::with_capacity(modules.len()),
            by_name: HashMap::new(),
            by_state: HashMap::new(),
            class_dimensions,
            global_dimension,
            connection_types,
            duals,
        };
        for ((name, class), position) in modules.into_iter().zip(positions) {
            let index = registry.modules.len();
            if registry.by_name.insert(name.clone(), index).is_some() {
                return Err(RuleSetError::DuplicateModule(name));
            }
            let state = PureState(class * global_dimension + position);
            registry.by_state.insert(state, index);
            registry.modules.push(Module {
                name,
                exclusion_class: class,
                state,
            });
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All modules in declaration order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Pure state of the module called `name`.
    pub fn state_of(&self, name: &str) -> Option<PureState> {
        self.by_name.get(name).map(|&index| self.modules[index].state)
    }

    /// The module behind a pure state, if any.
    pub fn module(&self, state: PureState) -> Option<&Module> {
        self.by_state.get(&state).map(|&index| &self.modules[index])
    }

    pub fn name_of(&self, state: PureState) -> Option<&str> {
        self.module(state).map(|module| module.name.as_str())
    }

    pub fn global_dimension(&self) -> usize {
        self.global_dimension
    }

    /// Number of modules in `class`; zero for unused classes.
    pub fn class_dimension(&self, class: usize) -> usize {
        self.class_dimensions.get(class).copied().unwrap_or(0)
    }

    pub fn class_count(&self) -> usize {
        self.class_dimensions.len()
    }

    /// Size of the absolute pure-state range covering every class.
    pub fn state_space(&self) -> usize {
        self.class_count() * self.global_dimension
    }

    pub fn connection_type_count(&self) -> usize {
        self.connection_types.len()
    }

    pub fn connection_type_index(&self, name: &str) -> Option<ConnectionType> {
        self.connection_types.iter().position(|t| t == name)
    }

    pub fn connection_type_name(&self, connection_type: ConnectionType) -> Option<&str> {
        self.connection_types
            .get(connection_type)
            .map(String::as_str)
    }

    /// Dual of `connection_type`; out-of-range types map to themselves.
    pub fn dual(&self, connection_type: ConnectionType) -> ConnectionType {
        self.duals
            .get(connection_type)
            .copied()
            .unwrap_or(connection_type)
    }

    pub fn duals(&self) -> &[ConnectionType] {
        &self.duals
    }

    pub fn class_dimensions(&self) -> &[usize] {
        &self.class_dimensions
    }
}

/// Direct adjacency table over absolute pure states.
///
/// Stores the rules in a flattened boolean vector.
/// The indexing scheme assumes `allowed[type][x][y]` layout.
#[derive(Debug, Clone)]
pub struct AdjacencyRules {
    num_states: usize,
    duals: Vec<ConnectionType>,
    class_dimensions: Vec<usize>,
    /// Indexing: `type * num_states * num_states + x * num_states + y`
    allowed: Vec<bool>,
}

impl AdjacencyRules {
    /// Builds the table from allowed `(x, y, type)` tuples.
    ///
    /// Every tuple also allows `(y, x, dual(type))`, so the result is
    /// symmetric under the dual map whatever subset of orientations the
    /// tuples list.
    ///
    /// # Errors
    ///
    /// Returns a `RuleSetError` if a tuple names an unknown state or type.
    pub fn from_allowed_tuples(
        modules: &ModuleSet,
        tuples: &[(PureState, PureState, ConnectionType)],
    ) -> Result<Self, RuleSetError> {
        let allowed = generate_symmetric_rules(tuples, modules)?;
        Ok(Self {
            num_states: modules.state_space(),
            duals: modules.duals().to_vec(),
            class_dimensions: modules.class_dimensions().to_vec(),
            allowed,
        })
    }

    /// Number of absolute pure states the table covers.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Number of allowed `(x, type, y)` entries.
    pub fn allowed_count(&self) -> usize {
        self.allowed.iter().filter(|&&allowed| allowed).count()
    }
}

impl EntanglementRules for AdjacencyRules {
    /// Out-of-range states or types are treated as disallowed.
    #[inline]
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool {
        if x.0 >= self.num_states || y.0 >= self.num_states || connection_type >= self.duals.len()
        {
            return false;
        }
        let index = connection_type * self.num_states * self.num_states + x.0 * self.num_states + y.0;
        self.allowed.get(index).copied().unwrap_or(false)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn compass() -> (Vec<String>, Vec<ConnectionType>) {
        (
            ["N", "S", "E", "W"].iter().map(|s| (*s).to_owned()).collect(),
            vec![1, 0, 3, 2],
        )
    }

    #[test]
    fn test_module_numbering_per_class() {
        let (types, duals) = compass();
        let modules = ModuleSet::new(
            types,
            duals,
            vec![
                ("grass".to_owned(), 0),
                ("door".to_owned(), 1),
                ("water".to_owned(), 0),
                ("sand".to_owned(), 0),
            ],
        )
        .unwrap();
        assert_eq!(modules.global_dimension(), 3);
        assert_eq!(modules.class_dimension(1), 1);
        assert_eq!(modules.class_dimension(7), 0);
        assert_eq!(modules.state_of("water"), Some(PureState(1)));
        assert_eq!(modules.state_of("door"), Some(PureState(3)));
        assert_eq!(modules.name_of(PureState(2)), Some("sand"));
        assert_eq!(modules.name_of(PureState(4)), None);
        assert_eq!(modules.state_space(), 6);
        assert_eq!(modules.connection_type_index("E"), Some(2));
    }

    #[test]
    fn test_duplicate_module_is_rejected() {
        let (types, duals) = compass();
        let result = ModuleSet::new(
            types,
            duals,
            vec![("a".to_owned(), 0), ("a".to_owned(), 0)],
        );
        assert_eq!(
            result.err(),
            Some(RuleSetError::DuplicateModule("a".to_owned()))
        );
    }

    #[test]
    fn test_non_involutive_duals_are_rejected() {
        let (types, _) = compass();
        let result = ModuleSet::new(types, vec![1, 2, 3, 0], vec![("a".to_owned(), 0)]);
        assert_eq!(result.err(), Some(RuleSetError::InvalidDual(0)));
    }

    #[test]
    fn test_adjacency_is_symmetrized() {
        let (types, duals) = compass();
        let modules =
            ModuleSet::new(types, duals, vec![("a".to_owned(), 0), ("b".to_owned(), 0)]).unwrap();
        let rules =
            AdjacencyRules::from_allowed_tuples(&modules, &[(PureState(0), PureState(1), 2)])
                .unwrap();
        assert!(rules.allows(PureState(0), 2, PureState(1)));
        assert!(rules.allows(PureState(1), 3, PureState(0)));
        assert!(!rules.allows(PureState(1), 2, PureState(0)));
        assert!(!rules.allows(PureState(0), 9, PureState(1)));
        assert!(!rules.allows(PureState(5), 2, PureState(1)));
        assert_eq!(rules.allowed_count(), 2);
        assert_eq!(rules.dimension_in_exclusion_class(0), 2);
    }
}

//! Rule-file structure shared by every serde-based format.

use crate::connection_state::ConnectionStateRules;
use crate::types::{AdjacencyRules, ModuleSet};
use crate::{LoadError, LoadedRules, RuleSet};
use log::{debug, warn};
use nalgebra::DVector;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use xwfc_core::ConnectionType;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModuleData {
    /// The unique identifier name for the module used in rule definitions.
    name: String,
    #[serde(default)]
    class: usize,
    /// Connection-state vector per connection type name.
    #[serde(default)]
    states: Option<BTreeMap<String, Vec<i32>>>,
}

/// Represents the top-level structure of an XWFC rule file.
/// Used internally for deserialization.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RuleFile {
    connection_types: Vec<String>,
    /// Pairs of mutually dual connection types; a type may be paired with itself.
    duals: Vec<(String, String)>,
    modules: Vec<ModuleData>,
    /// `(module, neighbor, connection type)` triples.
    #[serde(default)]
    adjacency: Vec<(String, String, String)>,
}

fn connection_type_index(types: &[String], name: &str) -> Result<ConnectionType, LoadError> {
    types
        .iter()
        .position(|t| t == name)
        .ok_or_else(|| LoadError::InvalidData(format!("Invalid connection type name: {name}")))
}

fn dual_map(file: &RuleFile) -> Result<Vec<ConnectionType>, LoadError> {
    let mut duals: Vec<Option<ConnectionType>> = vec![None; file.connection_types.len()];
    for (a, b) in &file.duals {
        let a = connection_type_index(&file.connection_types, a)?;
        let b = connection_type_index(&file.connection_types, b)?;
        for (from, to) in [(a, b), (b, a)] {
            match duals[from] {
                Some(existing) if existing != to => {
                    return Err(LoadError::InvalidData(format!(
                        "Conflicting duals for connection type {}",
                        file.connection_types[from]
                    )));
                }
                _ => duals[from] = Some(to),
            }
        }
    }
    duals
        .iter()
        .enumerate()
        .map(|(index, dual)| {
            dual.ok_or_else(|| {
                LoadError::InvalidData(format!(
                    "Connection type {} has no dual",
                    file.connection_types[index]
                ))
            })
        })
        .collect()
}

fn connection_states(
    file: &RuleFile,
    modules: &ModuleSet,
) -> Result<ConnectionStateRules, LoadError> {
    let mut states = HashMap::new();
    for module in &file.modules {
        let declared = module.states.as_ref().ok_or_else(|| {
            LoadError::InvalidData(format!(
                "Module {} has no connection states while others do",
                module.name
            ))
        })?;
        for name in declared.keys() {
            connection_type_index(&file.connection_types, name)?;
        }
        let vectors = file
            .connection_types
            .iter()
            .map(|t| {
                declared
                    .get(t)
                    .map(|values| DVector::from_vec(values.clone()))
                    .ok_or_else(|| {
                        LoadError::InvalidData(format!(
                            "Module {} has no connection state for {t}",
                            module.name
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let state = modules.state_of(&module.name).ok_or_else(|| {
            LoadError::InvalidData(format!("Unknown module: {}", module.name))
        })?;
        states.insert(state, vectors);
    }
    Ok(ConnectionStateRules::new(modules, states)?)
}

fn adjacency(file: &RuleFile, modules: &ModuleSet) -> Result<AdjacencyRules, LoadError> {
    let mut tuples = Vec::with_capacity(file.adjacency.len());
    for (first, second, connection_type) in &file.adjacency {
        let x = modules
            .state_of(first)
            .ok_or_else(|| LoadError::InvalidData(format!("Unknown module: {first}")))?;
        let y = modules
            .state_of(second)
            .ok_or_else(|| LoadError::InvalidData(format!("Unknown module: {second}")))?;
        let t = connection_type_index(&file.connection_types, connection_type)?;
        tuples.push((x, y, t));
    }
    Ok(AdjacencyRules::from_allowed_tuples(modules, &tuples)?)
}

/// Validates a deserialized rule file and builds the rules it describes.
///
/// Modules with connection states yield [`ConnectionStateRules`]; otherwise
/// the adjacency triples yield [`AdjacencyRules`].
pub(crate) fn build(file: RuleFile) -> Result<LoadedRules, LoadError> {
    if file.modules.is_empty() {
        return Err(LoadError::InvalidData("No modules defined.".to_owned()));
    }
    let duals = dual_map(&file)?;
    let modules = ModuleSet::new(
        file.connection_types.clone(),
        duals,
        file.modules
            .iter()
            .map(|module| (module.name.clone(), module.class))
            .collect(),
    )?;

    let rules = if file.modules.iter().any(|module| module.states.is_some()) {
        if !file.adjacency.is_empty() {
            warn!(
                "Ignoring {} adjacency entries: modules declare connection states",
                file.adjacency.len()
            );
        }
        RuleSet::ConnectionState(connection_states(&file, &modules)?)
    } else {
        RuleSet::Adjacency(adjacency(&file, &modules)?)
    };
    debug!(
        "Built {} rules for {} modules in {} classes",
        rules.kind(),
        modules.len(),
        modules.class_count()
    );
    Ok(LoadedRules { modules, rules })
}

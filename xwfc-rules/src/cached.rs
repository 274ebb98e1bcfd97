use log::debug;
use xwfc_core::rules::naive_allowed_states;
use xwfc_core::{ConnectionType, EntanglementRules, PureState, StateError, SuperposedState};

/// Wraps a rule set with precomputed `allowed_states` masks.
///
/// For every connection type, every pure state `x` and every target class,
/// the set of states of that class compatible with `x` is computed once.
/// `allowed_states` then reduces to a union of cached masks. Queries the
/// cache cannot answer (a template with other dimensions) fall back to the
/// naive derivation, so results always match it.
#[derive(Debug, Clone)]
pub struct CachedRules<R: EntanglementRules> {
    inner: R,
    global_dimension: usize,
    class_count: usize,
    /// Indexed `[type][x][target class]`; `None` for unused classes.
    masks: Vec<Vec<Vec<Option<SuperposedState>>>>,
}

impl<R: EntanglementRules> CachedRules<R> {
    /// Precomputes the masks of `inner`.
    ///
    /// # Errors
    ///
    /// Returns a `StateError` if a class dimension of `inner` does not fit
    /// `global_dimension`.
    pub fn new(inner: R, global_dimension: usize) -> Result<Self, StateError> {
        let class_count = inner.exclusion_class_count();
        let num_states = class_count * global_dimension;
        let mut masks = Vec::with_capacity(inner.connection_type_count());
        for connection_type in 0..inner.connection_type_count() {
            let mut per_state = vec![vec![None; class_count]; num_states];
            for source_class in 0..class_count {
                let local = inner.dimension_in_exclusion_class(source_class);
                if local == 0 {
                    continue;
                }
                let source_template = SuperposedState::none(global_dimension, local, source_class)?;
                for offset in 0..local {
                    let x = PureState(source_class * global_dimension + offset);
                    let mut source = source_template.clone();
                    source.add(x);
                    for target_class in 0..class_count {
                        let target_local = inner.dimension_in_exclusion_class(target_class);
                        if target_local == 0 {
                            continue;
                        }
                        let template = SuperposedState::none(global_dimension, target_local, target_class)?;
                        per_state[x.0][target_class] = Some(naive_allowed_states(
                            &inner,
                            &source,
                            connection_type,
                            &template,
                        ));
                    }
                }
            }
            masks.push(per_state);
        }
        debug!(
            "Cached allowed-state masks for {} connection types, {} classes, {} states",
            masks.len(),
            class_count,
            num_states
        );
        Ok(Self {
            inner,
            global_dimension,
            class_count,
            masks,
        })
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn cached_mask(
        &self,
        x: PureState,
        connection_type: ConnectionType,
        template: &SuperposedState,
    ) -> Option<&SuperposedState> {
        if template.global_dimension() != self.global_dimension
            || template.exclusion_class() >= self.class_count
        {
            return None;
        }
        let mask = self
            .masks
            .get(connection_type)?
            .get(x.0)?
            .get(template.exclusion_class())?
            .as_ref()?;
        (mask.local_dimension() == template.local_dimension()).then_some(mask)
    }
}

impl<R: EntanglementRules> EntanglementRules for CachedRules<R> {
    fn allows(&self, x: PureState, connection_type: ConnectionType, y: PureState) -> bool {
        self.inner.allows(x, connection_type, y)
    }

    fn allowed_states(
        &self,
        x: &SuperposedState,
        connection_type: ConnectionType,
        y_template: &SuperposedState,
    ) -> SuperposedState {
        let mut allowed = y_template.empty_like();
        for component in x.components() {
            match self.cached_mask(component, connection_type, y_template) {
                Some(mask) => allowed.union_with(mask),
                None => return naive_allowed_states(&self.inner, x, connection_type, y_template),
            }
        }
        allowed
    }

    fn dual_connection(&self, connection_type: ConnectionType) -> ConnectionType {
        self.inner.dual_connection(connection_type)
    }

    fn dimension_in_exclusion_class(&self, exclusion_class: usize) -> usize {
        self.inner.dimension_in_exclusion_class(exclusion_class)
    }

    fn connection_type_count(&self) -> usize {
        self.inner.connection_type_count()
    }

    fn exclusion_class_count(&self) -> usize {
        self.inner.exclusion_class_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdjacencyRules, ModuleSet};

    fn rules() -> AdjacencyRules {
        let modules = ModuleSet::new(
            vec!["E".to_owned(), "W".to_owned()],
            vec![1, 0],
            vec![
                ("a".to_owned(), 0),
                ("b".to_owned(), 0),
                ("c".to_owned(), 0),
                ("door".to_owned(), 1),
            ],
        )
        .unwrap();
        AdjacencyRules::from_allowed_tuples(
            &modules,
            &[
                (PureState(0), PureState(1), 0),
                (PureState(1), PureState(2), 0),
                (PureState(2), PureState(3), 0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cached_matches_naive() {
        let cached = CachedRules::new(rules(), 3).unwrap();
        let mut x = SuperposedState::none(3, 3, 0).unwrap();
        x.add(PureState(0));
        x.add(PureState(2));
        for class in 0..2 {
            let local = cached.dimension_in_exclusion_class(class);
            let template = SuperposedState::equiprobable_in_class(3, local, class).unwrap();
            for t in 0..2 {
                assert_eq!(
                    cached.allowed_states(&x, t, &template),
                    naive_allowed_states(cached.inner(), &x, t, &template)
                );
            }
        }
    }

    #[test]
    fn test_cross_class_mask() {
        let cached = CachedRules::new(rules(), 3).unwrap();
        let mut x = SuperposedState::none(3, 3, 0).unwrap();
        x.add(PureState(2));
        let template = SuperposedState::equiprobable_in_class(3, 1, 1).unwrap();
        assert_eq!(
            cached.allowed_states(&x, 0, &template).components(),
            vec![PureState(3)]
        );
    }

    #[test]
    fn test_foreign_template_falls_back() {
        let cached = CachedRules::new(rules(), 3).unwrap();
        let mut x = SuperposedState::none(4, 3, 0).unwrap();
        x.add(PureState(1));
        let template = SuperposedState::equiprobable_in_class(4, 3, 0).unwrap();
        assert_eq!(
            cached.allowed_states(&x, 0, &template).components(),
            vec![PureState(2)]
        );
    }
}

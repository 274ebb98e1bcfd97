use proptest::prelude::*;
use std::path::PathBuf;
use xwfc_core::rules::naive_allowed_states;
use xwfc_core::{EntanglementRules, PureState, SuperposedState};
use xwfc_rules::loader::load_from_file;
use xwfc_rules::{AdjacencyRules, CachedRules, LoadedRules, ModuleSet};

fn connectors() -> LoadedRules {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/rules_data/connectors.ron");
    load_from_file(&path).expect("connectors.ron should load")
}

/// Random adjacency tables over two classes (3 and 2 modules) and three
/// connection types, one of them self-dual.
fn random_adjacency() -> impl Strategy<Value = AdjacencyRules> {
    prop::collection::vec((0usize..5, 0usize..5, 0usize..3), 0..25).prop_map(|raw| {
        let modules = ModuleSet::new(
            vec!["a".to_owned(), "b".to_owned(), "self".to_owned()],
            vec![1, 0, 2],
            vec![
                ("m0".to_owned(), 0),
                ("m1".to_owned(), 0),
                ("m2".to_owned(), 0),
                ("n0".to_owned(), 1),
                ("n1".to_owned(), 1),
            ],
        )
        .unwrap();
        let states: Vec<PureState> = modules.modules().iter().map(|m| m.state).collect();
        let tuples: Vec<_> = raw
            .into_iter()
            .map(|(x, y, t)| (states[x], states[y], t))
            .collect();
        AdjacencyRules::from_allowed_tuples(&modules, &tuples).unwrap()
    })
}

fn assert_symmetric<R: EntanglementRules>(rules: &R, states: &[PureState]) {
    for t in 0..rules.connection_type_count() {
        assert_eq!(rules.dual_connection(rules.dual_connection(t)), t);
        for &x in states {
            for &y in states {
                assert_eq!(
                    rules.allows(x, t, y),
                    rules.allows(y, rules.dual_connection(t), x),
                    "asymmetric rule {x} -{t}-> {y}"
                );
            }
        }
    }
}

#[test]
fn connection_state_rules_are_symmetric() {
    let loaded = connectors();
    let states: Vec<PureState> = loaded.modules.modules().iter().map(|m| m.state).collect();
    assert_symmetric(&loaded.rules, &states);
}

proptest! {
    #[test]
    fn adjacency_rules_are_symmetric(rules in random_adjacency()) {
        let states: Vec<PureState> = [0, 1, 2, 3, 4].into_iter().map(PureState).collect();
        assert_symmetric(&rules, &states);
    }

    #[test]
    fn cached_rules_agree_with_naive(
        rules in random_adjacency(),
        source_bits in 1u8..8,
        source_class in 0usize..2,
        target_class in 0usize..2,
        connection_type in 0usize..3,
    ) {
        let cached = CachedRules::new(rules, 3).unwrap();
        let source_local = cached.dimension_in_exclusion_class(source_class);
        let mut x = SuperposedState::none(3, source_local, source_class).unwrap();
        for offset in 0..source_local {
            if source_bits & (1 << offset) != 0 {
                x.add(PureState(source_class * 3 + offset));
            }
        }
        let target_local = cached.dimension_in_exclusion_class(target_class);
        let template = SuperposedState::equiprobable_in_class(3, target_local, target_class).unwrap();
        prop_assert_eq!(
            cached.allowed_states(&x, connection_type, &template),
            naive_allowed_states(cached.inner(), &x, connection_type, &template)
        );
    }

    #[test]
    fn cached_connection_states_agree_with_naive(
        modules in prop::collection::vec(0usize..16, 1..6),
        connection_type in 0usize..4,
    ) {
        let loaded = connectors();
        let cached = CachedRules::new(loaded.rules, loaded.modules.global_dimension()).unwrap();
        let mut x = SuperposedState::none(16, 16, 0).unwrap();
        for module in modules {
            x.add(PureState(module));
        }
        let template = SuperposedState::equiprobable_in_class(16, 16, 0).unwrap();
        prop_assert_eq!(
            cached.allowed_states(&x, connection_type, &template),
            naive_allowed_states(cached.inner(), &x, connection_type, &template)
        );
    }
}

use std::path::PathBuf;
use xwfc_core::grid::GRID_DUALS;
use xwfc_core::{
    BoundaryMode, CollapseConfig, EntanglementRules, GridTopology, Step, WaveFunctionCollapse,
    WaveFunctionSystem,
};
use xwfc_rules::loader::load_from_file;
use xwfc_rules::{CachedRules, RuleSet};

const SEED: u64 = 1_234;
const MAX_STEPS: u64 = 200;

fn solver(width: usize, height: usize) -> WaveFunctionCollapse<GridTopology, CachedRules<RuleSet>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/rules_data/connectors.ron");
    let loaded = load_from_file(&path).expect("connectors.ron should load");
    let global = loaded.modules.global_dimension();
    let rules = CachedRules::new(loaded.rules, global).unwrap();
    let grid = GridTopology::new(width, height, BoundaryMode::Clamped);
    let system = WaveFunctionSystem::new(grid, rules, global, None, Some("boundary")).unwrap();
    WaveFunctionCollapse::new(system, CollapseConfig::builder().seed(SEED).build())
}

#[test]
fn test_file_duals_match_grid() {
    let wfc = solver(1, 1);
    let rules = wfc.system().rules();
    for (t, &dual) in GRID_DUALS.iter().enumerate() {
        assert_eq!(rules.dual_connection(t), dual);
    }
}

#[test]
fn test_connection_state_grid_both_modes_agree() {
    let mut eager = solver(10, 6);
    let mut stepped = solver(10, 6);

    eager.collapse(MAX_STEPS).expect("eager collapse should succeed");

    let mut steps = stepped.collapse_coroutine(MAX_STEPS);
    let mut pauses = 0;
    let mut last = None;
    for step in steps.by_ref() {
        pauses += 1;
        last = Some(step);
    }
    assert_eq!(last, Some(Step::Completed));
    assert!(pauses > 60, "every variable needs at least one pause point");
    assert!(matches!(steps.outcome(), Some(Ok(_))));
    drop(steps);

    for system in [eager.system(), stepped.system()] {
        assert!(system.is_fully_resolved());
        assert!(system.violations().is_empty());
        assert!(system
            .variables()
            .all(|v| system.wave(v).is_some_and(|wave| wave.entropy() == 0)));
    }
    assert_eq!(eager.system().snapshot(), stepped.system().snapshot());
}

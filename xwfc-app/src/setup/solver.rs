//! Builds the grid solver from resolved settings and loaded rules.

use crate::config::Settings;
use crate::error::AppError;
use log::{info, warn};
use xwfc_core::grid::GRID_DUALS;
use xwfc_core::{CollapseConfig, GridTopology, WaveFunctionCollapse, WaveFunctionSystem};
use xwfc_rules::{CachedRules, ModuleSet, RuleSet};

/// Grid attribute holding each cell's exclusion class.
pub const CLASS_ATTRIBUTE: &str = "class";
/// Grid attribute holding the module forced on a cell.
pub const BOUNDARY_ATTRIBUTE: &str = "boundary";

pub type GridSolver = WaveFunctionCollapse<GridTopology, CachedRules<RuleSet>>;

/// Checks that the rule file's connection types line up with the grid's
/// north, south, east and west edges.
pub fn check_grid_rules(modules: &ModuleSet) -> Result<(), AppError> {
    if modules.duals() != GRID_DUALS.as_slice() {
        return Err(AppError::Config(format!(
            "Grid rules need four connection types ordered north, south, east, west \
             with duals (north, south) and (east, west); the rule file defines {} with duals {:?}",
            modules.connection_type_count(),
            modules.duals()
        )));
    }
    Ok(())
}

/// Creates the grid, forcing `settings.border_module` onto every border cell.
pub fn build_grid(settings: &Settings, modules: &ModuleSet) -> Result<GridTopology, AppError> {
    let mut grid = GridTopology::new(settings.width, settings.height, settings.boundary_mode);
    if modules.class_count() > 1 {
        warn!(
            "Rule file declares {} exclusion classes; inner cells only use class 0",
            modules.class_count()
        );
    }
    let Some(name) = &settings.border_module else {
        return Ok(grid);
    };
    let module = modules
        .state_of(name)
        .and_then(|state| modules.module(state))
        .ok_or_else(|| AppError::Config(format!("Unknown border module: {name}")))?;

    let mut border_cells = 0;
    for y in 0..grid.height {
        for x in 0..grid.width {
            let on_border = x == 0 || y == 0 || x + 1 == grid.width || y + 1 == grid.height;
            let Some(index) = grid.index_of(x, y).filter(|_| on_border) else {
                continue;
            };
            grid.set_attribute(CLASS_ATTRIBUTE, index, Some(module.exclusion_class as i64));
            grid.set_attribute(BOUNDARY_ATTRIBUTE, index, Some(module.state.0 as i64));
            border_cells += 1;
        }
    }
    info!("Forced module '{name}' on {border_cells} border cells");
    Ok(grid)
}

/// Sets up a solver over a fresh grid.
pub fn build_solver(
    settings: &Settings,
    modules: &ModuleSet,
    rules: CachedRules<RuleSet>,
    config: CollapseConfig,
) -> Result<GridSolver, AppError> {
    let grid = build_grid(settings, modules)?;
    let system = WaveFunctionSystem::new(
        grid,
        rules,
        modules.global_dimension(),
        Some(CLASS_ATTRIBUTE),
        Some(BOUNDARY_ATTRIBUTE),
    )?;
    Ok(WaveFunctionCollapse::new(system, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use xwfc_core::PureState;

    fn modules() -> ModuleSet {
        ModuleSet::new(
            vec!["N".into(), "S".into(), "E".into(), "W".into()],
            GRID_DUALS.to_vec(),
            vec![
                ("grass".into(), 0),
                ("sand".into(), 0),
                ("wall".into(), 1),
            ],
        )
        .unwrap()
    }

    fn settings(border: Option<&str>) -> Settings {
        Settings {
            rule_file: Some(PathBuf::from("r.ron")),
            width: 4,
            height: 3,
            border_module: border.map(str::to_owned),
            ..Settings::default()
        }
    }

    #[test]
    fn test_grid_rules_need_grid_duals() {
        assert!(check_grid_rules(&modules()).is_ok());
        let flipped = ModuleSet::new(
            vec!["a".into(), "b".into()],
            vec![1, 0],
            vec![("grass".into(), 0)],
        )
        .unwrap();
        assert!(matches!(check_grid_rules(&flipped), Err(AppError::Config(_))));
    }

    #[test]
    fn test_border_cells_get_module_and_class() {
        let modules = modules();
        let grid = build_grid(&settings(Some("wall")), &modules).unwrap();
        let wall = modules.state_of("wall").unwrap();
        let corner = grid.index_of(0, 0).unwrap();
        let inner = grid.index_of(1, 1).unwrap();
        assert_eq!(grid.attribute(BOUNDARY_ATTRIBUTE, corner), Some(wall.0 as i64));
        assert_eq!(grid.attribute(CLASS_ATTRIBUTE, corner), Some(1));
        assert_eq!(grid.attribute(BOUNDARY_ATTRIBUTE, inner), None);
        assert_eq!(grid.attribute(CLASS_ATTRIBUTE, inner), None);
    }

    #[test]
    fn test_unknown_border_module() {
        assert!(matches!(
            build_grid(&settings(Some("lava")), &modules()),
            Err(AppError::Config(msg)) if msg.contains("lava")
        ));
    }

    #[test]
    fn test_solver_starts_with_forced_border() {
        let modules = modules();
        let rules = xwfc_rules::AdjacencyRules::from_allowed_tuples(&modules, &[]).unwrap();
        let cached = CachedRules::new(RuleSet::Adjacency(rules), modules.global_dimension()).unwrap();
        let settings = settings(Some("wall"));
        let config = settings.collapse_config().build();
        let solver = build_solver(&settings, &modules, cached, config).unwrap();
        let system = solver.system();
        let corner = system.variable_of(0).unwrap();
        assert_eq!(
            system.wave(corner).and_then(|wave| wave.resolved_state()),
            modules.state_of("wall")
        );
        // Inner cells hold both class-0 modules.
        let inner = system.variable_of(5).unwrap();
        assert_eq!(
            system.wave(inner).map(|wave| wave.components()),
            Some(vec![PureState(0), PureState(1)])
        );
    }
}

//! Handles the core execution logic for standard and benchmark modes.

use crate::benchmark;
use crate::config::{Settings, VisualizationMode};
use crate::error::AppError;
use crate::output;
use crate::progress::{progress_callback, LogProgressReporter};
use crate::setup::solver::{build_solver, check_grid_rules};
use crate::visualization::{TerminalVisualizer, Visualizer};
use log::{debug, error, info, trace};
use std::io::{self, IsTerminal, Stdout};
use xwfc_core::{EntanglementRules, Step};
use xwfc_rules::loader::load_from_file;
use xwfc_rules::{CachedRules, LoadedRules, ModuleSet, RuleSet};

/// Loads the rule file, checks it fits the grid and builds the mask cache.
pub fn load_rules(settings: &Settings) -> Result<(ModuleSet, CachedRules<RuleSet>), AppError> {
    let path = settings.rule_file()?;
    info!("Loading rules from: {:?}", path);
    let LoadedRules { modules, rules } = load_from_file(path)?;
    info!(
        "Rules loaded: {} rules, {} connection types, {} modules in {} exclusion classes",
        rules.kind(),
        rules.connection_type_count(),
        modules.len(),
        modules.class_count()
    );
    check_grid_rules(&modules)?;
    let cached = CachedRules::new(rules, modules.global_dimension())?;
    Ok((modules, cached))
}

fn terminal_visualizer(
    settings: &Settings,
    modules: &ModuleSet,
) -> Option<TerminalVisualizer<Stdout>> {
    match settings.visualization_mode {
        VisualizationMode::None => None,
        VisualizationMode::Terminal => {
            let stdout = io::stdout();
            let use_color = stdout.is_terminal();
            Some(TerminalVisualizer::new(stdout, modules, use_color))
        }
    }
}

/// Collapses one grid and saves it.
pub fn run_standard_mode(settings: &Settings) -> Result<(), AppError> {
    info!("Running XWFC standard mode...");
    let (modules, rules) = load_rules(settings)?;

    let mut config = settings.collapse_config();
    if let Some(interval) = settings.report_progress_interval {
        info!("Reporting progress every {}", humantime::format_duration(interval));
        config = config.progress_callback(progress_callback(LogProgressReporter::new(interval)));
    }
    let mut solver = build_solver(settings, &modules, rules, config.build())?;
    let mut visualizer = terminal_visualizer(settings, &modules);

    info!(
        "Collapsing {}x{} grid ({:?} boundary, {} mode, budget {} observations)",
        settings.width,
        settings.height,
        settings.boundary_mode,
        if settings.stepped { "stepped" } else { "eager" },
        settings.max_steps
    );
    let result = if settings.stepped {
        let mut steps = solver.collapse_coroutine(settings.max_steps);
        let mut pauses: u64 = 0;
        while let Some(step) = steps.next() {
            pauses += 1;
            match step {
                Step::Observed { variable, state } => {
                    debug!("Observed {state} at {variable}");
                    if let Some(visualizer) = visualizer.as_mut() {
                        visualizer.display_state(steps.system())?;
                    }
                }
                Step::Backtracked { .. } | Step::Restarted | Step::Contradiction { .. } => {
                    debug!("{step:?}");
                }
                _ => trace!("{step:?}"),
            }
        }
        info!("Stepped collapse paused {pauses} times");
        steps.finish()
    } else {
        solver.collapse(settings.max_steps)
    };

    let system = solver.system();
    if let Some(path) = &settings.snapshot_path {
        output::save_snapshot(system, path)?;
    }
    match result {
        Ok(stats) => {
            info!(
                "XWFC completed successfully: {} observations, {} backtracks, {} restarts, {} propagation steps",
                stats.observations, stats.backtracks, stats.restarts, stats.propagation_steps
            );
            if let Some(visualizer) = visualizer.as_mut() {
                visualizer.display_state(system)?;
            }
            info!("Saving final grid to: {}", settings.output_path.display());
            output::save_grid_to_file(system, &modules, &settings.output_path)
        }
        Err(e) => {
            error!("XWFC failed: {}", e);
            if let Some(visualizer) = visualizer.as_mut() {
                visualizer.display_state(system)?;
            }
            Err(e.into())
        }
    }
}

/// Times the eager against the stepped solver and reports both.
pub fn run_benchmark_mode(settings: &Settings) -> Result<(), AppError> {
    info!(
        "Benchmark mode enabled. Runs per solver mode: {}",
        settings.benchmark_runs
    );
    let (modules, rules) = load_rules(settings)?;
    let rule_file = settings.rule_file()?;
    let comparison = benchmark::compare_modes(rule_file, settings, &modules, &rules)?;
    benchmark::report_comparison(&comparison);

    if let Some(csv_path) = &settings.benchmark_csv_output {
        info!("Writing benchmark results to {:?}", csv_path);
        benchmark::write_scenario_results_to_csv(&comparison.scenarios, csv_path)?;
    }
    if comparison.mismatched_seeds.is_empty() {
        Ok(())
    } else {
        Err(AppError::BenchmarkMismatch(comparison.mismatched_seeds))
    }
}

//! Benchmarking utilities comparing the eager and the stepped solver.
//!
//! Both drivers share the same step function, so for one seed they must
//! reach the same final waves; every run pair is checked for that as well.

use crate::config::Settings;
use crate::error::AppError;
use crate::setup::solver::build_solver;
use colored::Colorize;
use log::{info, warn};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use xwfc_core::{CollapseStats, SuperposedState, WfcError};
use xwfc_rules::{CachedRules, ModuleSet, RuleSet};

/// Which driver a benchmark run used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMode {
    /// `collapse`: one call until done.
    Eager,
    /// `collapse_coroutine`: iterated one step at a time.
    Stepped,
}

impl fmt::Display for SolverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Stepped => write!(f, "stepped"),
        }
    }
}

/// Represents the results of a single benchmark run.
#[derive(Debug)]
pub struct BenchmarkResult {
    pub mode: SolverMode,
    pub seed: u64,
    /// Wall-clock time of the collapse, excluding solver setup.
    pub total_time: Duration,
    pub outcome: Result<CollapseStats, WfcError>,
    /// Final waves, for comparing the two drivers.
    pub snapshot: Vec<SuperposedState>,
}

/// Structure to hold aggregated results for one solver mode (multiple runs).
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkScenarioResult {
    pub rule_file: PathBuf,
    pub mode: SolverMode,
    pub width: usize,
    pub height: usize,
    pub num_modules: usize,
    pub runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    pub avg_total_time_ms: Option<f64>,
    pub median_total_time_ms: Option<f64>,
    pub stddev_total_time_ms: Option<f64>,
    pub avg_observations: Option<f64>,
    pub total_backtracks: u64,
}

/// Outcome of [`compare_modes`].
#[derive(Debug)]
pub struct ModeComparison {
    pub scenarios: Vec<BenchmarkScenarioResult>,
    /// Seeds for which the two drivers ended in different states.
    pub mismatched_seeds: Vec<u64>,
}

pub fn calculate_median(data: &mut [f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.sort_unstable_by(f64::total_cmp);
    let mid = data.len() / 2;
    if data.len() % 2 == 0 {
        Some((data[mid - 1] + data[mid]) / 2.0)
    } else {
        Some(data[mid])
    }
}

/// Sample standard deviation; needs at least two values.
pub fn calculate_std_dev(data: &[f64], mean: f64) -> Option<f64> {
    let n = data.len();
    if n < 2 {
        return None;
    }
    let variance = data
        .iter()
        .map(|value| {
            let diff = mean - value;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1) as f64;
    Some(variance.sqrt())
}

fn mean(data: &[f64]) -> Option<f64> {
    (!data.is_empty()).then(|| data.iter().sum::<f64>() / data.len() as f64)
}

/// Runs one collapse with the given driver and seed on a fresh grid.
pub fn run_single_benchmark(
    settings: &Settings,
    modules: &ModuleSet,
    rules: &CachedRules<RuleSet>,
    mode: SolverMode,
    seed: u64,
) -> Result<BenchmarkResult, AppError> {
    let config = settings.collapse_config().seed(seed).build();
    let mut solver = build_solver(settings, modules, rules.clone(), config)?;

    let start_time = Instant::now();
    let outcome = match mode {
        SolverMode::Eager => solver.collapse(settings.max_steps),
        SolverMode::Stepped => solver.collapse_coroutine(settings.max_steps).finish(),
    };
    let total_time = start_time.elapsed();

    Ok(BenchmarkResult {
        mode,
        seed,
        total_time,
        outcome,
        snapshot: solver.system().snapshot(),
    })
}

/// Aggregates the runs of one mode.
pub fn summarize(
    rule_file: &Path,
    settings: &Settings,
    modules: &ModuleSet,
    mode: SolverMode,
    results: &[BenchmarkResult],
) -> BenchmarkScenarioResult {
    let successful: Vec<&CollapseStats> = results
        .iter()
        .filter(|result| result.mode == mode)
        .filter_map(|result| result.outcome.as_ref().ok())
        .collect();
    let runs = results.iter().filter(|result| result.mode == mode).count();
    let mut times: Vec<f64> = results
        .iter()
        .filter(|result| result.mode == mode && result.outcome.is_ok())
        .map(|result| result.total_time.as_secs_f64() * 1000.0)
        .collect();
    let observations: Vec<f64> = successful
        .iter()
        .map(|stats| stats.observations as f64)
        .collect();

    let avg_total_time_ms = mean(&times);
    BenchmarkScenarioResult {
        rule_file: rule_file.to_path_buf(),
        mode,
        width: settings.width,
        height: settings.height,
        num_modules: modules.len(),
        runs,
        successful_runs: successful.len(),
        failed_runs: runs - successful.len(),
        stddev_total_time_ms: avg_total_time_ms.and_then(|avg| calculate_std_dev(&times, avg)),
        median_total_time_ms: calculate_median(&mut times),
        avg_total_time_ms,
        avg_observations: mean(&observations),
        total_backtracks: successful.iter().map(|stats| stats.backtracks).sum(),
    }
}

/// Runs both drivers on `settings.benchmark_runs` consecutive seeds.
///
/// Seeds start at `settings.seed` (0 if unset).
pub fn compare_modes(
    rule_file: &Path,
    settings: &Settings,
    modules: &ModuleSet,
    rules: &CachedRules<RuleSet>,
) -> Result<ModeComparison, AppError> {
    let base_seed = settings.seed.unwrap_or(0);
    let mut results = Vec::with_capacity(settings.benchmark_runs * 2);
    let mut mismatched_seeds = Vec::new();

    for run in 0..settings.benchmark_runs as u64 {
        let seed = base_seed.wrapping_add(run);
        let eager = run_single_benchmark(settings, modules, rules, SolverMode::Eager, seed)?;
        let stepped = run_single_benchmark(settings, modules, rules, SolverMode::Stepped, seed)?;
        info!(
            "Seed {seed}: eager {:?} ({}), stepped {:?} ({})",
            eager.total_time,
            if eager.outcome.is_ok() { "ok" } else { "failed" },
            stepped.total_time,
            if stepped.outcome.is_ok() { "ok" } else { "failed" },
        );
        if eager.outcome.is_ok() != stepped.outcome.is_ok() || eager.snapshot != stepped.snapshot {
            warn!("Eager and stepped solver disagree for seed {seed}");
            mismatched_seeds.push(seed);
        }
        results.push(eager);
        results.push(stepped);
    }

    let scenarios = [SolverMode::Eager, SolverMode::Stepped]
        .into_iter()
        .map(|mode| summarize(rule_file, settings, modules, mode, &results))
        .collect();
    Ok(ModeComparison {
        scenarios,
        mismatched_seeds,
    })
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |ms| format!("{ms:.3}"))
}

/// Prints a comparison table to stdout.
pub fn report_comparison(comparison: &ModeComparison) {
    println!("{}", "--- Benchmark: eager vs stepped ---".bold());
    println!(
        "{:<8} {:>6} {:>6} {:>12} {:>12} {:>12} {:>10}",
        "Mode", "Runs", "OK", "Avg (ms)", "Median (ms)", "StdDev (ms)", "Avg Obs"
    );
    for scenario in &comparison.scenarios {
        let ok = scenario.successful_runs.to_string();
        let ok = if scenario.failed_runs == 0 {
            ok.green()
        } else {
            ok.yellow()
        };
        println!(
            "{:<8} {:>6} {:>6} {:>12} {:>12} {:>12} {:>10}",
            scenario.mode.to_string(),
            scenario.runs,
            ok,
            format_ms(scenario.avg_total_time_ms),
            format_ms(scenario.median_total_time_ms),
            format_ms(scenario.stddev_total_time_ms),
            scenario
                .avg_observations
                .map_or_else(|| "-".to_owned(), |obs| format!("{obs:.1}")),
        );
    }
    if comparison.mismatched_seeds.is_empty() {
        println!("{}", "Both drivers agree on every seed.".green());
    } else {
        println!(
            "{} {:?}",
            "Drivers disagree on seeds:".red().bold(),
            comparison.mismatched_seeds
        );
    }
}

/// Writes the aggregated benchmark scenario results to a CSV file.
pub fn write_scenario_results_to_csv(
    scenario_results: &[BenchmarkScenarioResult],
    path: &Path,
) -> Result<(), AppError> {
    let file = File::create(path)?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "Rule File",
        "Mode",
        "Width",
        "Height",
        "Num Modules",
        "Total Runs",
        "Successful Runs",
        "Failed Runs",
        "Avg Time (ms)",
        "Median Time (ms)",
        "Std Dev Time (ms)",
        "Avg Observations",
        "Total Backtracks",
    ])?;

    let optional = |value: Option<f64>| value.map(|v| format!("{v:.6}")).unwrap_or_default();
    for scenario in scenario_results {
        wtr.write_record([
            scenario
                .rule_file
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| scenario.rule_file.to_string_lossy())
                .to_string(),
            scenario.mode.to_string(),
            scenario.width.to_string(),
            scenario.height.to_string(),
            scenario.num_modules.to_string(),
            scenario.runs.to_string(),
            scenario.successful_runs.to_string(),
            scenario.failed_runs.to_string(),
            optional(scenario.avg_total_time_ms),
            optional(scenario.median_total_time_ms),
            optional(scenario.stddev_total_time_ms),
            optional(scenario.avg_observations),
            scenario.total_backtracks.to_string(),
        ])?;
    }

    wtr.flush()?;
    info!("Benchmark results written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(calculate_median(&mut []), None);
        assert_eq!(calculate_median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(calculate_median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(calculate_std_dev(&[1.0], 1.0), None);
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = calculate_std_dev(&data, 5.0).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn test_csv_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.csv");
        let scenario = BenchmarkScenarioResult {
            rule_file: PathBuf::from("rules/connectors.ron"),
            mode: SolverMode::Stepped,
            width: 4,
            height: 3,
            num_modules: 16,
            runs: 2,
            successful_runs: 1,
            failed_runs: 1,
            avg_total_time_ms: Some(1.5),
            median_total_time_ms: Some(1.5),
            stddev_total_time_ms: None,
            avg_observations: Some(7.0),
            total_backtracks: 3,
        };
        write_scenario_results_to_csv(&[scenario], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Rule File,Mode,Width"));
        assert_eq!(
            lines.next().unwrap(),
            "connectors.ron,stepped,4,3,16,2,1,1,1.500000,1.500000,,7.000000,3"
        );
    }
}

use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use xwfc_core::{BoundaryMode, CollapseConfig, CollapseConfigBuilder, SelectionStrategy};

/// Observation budget used when neither the CLI nor the settings name one.
pub const DEFAULT_MAX_STEPS: u64 = 10_000;

/// Prefix of environment variables that override the settings file.
pub const ENV_PREFIX: &str = "XWFC_";

/// Represents the different visualization modes available.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum VisualizationMode {
    #[default]
    None,
    /// Colored text dump of the grid.
    Terminal,
}

#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Log level of the progress reports, independent of the global level.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Durations travel through the settings layers as humantime text ("500ms", "2s").
mod duration_text {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => {
                serializer.serialize_str(&humantime::format_duration(*duration).to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Command-line arguments of the XWFC demo.
///
/// Options left unset fall back to the `--settings` TOML file, then to
/// `XWFC_*` environment variables, then to [`Settings::default`]. Flags given
/// on the command line always win.
#[derive(Parser, Serialize, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Path to the RON or JSON rule file defining modules and their compatibility.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_file: Option<PathBuf>,

    /// Width of the output grid.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,

    /// Height of the output grid.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,

    /// Whether the grid edges wrap around.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_mode: Option<BoundaryMode>,

    /// Module forced on every border cell.
    #[arg(long, value_name = "MODULE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_module: Option<String>,

    /// Optional seed for the random number generator.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Maximum number of observations before giving up.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,

    /// Restart from the initial state on contradictions instead of backtracking.
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub no_backtracking: bool,

    /// How ties between equally constrained cells are broken.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionStrategy>,

    /// Drive the solver one step at a time instead of in a single call.
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub stepped: bool,

    /// Path to save the generated grid.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Also save the final wave states as JSON.
    #[arg(long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    #[serde(skip_serializing_if = "Option::is_none", with = "duration_text")]
    pub report_progress_interval: Option<Duration>,

    /// Choose the visualization mode.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization_mode: Option<VisualizationMode>,

    /// Time the eager and the stepped solver on the same seeds.
    #[arg(long)]
    #[serde(skip_serializing_if = "is_false")]
    pub benchmark_mode: bool,

    /// Seeds per solver in benchmark mode.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_runs: Option<usize>,

    /// Optional: Path to save benchmark results as a CSV file.
    /// Only used if benchmark_mode is also enabled.
    #[arg(long, value_name = "CSV_FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_csv_output: Option<PathBuf>,

    /// Log level for all modules (RUST_LOG directives refine it).
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_log_level: Option<GlobalLogLevel>,

    /// Log level of the progress module.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_log_level: Option<ProgressLogLevel>,

    /// TOML settings file.
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub settings: Option<PathBuf>,
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rule_file: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub boundary_mode: BoundaryMode,
    pub border_module: Option<String>,
    pub seed: Option<u64>,
    pub max_steps: u64,
    pub no_backtracking: bool,
    pub selection: SelectionStrategy,
    pub stepped: bool,
    pub output_path: PathBuf,
    pub snapshot_path: Option<PathBuf>,
    #[serde(with = "duration_text")]
    pub report_progress_interval: Option<Duration>,
    pub visualization_mode: VisualizationMode,
    pub benchmark_mode: bool,
    pub benchmark_runs: usize,
    pub benchmark_csv_output: Option<PathBuf>,
    pub global_log_level: GlobalLogLevel,
    pub progress_log_level: ProgressLogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rule_file: None,
            width: 10,
            height: 10,
            boundary_mode: BoundaryMode::default(),
            border_module: None,
            seed: None,
            max_steps: DEFAULT_MAX_STEPS,
            no_backtracking: false,
            selection: SelectionStrategy::default(),
            stepped: false,
            output_path: PathBuf::from("output.txt"),
            snapshot_path: None,
            report_progress_interval: None,
            visualization_mode: VisualizationMode::None,
            benchmark_mode: false,
            benchmark_runs: 5,
            benchmark_csv_output: None,
            global_log_level: GlobalLogLevel::Info,
            progress_log_level: ProgressLogLevel::Info,
        }
    }
}

impl AppConfig {
    /// Layers defaults, the settings file, the environment and these arguments.
    pub fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = &self.settings {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(self))
    }

    /// Resolves and validates the settings for this run.
    pub fn resolve(&self) -> Result<Settings, AppError> {
        if let Some(path) = &self.settings {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
        }
        let settings: Settings = self.figment().extract()?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), AppError> {
        self.rule_file()?;
        if self.width == 0 || self.height == 0 {
            return Err(AppError::Config(format!(
                "Grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.benchmark_mode && self.benchmark_runs == 0 {
            return Err(AppError::Config(
                "Benchmark mode needs at least one run".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn rule_file(&self) -> Result<&Path, AppError> {
        self.rule_file.as_deref().ok_or_else(|| {
            AppError::Config(format!(
                "No rule file given; pass --rule-file, set rule_file in the settings file or {ENV_PREFIX}RULE_FILE"
            ))
        })
    }

    /// Solver configuration without a progress callback.
    pub fn collapse_config(&self) -> CollapseConfigBuilder {
        let builder = CollapseConfig::builder()
            .use_backtracking(!self.no_backtracking)
            .selection(self.selection);
        match self.seed {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
    }
}

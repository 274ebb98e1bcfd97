use crate::{
    entropy::{select_lowest_entropy, SelectionStrategy},
    propagator::{propagate_step, Frontier, PropagationStep},
    rules::{ConnectionType, EntanglementRules},
    state::{PureState, SuperposedState},
    system::{WaveFunctionSystem, WaveVariable},
    topology::Topology,
    ProgressInfo, WfcError,
};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Alias for the progress callback function type.
///
/// Returning an error aborts the collapse.
pub type ProgressCallback = Box<dyn FnMut(&ProgressInfo) -> Result<(), WfcError>>;

/// Configuration options for the solver.
pub struct CollapseConfig {
    /// Rewind to the last decision on contradiction instead of restarting.
    pub use_backtracking: bool,
    /// Seed for the observation RNG. `None` seeds from system entropy.
    pub seed: Option<u64>,
    pub selection: SelectionStrategy,
    /// Called after every observation.
    pub progress_callback: Option<ProgressCallback>,
}

impl CollapseConfig {
    /// Creates a new builder for `CollapseConfig`.
    pub fn builder() -> CollapseConfigBuilder {
        CollapseConfigBuilder::default()
    }
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            use_backtracking: true,
            seed: None,
            selection: SelectionStrategy::RandomLowest,
            progress_callback: None,
        }
    }
}

impl std::fmt::Debug for CollapseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapseConfig")
            .field("use_backtracking", &self.use_backtracking)
            .field("seed", &self.seed)
            .field("selection", &self.selection)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// Builder for `CollapseConfig`.
pub struct CollapseConfigBuilder {
    use_backtracking: bool,
    seed: Option<u64>,
    selection: SelectionStrategy,
    progress_callback: Option<ProgressCallback>,
}

impl Default for CollapseConfigBuilder {
    fn default() -> Self {
        Self {
            use_backtracking: true,
            seed: None,
            selection: SelectionStrategy::default(),
            progress_callback: None,
        }
    }
}

impl CollapseConfigBuilder {
    /// Enables chronological backtracking (default) or restart-on-failure.
    pub fn use_backtracking(mut self, enabled: bool) -> Self {
        self.use_backtracking = enabled;
        self
    }

    /// Sets the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets how ties between lowest-entropy variables are broken.
    pub fn selection(mut self, selection: SelectionStrategy) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the progress callback function.
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn build(self) -> CollapseConfig {
        CollapseConfig {
            use_backtracking: self.use_backtracking,
            seed: self.seed,
            selection: self.selection,
            progress_callback: self.progress_callback,
        }
    }
}

/// Summary of a successful collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollapseStats {
    pub observations: u64,
    pub backtracks: u64,
    pub restarts: u64,
    pub propagation_steps: u64,
    pub elapsed_time: Duration,
}

/// One pause point of the steppable solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Initial consistency check done; `scheduled` variables queued for propagation.
    Initialized { scheduled: usize },
    /// One connection was relaxed.
    Propagated {
        source: WaveVariable,
        destination: WaveVariable,
        connection_type: ConnectionType,
        narrowed: bool,
    },
    /// A variable ran out of states.
    Contradiction { variable: WaveVariable },
    /// The last decision was undone and its pure state excluded.
    Backtracked {
        variable: WaveVariable,
        excluded: PureState,
        depth: usize,
    },
    /// The system was reset to its initial distribution.
    Restarted,
    /// A variable was collapsed to one pure state.
    Observed {
        variable: WaveVariable,
        state: PureState,
    },
    /// Every variable is resolved.
    Completed,
    /// The collapse failed; the error is available from the step iterator.
    Failed,
}

enum StepResult {
    Continue(Step),
    Done(Result<CollapseStats, WfcError>),
}

/// Per-run bookkeeping shared by both drivers.
#[derive(Debug)]
struct RunState {
    max_steps: u64,
    initialized: bool,
    inconsistent: bool,
    observations: u64,
    observations_since_reset: u64,
    backtracks: u64,
    restarts: u64,
    propagation_steps: u64,
    started: Instant,
}

impl RunState {
    fn new(max_steps: u64) -> Self {
        Self {
            max_steps,
            initialized: false,
            inconsistent: false,
            observations: 0,
            observations_since_reset: 0,
            backtracks: 0,
            restarts: 0,
            propagation_steps: 0,
            started: Instant::now(),
        }
    }

    fn stats(&self) -> CollapseStats {
        CollapseStats {
            observations: self.observations,
            backtracks: self.backtracks,
            restarts: self.restarts,
            propagation_steps: self.propagation_steps,
            elapsed_time: self.started.elapsed(),
        }
    }
}

/// The XWFC solver: observation, propagation and backtracking over one
/// [`WaveFunctionSystem`].
///
/// The eager [`collapse`](Self::collapse) and the steppable
/// [`collapse_coroutine`](Self::collapse_coroutine) drive the same step
/// function, so equal seeds give equal results in both modes.
#[derive(Debug)]
pub struct WaveFunctionCollapse<T: Topology, R: EntanglementRules> {
    system: WaveFunctionSystem<T, R>,
    config: CollapseConfig,
    rng: StdRng,
    checkpoints: Vec<Vec<SuperposedState>>,
    choices: Vec<(WaveVariable, PureState)>,
    frontier: Frontier,
}

impl<T: Topology, R: EntanglementRules> WaveFunctionCollapse<T, R> {
    pub fn new(system: WaveFunctionSystem<T, R>, config: CollapseConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            system,
            config,
            rng,
            checkpoints: Vec::new(),
            choices: Vec::new(),
            frontier: Frontier::new(),
        }
    }

    pub fn system(&self) -> &WaveFunctionSystem<T, R> {
        &self.system
    }

    /// Mutable access to the system, e.g. to pre-constrain variables before a run.
    pub fn system_mut(&mut self) -> &mut WaveFunctionSystem<T, R> {
        &mut self.system
    }

    pub fn into_system(self) -> WaveFunctionSystem<T, R> {
        self.system
    }

    pub fn config(&self) -> &CollapseConfig {
        &self.config
    }

    /// Decisions of the current run still on the choice stack, oldest first.
    pub fn choices(&self) -> &[(WaveVariable, PureState)] {
        &self.choices
    }

    /// Runs the solver to completion.
    ///
    /// The run starts from the system's current state; call
    /// [`WaveFunctionSystem::reset`] first to start over.
    ///
    /// # Arguments
    ///
    /// * `max_steps` - Maximum number of observations before giving up.
    ///
    /// # Returns
    ///
    /// * `Ok(CollapseStats)` once every variable holds exactly one pure state.
    /// * `Err(WfcError::Exhausted)` if no decision is left to undo (or restart from).
    /// * `Err(WfcError::StepLimitReached)` if `max_steps` observations did not suffice.
    /// * `Err(WfcError::Aborted)` if the progress callback failed.
    pub fn collapse(&mut self, max_steps: u64) -> Result<CollapseStats, WfcError> {
        info!(
            "Starting collapse of {} variables (max {} observations, backtracking: {})",
            self.system.variable_count(),
            max_steps,
            self.config.use_backtracking
        );
        let mut run = RunState::new(max_steps);
        loop {
            match self.step(&mut run) {
                StepResult::Continue(step) => trace!("{step:?}"),
                StepResult::Done(result) => {
                    log_outcome(&result);
                    return result;
                }
            }
        }
    }

    /// Returns an iterator that performs one solver step per `next()`.
    ///
    /// The iterator ends after yielding [`Step::Completed`] or [`Step::Failed`];
    /// the final result is then available from [`CollapseSteps::outcome`].
    pub fn collapse_coroutine(&mut self, max_steps: u64) -> CollapseSteps<'_, T, R> {
        info!(
            "Starting steppable collapse of {} variables (max {} observations)",
            self.system.variable_count(),
            max_steps
        );
        CollapseSteps {
            solver: self,
            run: RunState::new(max_steps),
            outcome: None,
        }
    }

    fn step(&mut self, run: &mut RunState) -> StepResult {
        if !run.initialized {
            run.initialized = true;
            self.checkpoints.clear();
            self.choices.clear();
            return StepResult::Continue(self.schedule_initial_propagation(run));
        }
        if run.inconsistent {
            return self.recover(run);
        }
        match propagate_step(&mut self.system, &mut self.frontier) {
            PropagationStep::Idle => self.observe(run),
            PropagationStep::Unchanged {
                source,
                destination,
                connection_type,
            } => {
                run.propagation_steps += 1;
                StepResult::Continue(Step::Propagated {
                    source,
                    destination,
                    connection_type,
                    narrowed: false,
                })
            }
            PropagationStep::Narrowed {
                source,
                destination,
                connection_type,
            } => {
                run.propagation_steps += 1;
                StepResult::Continue(Step::Propagated {
                    source,
                    destination,
                    connection_type,
                    narrowed: true,
                })
            }
            PropagationStep::Contradiction { destination, .. } => {
                run.propagation_steps += 1;
                run.inconsistent = true;
                debug!("Contradiction at {}", destination);
                StepResult::Continue(Step::Contradiction {
                    variable: destination,
                })
            }
        }
    }

    /// Checks for empty variables and queues every variable for propagation,
    /// so forced boundary states reach their neighbors before the first observation.
    fn schedule_initial_propagation(&mut self, run: &mut RunState) -> Step {
        self.frontier.clear();
        if let Some(empty) = self.system.variables().find(|&v| self.system.state(v).is_empty()) {
            warn!("Variable {} has no possible state before collapse", empty);
            run.inconsistent = true;
            return Step::Contradiction { variable: empty };
        }
        let variables: Vec<WaveVariable> = self.system.variables().collect();
        for &variable in variables.iter().rev() {
            self.frontier.push(variable);
        }
        Step::Initialized {
            scheduled: variables.len(),
        }
    }

    fn observe(&mut self, run: &mut RunState) -> StepResult {
        let Some(variable) =
            select_lowest_entropy(self.system.states(), self.config.selection, &mut self.rng)
        else {
            return StepResult::Done(Ok(run.stats()));
        };
        if run.observations >= run.max_steps {
            return StepResult::Done(Err(WfcError::StepLimitReached(run.max_steps)));
        }

        if self.config.use_backtracking {
            self.checkpoints.push(self.system.snapshot());
        }
        let Some(state) = self.system.state_mut(variable).observe(&mut self.rng) else {
            run.inconsistent = true;
            return StepResult::Continue(Step::Contradiction { variable });
        };
        self.choices.push((variable, state));
        self.frontier.push(variable);
        run.observations += 1;
        run.observations_since_reset += 1;
        debug!(
            "Observation {}: {} collapsed to {}",
            run.observations, variable, state
        );

        if let Err(e) = self.report_progress(run) {
            return StepResult::Done(Err(e));
        }
        StepResult::Continue(Step::Observed { variable, state })
    }

    fn recover(&mut self, run: &mut RunState) -> StepResult {
        run.inconsistent = false;
        if !self.config.use_backtracking {
            return self.restart(run);
        }
        loop {
            let (Some(snapshot), Some((variable, excluded))) =
                (self.checkpoints.pop(), self.choices.pop())
            else {
                return StepResult::Done(Err(WfcError::Exhausted {
                    observations: run.observations,
                    backtracks: run.backtracks,
                }));
            };
            if let Err(e) = self.system.restore(snapshot) {
                return StepResult::Done(Err(e));
            }
            run.backtracks += 1;
            let wave = self.system.state_mut(variable);
            wave.remove(excluded);
            if wave.is_empty() {
                debug!(
                    "Excluding {} emptied {}; backtracking further",
                    excluded, variable
                );
                continue;
            }
            debug!(
                "Backtracked to depth {}: excluded {} from {}",
                self.choices.len(),
                excluded,
                variable
            );
            self.frontier.push(variable);
            return StepResult::Continue(Step::Backtracked {
                variable,
                excluded,
                depth: self.choices.len(),
            });
        }
    }

    fn restart(&mut self, run: &mut RunState) -> StepResult {
        if run.observations_since_reset == 0 {
            // Contradiction without any decision: the initial state itself is unsatisfiable.
            return StepResult::Done(Err(WfcError::Exhausted {
                observations: run.observations,
                backtracks: run.backtracks,
            }));
        }
        if let Err(e) = self.system.reset() {
            return StepResult::Done(Err(e));
        }
        run.restarts += 1;
        run.observations_since_reset = 0;
        self.choices.clear();
        self.checkpoints.clear();
        debug!("Restart {} after {} observations", run.restarts, run.observations);
        match self.schedule_initial_propagation(run) {
            Step::Initialized { .. } => StepResult::Continue(Step::Restarted),
            other => StepResult::Continue(other),
        }
    }

    fn report_progress(&mut self, run: &RunState) -> Result<(), WfcError> {
        let Some(callback) = self.config.progress_callback.as_mut() else {
            return Ok(());
        };
        let info = ProgressInfo {
            observations: run.observations,
            resolved_variables: self.system.resolved_count(),
            total_variables: self.system.variable_count(),
            backtracks: run.backtracks,
            restarts: run.restarts,
            elapsed_time: run.started.elapsed(),
        };
        callback(&info).map_err(|e| match e {
            WfcError::Aborted(_) => e,
            other => WfcError::Aborted(other.to_string()),
        })
    }
}

fn log_outcome(result: &Result<CollapseStats, WfcError>) {
    match result {
        Ok(stats) => info!(
            "Collapse finished in {:?}: {} observations, {} backtracks, {} restarts",
            stats.elapsed_time, stats.observations, stats.backtracks, stats.restarts
        ),
        Err(e) => warn!("Collapse failed: {}", e),
    }
}

/// Steppable driver returned by [`WaveFunctionCollapse::collapse_coroutine`].
pub struct CollapseSteps<'a, T: Topology, R: EntanglementRules> {
    solver: &'a mut WaveFunctionCollapse<T, R>,
    run: RunState,
    outcome: Option<Result<CollapseStats, WfcError>>,
}

impl<'a, T: Topology, R: EntanglementRules> CollapseSteps<'a, T, R> {
    /// The system as of the last step, for inspection between steps.
    pub fn system(&self) -> &WaveFunctionSystem<T, R> {
        &self.solver.system
    }

    /// Number of observations performed so far.
    pub fn observations(&self) -> u64 {
        self.run.observations
    }

    /// The final result, once the iterator is exhausted.
    pub fn outcome(&self) -> Option<&Result<CollapseStats, WfcError>> {
        self.outcome.as_ref()
    }

    /// Drives the remaining steps and returns the final result.
    pub fn finish(mut self) -> Result<CollapseStats, WfcError> {
        for _ in self.by_ref() {}
        match self.outcome {
            Some(result) => result,
            // Unreachable: the iterator only ends after storing an outcome.
            None => Err(WfcError::InternalError(
                "steppable collapse ended without an outcome".to_owned(),
            )),
        }
    }
}

impl<'a, T: Topology, R: EntanglementRules> Iterator for CollapseSteps<'a, T, R> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.outcome.is_some() {
            return None;
        }
        match self.solver.step(&mut self.run) {
            StepResult::Continue(step) => Some(step),
            StepResult::Done(result) => {
                log_outcome(&result);
                let step = if result.is_ok() {
                    Step::Completed
                } else {
                    Step::Failed
                };
                self.outcome = Some(result);
                Some(step)
            }
        }
    }
}

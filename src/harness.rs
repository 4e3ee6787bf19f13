use std::hint::black_box;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::case::CaseDefinition;
use crate::context::RunContext;
use crate::error::CaseFailure;
use crate::result::TrialResult;

/// Bound on a single case's trials, on top of its target runtime.
pub const EXECUTION_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Target runtime of data-bound cases.
pub const STANDARD_RUNTIME: Duration = Duration::from_secs(60);
/// Target runtime of canary cases.
pub const MINIMUM_RUNTIME: Duration = Duration::from_secs(10);
/// Trial floor before a runtime-driven case may stop.
pub const MIN_ITERATIONS: usize = 100;

/// Upper bound on adaptively scaled iteration counts.
pub const MAX_ADAPTIVE_ITERS: u64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    Quick,
    Full,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Quick => "quick",
            Profile::Full => "full",
        }
    }
}

/// How the runner decides per-trial iteration counts and when a case is done.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// A fixed number of trials, each running the case's declared count.
    Fixed,
    /// Trials of the declared count until both the runtime and the trial floor are met.
    #[default]
    Runtime,
    /// Calibrate the per-trial count first, then run until the runtime and trial floor are met.
    Adaptive,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Fixed => "fixed",
            RunMode::Runtime => "runtime",
            RunMode::Adaptive => "adaptive",
        }
    }
}

/// What the runner does after a case records a failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and move on to the next case.
    #[default]
    Continue,
    /// Skip every remaining case.
    AbortOnFirst,
}

#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub profile: Profile,
    pub mode: RunMode,
    /// Trials per case in [`RunMode::Fixed`].
    pub trials: usize,
    /// Trial floor in the runtime-driven modes.
    pub min_trials: usize,
    /// Caps each case's declared runtime.
    pub runtime_cap: Option<Duration>,
    /// Per-case deadline, counted from the case's first trial.
    pub case_timeout: Duration,
    /// Optional deadline over the whole run.
    pub run_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
}

impl HarnessConfig {
    pub fn new(profile: Profile) -> Self {
        match profile {
            Profile::Quick => Self {
                profile,
                mode: RunMode::Runtime,
                trials: 10,
                min_trials: 5,
                runtime_cap: Some(Duration::from_secs(1)),
                case_timeout: EXECUTION_TIMEOUT,
                run_timeout: None,
                failure_policy: FailurePolicy::Continue,
            },
            Profile::Full => Self {
                profile,
                mode: RunMode::Runtime,
                trials: MIN_ITERATIONS,
                min_trials: MIN_ITERATIONS,
                runtime_cap: None,
                case_timeout: EXECUTION_TIMEOUT,
                run_timeout: None,
                failure_policy: FailurePolicy::Continue,
            },
        }
    }

    /// The runtime a case should aim for under this configuration.
    pub fn target_runtime(&self, case: &CaseDefinition) -> Duration {
        match self.runtime_cap {
            Some(cap) => case.runtime().min(cap),
            None => case.runtime(),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(Profile::Full)
    }
}

/// Accumulating stopwatch for a single trial.
#[derive(Clone, Debug, Default)]
pub struct TrialTimer {
    started: Option<Instant>,
    elapsed: Duration,
}

impl TrialTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    /// Discard accumulated time; a running timer restarts from now.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => self.elapsed + started.elapsed(),
            None => self.elapsed,
        }
    }
}

/// Run one timed trial of `case` with `iters` iterations.
///
/// Workload setup runs before the timer is reset, so only `run` is measured.
/// A failure from either phase is tagged with the case name and recorded on the
/// returned trial.
pub fn execute_trial(case: &CaseDefinition, ctx: &RunContext, iters: u64) -> TrialResult {
    let workload = case.workload();
    let fail = |source| CaseFailure {
        case: case.name().to_string(),
        source,
    };

    if let Err(e) = workload.setup(ctx) {
        return TrialResult::failed(Duration::ZERO, iters, fail(e));
    }

    let mut timer = TrialTimer::new();
    timer.reset();
    timer.start();
    let outcome = workload.run(ctx, black_box(iters));
    timer.stop();

    let elapsed = timer.elapsed();
    debug!(case = case.name(), iters, elapsed = ?elapsed, ok = outcome.is_ok(), "trial");

    match outcome {
        Ok(()) => TrialResult::success(elapsed, iters),
        Err(e) => TrialResult::failed(elapsed, iters, fail(e)),
    }
}

/// Next iteration count aimed at filling `goal`, given that `prev_iters` took
/// `prev_elapsed`.
///
/// Grows by at least one iteration and at most 100x per step, with 20% headroom
/// over the linear prediction.
pub fn predict_iters(goal: Duration, prev_iters: u64, prev_elapsed: Duration) -> u64 {
    let prev_iters = prev_iters.max(1);
    let prev_ns = prev_elapsed.as_nanos().max(1);
    let predicted = goal.as_nanos().saturating_mul(u128::from(prev_iters)) / prev_ns;
    let padded = predicted.saturating_add(predicted / 5);

    let ceiling = u128::from(prev_iters).saturating_mul(100);
    let floor = u128::from(prev_iters) + 1;
    let next = padded.min(ceiling).max(floor);

    u64::try_from(next)
        .unwrap_or(MAX_ADAPTIVE_ITERS)
        .min(MAX_ADAPTIVE_ITERS)
}

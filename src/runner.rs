//! Drives every registered case through the execution wrapper and collects
//! one frozen [`BenchResult`] per case.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::case::{CaseDefinition, Registry};
use crate::context::RunContext;
use crate::error::CaseFailure;
use crate::harness::{execute_trial, predict_iters, FailurePolicy, HarnessConfig, RunMode, MAX_ADAPTIVE_ITERS};
use crate::result::{BenchResult, BenchResultBuilder, TrialResult};
use crate::schema::CaseOutcome;

/// Results of a whole run, in registry order.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub results: Vec<BenchResult>,
    /// Cases never started because an earlier case failed under
    /// [`FailurePolicy::AbortOnFirst`].
    pub skipped: Vec<String>,
}

impl RunOutcome {
    pub fn has_errors(&self) -> bool {
        !self.skipped.is_empty() || self.results.iter().any(BenchResult::has_errors)
    }

    pub fn failed_cases(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.has_errors())
            .map(BenchResult::name)
            .collect()
    }

    pub fn outcomes(&self) -> Vec<CaseOutcome> {
        let mut out: Vec<CaseOutcome> = self.results.iter().map(CaseOutcome::from_result).collect();
        out.extend(self.skipped.iter().map(|name| CaseOutcome::skipped(name)));
        out
    }
}

pub struct Runner<'a> {
    registry: &'a Registry,
    config: &'a HarnessConfig,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a Registry, config: &'a HarnessConfig) -> Self {
        Self { registry, config }
    }

    /// Run every case in order. Each case gets its own timeout; the optional run
    /// timeout bounds them all.
    pub fn run(&self, ctx: &RunContext) -> RunOutcome {
        let ctx = match self.config.run_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.clone(),
        };
        let mut outcome = RunOutcome::default();

        info!(
            cases = self.registry.len(),
            mode = self.config.mode.as_str(),
            profile = self.config.profile.as_str(),
            case_timeout = ?self.config.case_timeout,
            run_deadline_in = ?ctx.deadline().map(|d| d.saturating_duration_since(Instant::now())),
            "starting run"
        );

        for case in self.registry {
            if self.config.failure_policy == FailurePolicy::AbortOnFirst && outcome.has_errors() {
                outcome.skipped.push(case.name().to_string());
                continue;
            }

            info!("=== RUN {}", case.name());
            let case_ctx = ctx.with_timeout(self.config.case_timeout);
            let result = self.run_case(case, &case_ctx);

            match result.first_error() {
                Some(err) => warn!(case = result.name(), error = %err, "--- FAIL {}", result),
                None => info!("--- PASS {}", result),
            }
            outcome.results.push(result);
        }

        if !outcome.skipped.is_empty() {
            warn!(skipped = outcome.skipped.len(), "aborted after first failing case");
        }
        outcome
    }

    /// Collect trials for a single case according to the configured mode.
    pub fn run_case(&self, case: &CaseDefinition, ctx: &RunContext) -> BenchResult {
        let runtime = self.config.target_runtime(case);
        let min_trials = self.config.min_trials.max(1);

        match self.config.mode {
            RunMode::Fixed => {
                let trials = self.config.trials.max(1);
                self.collect(case, ctx, case.count(), |done, _| done >= trials)
            }
            RunMode::Runtime => self.collect(case, ctx, case.count(), |done, elapsed| {
                elapsed >= runtime && done >= min_trials
            }),
            RunMode::Adaptive => {
                let divisor = u32::try_from(min_trials).unwrap_or(u32::MAX);
                let goal = (runtime / divisor).max(Duration::from_millis(1));
                match self.calibrate(case, ctx, goal) {
                    Ok(iters) => self.collect(case, ctx, iters, |done, elapsed| {
                        elapsed >= runtime && done >= min_trials
                    }),
                    Err(failed) => {
                        let iters = failed.iterations;
                        let mut builder = BenchResultBuilder::new(
                            case.name(),
                            iters,
                            scaled_size(case, iters),
                        );
                        builder.push(failed);
                        builder.finish()
                    }
                }
            }
        }
    }

    fn collect(
        &self,
        case: &CaseDefinition,
        ctx: &RunContext,
        iters: u64,
        finished: impl Fn(usize, Duration) -> bool,
    ) -> BenchResult {
        let mut builder = BenchResultBuilder::new(case.name(), iters, scaled_size(case, iters));
        let started = Instant::now();

        loop {
            if let Err(trial) = interrupted(case, ctx, iters) {
                builder.push(trial);
                break;
            }

            let trial = execute_trial(case, ctx, iters);
            let failed = !trial.is_ok();
            builder.push(trial);

            if failed || finished(builder.len(), started.elapsed()) {
                break;
            }
        }

        builder.finish()
    }

    /// Grow the per-trial iteration count until one trial lasts at least `goal`.
    /// Calibration trials are not recorded; a failing one is returned as the error.
    fn calibrate(&self, case: &CaseDefinition, ctx: &RunContext, goal: Duration) -> Result<u64, TrialResult> {
        let mut iters = 1;
        loop {
            interrupted(case, ctx, iters)?;

            let trial = execute_trial(case, ctx, iters);
            if !trial.is_ok() {
                return Err(trial);
            }
            if trial.duration >= goal || iters >= MAX_ADAPTIVE_ITERS {
                info!(case = case.name(), iters, "calibrated");
                return Ok(iters);
            }
            iters = predict_iters(goal, iters, trial.duration);
        }
    }
}

fn interrupted(case: &CaseDefinition, ctx: &RunContext, iters: u64) -> Result<(), TrialResult> {
    ctx.check().map_err(|source| {
        TrialResult::failed(
            Duration::ZERO,
            iters,
            CaseFailure {
                case: case.name().to_string(),
                source,
            },
        )
    })
}

/// Declared payload size scaled from the case's declared count to `iters`.
pub fn scaled_size(case: &CaseDefinition, iters: u64) -> i64 {
    let size = case.raw_size();
    if size <= 0 || iters == case.count() {
        return size;
    }
    let scaled = i128::from(size) * i128::from(iters) / i128::from(case.count());
    i64::try_from(scaled).unwrap_or(i64::MAX)
}

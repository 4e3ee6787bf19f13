//! Per-trial results and the frozen per-case aggregate.

use std::fmt;
use std::time::Duration;

use crate::error::CaseFailure;

/// Outcome of one timed trial.
#[derive(Debug)]
pub struct TrialResult {
    pub duration: Duration,
    pub iterations: u64,
    pub error: Option<CaseFailure>,
}

impl TrialResult {
    pub fn success(duration: Duration, iterations: u64) -> Self {
        Self {
            duration,
            iterations,
            error: None,
        }
    }

    pub fn failed(duration: Duration, iterations: u64, error: CaseFailure) -> Self {
        Self {
            duration,
            iterations,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Accumulates trials for one case in execution order.
#[derive(Debug)]
pub struct BenchResultBuilder {
    name: String,
    operations: u64,
    data_size: i64,
    raw: Vec<TrialResult>,
}

impl BenchResultBuilder {
    pub fn new(name: impl Into<String>, operations: u64, data_size: i64) -> Self {
        Self {
            name: name.into(),
            operations,
            data_size,
            raw: Vec::new(),
        }
    }

    pub fn push(&mut self, trial: TrialResult) {
        self.raw.push(trial);
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Most recent trial, if any.
    pub fn last(&self) -> Option<&TrialResult> {
        self.raw.last()
    }

    /// Freeze the collected trials; no trial can be added afterwards.
    pub fn finish(self) -> BenchResult {
        BenchResult::new(self.name, self.operations, self.data_size, self.raw)
    }
}

/// All trials of one named case.
///
/// Built frozen: the trial list cannot change after construction, so the error
/// flag computed here always describes it.
#[derive(Debug)]
pub struct BenchResult {
    name: String,
    trials: usize,
    duration: Duration,
    raw: Vec<TrialResult>,
    data_size: i64,
    operations: u64,
    has_errors: bool,
}

impl BenchResult {
    /// `operations` is the declared operation count per trial; `data_size` is the
    /// declared payload bytes per trial, `<= 0` when not data bound.
    pub fn new(name: impl Into<String>, operations: u64, data_size: i64, raw: Vec<TrialResult>) -> Self {
        let duration = raw.iter().map(|r| r.duration).sum();
        let has_errors = raw.iter().any(|r| r.error.is_some());
        Self {
            name: name.into(),
            trials: raw.len(),
            duration,
            raw,
            data_size,
            operations,
            has_errors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Total time spent inside timed trials.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn raw(&self) -> &[TrialResult] {
        &self.raw
    }

    pub fn data_size(&self) -> i64 {
        self.data_size
    }

    pub fn operations(&self) -> u64 {
        self.operations
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// First failure recorded, in trial order.
    pub fn first_error(&self) -> Option<&CaseFailure> {
        self.raw.iter().find_map(|r| r.error.as_ref())
    }

    /// Durations of successful trials in seconds, in trial order.
    ///
    /// Zero-length trials are left out: no throughput can be derived from them.
    pub fn timings(&self) -> Vec<f64> {
        self.raw
            .iter()
            .filter(|r| r.is_ok() && !r.duration.is_zero())
            .map(|r| r.duration.as_secs_f64())
            .collect()
    }
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={}, trials={}, secs={:?}",
            self.name, self.trials, self.duration
        )
    }
}

//! Case definitions and the ordered case registry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::context::RunContext;
use crate::error::WorkloadError;

/// A unit of work the harness can time.
///
/// `setup` runs before the trial timer starts and may be called once per trial;
/// implementations should make repeated calls cheap. `run` must execute exactly
/// `iters` logical operations and return promptly once `ctx` is done.
pub trait Workload: Send + Sync {
    fn name(&self) -> &str;

    fn setup(&self, _ctx: &RunContext) -> Result<(), WorkloadError> {
        Ok(())
    }

    fn run(&self, ctx: &RunContext, iters: u64) -> Result<(), WorkloadError>;
}

/// Adapts a plain function or closure into a [`Workload`].
pub struct FnWorkload<F> {
    name: String,
    func: F,
}

impl<F> FnWorkload<F>
where
    F: Fn(&RunContext, u64) -> Result<(), WorkloadError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Workload for FnWorkload<F>
where
    F: Fn(&RunContext, u64) -> Result<(), WorkloadError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &RunContext, iters: u64) -> Result<(), WorkloadError> {
        (self.func)(ctx, iters)
    }
}

/// A registered workload together with its expected scale.
#[derive(Clone)]
pub struct CaseDefinition {
    workload: Arc<dyn Workload>,
    count: u64,
    size: i64,
    runtime: Duration,
}

impl CaseDefinition {
    /// Bind `workload` to its scale metadata.
    ///
    /// `size <= 0` marks the case as not data-volume bound.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero; a case must perform at least one operation.
    pub fn new(workload: Arc<dyn Workload>, count: u64, size: i64, runtime: Duration) -> Self {
        assert!(
            count >= 1,
            "case '{}' must declare at least one operation",
            workload.name()
        );
        Self {
            workload,
            count,
            size,
            runtime,
        }
    }

    pub fn name(&self) -> &str {
        self.workload.name()
    }

    pub fn workload(&self) -> &dyn Workload {
        self.workload.as_ref()
    }

    /// Declared operations per trial.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Declared payload size as given at registration, sentinel included.
    pub fn raw_size(&self) -> i64 {
        self.size
    }

    /// Declared payload bytes per trial, or `None` when the case is not data bound.
    pub fn data_size(&self) -> Option<u64> {
        u64::try_from(self.size).ok().filter(|&s| s > 0)
    }

    pub fn runtime(&self) -> Duration {
        self.runtime
    }
}

impl fmt::Debug for CaseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseDefinition")
            .field("name", &self.name())
            .field("count", &self.count)
            .field("size", &self.size)
            .field("runtime", &self.runtime)
            .finish()
    }
}

/// Immutable, ordered set of cases handed to the runner.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    cases: Vec<CaseDefinition>,
}

impl Registry {
    pub fn new(cases: Vec<CaseDefinition>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[CaseDefinition] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Keep only the cases whose name contains `pattern`, preserving order.
    pub fn filter(&self, pattern: &str) -> Registry {
        Registry {
            cases: self
                .cases
                .iter()
                .filter(|c| c.name().contains(pattern))
                .cloned()
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CaseDefinition> {
        self.cases.iter().find(|c| c.name() == name)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a CaseDefinition;
    type IntoIter = std::slice::Iter<'a, CaseDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

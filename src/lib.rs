//! Workload benchmarking harness.
//!
//! Named cases run through a timed execution wrapper, trials are reduced to
//! median/min/max throughput, and the results are rendered in the Evergreen
//! perf format.

pub mod case;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod report;
pub mod result;
pub mod runner;
pub mod schema;
pub mod source;
pub mod stats;
pub mod workloads;

pub use case::{CaseDefinition, FnWorkload, Registry, Workload};
pub use context::RunContext;
pub use error::{CaseFailure, ReportError, StatsError, WorkloadError};
pub use harness::{FailurePolicy, HarnessConfig, Profile, RunMode};
pub use report::{render_all, ReportFormat};
pub use result::{BenchResult, TrialResult};
pub use runner::{RunOutcome, Runner};

use serde::{Deserialize, Serialize};

use crate::result::BenchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub profile: String,
    pub mode: String,
    pub report_format: String,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

/// Per-case status, independent of whether a perf report could be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub trials: usize,
    pub seconds: f64,
    pub has_errors: bool,
    pub skipped: bool,
    pub error: Option<String>,
}

impl CaseOutcome {
    pub fn from_result(result: &BenchResult) -> Self {
        Self {
            name: result.name().to_string(),
            trials: result.trials(),
            seconds: result.duration().as_secs_f64(),
            has_errors: result.has_errors(),
            skipped: false,
            error: result.first_error().map(|e| e.to_string()),
        }
    }

    pub fn skipped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            trials: 0,
            seconds: 0.0,
            has_errors: false,
            skipped: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run: RunMeta,
    pub cases: Vec<CaseOutcome>,
    /// Cases whose perf report could not be rendered.
    pub report_failures: Vec<String>,
}

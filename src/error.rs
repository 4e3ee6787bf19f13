//! Error types for the harness.
//!
//! Workload failures stay attached to the trial that produced them; statistics
//! and report errors are scoped to a single case so one bad case never takes the
//! whole run down.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure returned by a workload, including failures of its own setup.
#[derive(Error, Debug)]
pub enum WorkloadError {
    /// The run was cancelled while the workload was executing.
    #[error("workload cancelled")]
    Cancelled,

    /// The run-level execution timeout elapsed.
    #[error("execution deadline exceeded")]
    DeadlineExceeded,

    /// A fixture file could not be read.
    #[error("failed to load fixture {}: {source}", path.display())]
    Fixture {
        /// Path of the fixture that failed to load
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// A fixture was read but does not have the expected shape.
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),

    /// Encoding produced an error or an empty output.
    #[error("encoding error: {0}")]
    Encode(String),

    /// Decoding produced an error or an unexpected document.
    #[error("decoding error: {0}")]
    Decode(String),

    /// `run` was called before `setup` succeeded.
    #[error("workload '{0}' was not prepared")]
    NotPrepared(String),

    /// Any other workload-specific failure.
    #[error("{0}")]
    Other(String),
}

impl WorkloadError {
    /// Whether the failure came from run-level cancellation rather than the workload itself.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WorkloadError::Cancelled | WorkloadError::DeadlineExceeded)
    }
}

impl From<SourceError> for WorkloadError {
    fn from(err: SourceError) -> Self {
        WorkloadError::Decode(err.to_string())
    }
}

/// A workload failure tagged with the case that produced it.
#[derive(Error, Debug)]
#[error("case='{case}': {source}")]
pub struct CaseFailure {
    /// Name of the failing case
    pub case: String,
    /// The workload's failure
    #[source]
    pub source: WorkloadError,
}

/// Statistics were requested over an unusable input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// No durations to reduce.
    #[error("cannot compute statistics over an empty sample")]
    EmptyInput,
}

/// Failure rendering a case into a report schema.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Statistics for the case could not be computed.
    #[error("statistics for case '{case}' unavailable: {source}")]
    Statistics {
        /// Case name
        case: String,
        /// Underlying statistics error
        #[source]
        source: StatsError,
    },

    /// The rendered report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure converting a [`crate::source::DocumentSource`] into a document.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Reading a streaming source failed.
    #[error("failed to read document stream: {0}")]
    Io(#[from] io::Error),

    /// The bytes are not a valid document.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The input decoded to something other than a document.
    #[error("cannot convert {0} to a document")]
    NotADocument(&'static str),
}

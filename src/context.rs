//! Cancellation context handed to every workload invocation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::WorkloadError;

/// Cloneable run context carrying a shared cancel flag and an optional deadline.
///
/// Clones share the cancel flag, so cancelling any clone cancels them all.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl RunContext {
    /// A context that never expires on its own.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires after `timeout`, keeping the parent's
    /// deadline when it is earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(parent), Some(child)) => Some(parent.min(child)),
            (parent, None) => parent,
            (None, child) => child,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns the error a workload should surface if it must stop now.
    pub fn check(&self) -> Result<(), WorkloadError> {
        if self.is_cancelled() {
            return Err(WorkloadError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(WorkloadError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

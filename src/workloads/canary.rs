use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use super::checkpoint;
use crate::case::Workload;
use crate::context::RunContext;
use crate::error::WorkloadError;

static GLOBAL_CANARY_COUNT: AtomicU64 = AtomicU64::new(0);

/// Increments a local counter; measures harness overhead alone.
#[derive(Debug, Default)]
pub struct CanaryInc;

impl Workload for CanaryInc {
    fn name(&self) -> &str {
        "canary_inc"
    }

    fn run(&self, ctx: &RunContext, iters: u64) -> Result<(), WorkloadError> {
        let mut count = 0u64;
        for i in 0..iters {
            checkpoint(ctx, i)?;
            count = black_box(count + 1);
        }
        if count != iters {
            return Err(WorkloadError::Other(format!(
                "canary counted {count}, expected {iters}"
            )));
        }
        Ok(())
    }
}

/// Increments a process-wide counter from the rayon pool, so the measurement
/// includes contention on shared state.
#[derive(Debug, Default)]
pub struct GlobalCanaryInc;

impl GlobalCanaryInc {
    /// Total increments performed by every instance in this process.
    pub fn count() -> u64 {
        GLOBAL_CANARY_COUNT.load(Ordering::Relaxed)
    }
}

impl Workload for GlobalCanaryInc {
    fn name(&self) -> &str {
        "global_canary_inc"
    }

    fn run(&self, ctx: &RunContext, iters: u64) -> Result<(), WorkloadError> {
        (0..iters).into_par_iter().try_for_each(|i| {
            checkpoint(ctx, i)?;
            GLOBAL_CANARY_COUNT.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }
}

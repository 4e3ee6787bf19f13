//! Concrete workloads and the standard case table.

pub mod canary;
pub mod document;
pub mod record;

use std::path::Path;
use std::sync::Arc;

use crate::case::{CaseDefinition, Registry, Workload};
use crate::context::RunContext;
use crate::error::WorkloadError;
use crate::harness::{MINIMUM_RUNTIME, STANDARD_RUNTIME};

use canary::{CanaryInc, GlobalCanaryInc};
use document::{DocOp, DocumentWorkload, Shape};
use record::{FlatStruct, FlatStructTags, RecordOp, RecordWorkload};

/// Iterations between cancellation checks inside a workload loop.
pub const CHECK_INTERVAL: u64 = 256;

pub(crate) fn checkpoint(ctx: &RunContext, i: u64) -> Result<(), WorkloadError> {
    if i % CHECK_INTERVAL == 0 {
        ctx.check()?;
    }
    Ok(())
}

const HUNDRED: u64 = 100;
const TEN_THOUSAND: u64 = 100 * HUNDRED;

/// Declared bytes processed by 10k operations over each fixture.
const FLAT_SIZE: i64 = 75_310_000;
const DEEP_SIZE: i64 = 19_640_000;

/// The standard cases, in run order, reading fixtures from `data_dir`.
pub fn standard_registry(data_dir: &Path) -> Registry {
    let canary = |w: Arc<dyn Workload>| CaseDefinition::new(w, HUNDRED, -1, MINIMUM_RUNTIME);
    let doc = |shape: Shape, op: DocOp| {
        let size = match shape {
            Shape::Flat => FLAT_SIZE,
            Shape::Deep => DEEP_SIZE,
        };
        CaseDefinition::new(
            Arc::new(DocumentWorkload::new(shape, op, data_dir)),
            TEN_THOUSAND,
            size,
            STANDARD_RUNTIME,
        )
    };
    let record = |w: Arc<dyn Workload>| CaseDefinition::new(w, TEN_THOUSAND, FLAT_SIZE, STANDARD_RUNTIME);

    Registry::new(vec![
        canary(Arc::new(CanaryInc)),
        canary(Arc::new(GlobalCanaryInc)),
        doc(Shape::Flat, DocOp::Encode),
        doc(Shape::Flat, DocOp::DecodeLazy),
        doc(Shape::Flat, DocOp::Decode),
        doc(Shape::Deep, DocOp::Encode),
        doc(Shape::Deep, DocOp::DecodeLazy),
        doc(Shape::Deep, DocOp::Decode),
        doc(Shape::Flat, DocOp::ReaderDecode),
        doc(Shape::Deep, DocOp::ReaderDecode),
        doc(Shape::Flat, DocOp::MapDecode),
        doc(Shape::Deep, DocOp::MapDecode),
        record(Arc::new(RecordWorkload::<FlatStruct>::new(RecordOp::Decode, data_dir))),
        record(Arc::new(RecordWorkload::<FlatStructTags>::new(RecordOp::Decode, data_dir))),
        record(Arc::new(RecordWorkload::<FlatStruct>::new(RecordOp::Encode, data_dir))),
        record(Arc::new(RecordWorkload::<FlatStructTags>::new(RecordOp::Encode, data_dir))),
    ])
}

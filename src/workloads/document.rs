use std::collections::BTreeMap;
use std::hint::black_box;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::de::IgnoredAny;
use serde_json::Value;

use super::checkpoint;
use crate::case::Workload;
use crate::context::RunContext;
use crate::error::WorkloadError;
use crate::fixtures::{self, DEEP_FIXTURE, FLAT_FIXTURE, FLAT_FIELD_COUNT};
use crate::source::{Document, DocumentSource};

/// Which fixture a workload runs over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Flat,
    Deep,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Flat => "flat",
            Shape::Deep => "deep",
        }
    }

    pub fn fixture_file(&self) -> &'static str {
        match self {
            Shape::Flat => FLAT_FIXTURE,
            Shape::Deep => DEEP_FIXTURE,
        }
    }

    /// Load the fixture for this shape from `data_dir` and check its layout.
    pub fn load(&self, data_dir: &Path) -> Result<Document, WorkloadError> {
        let doc = fixtures::load_fixture(&data_dir.join(self.fixture_file()))?;
        match self {
            Shape::Flat if doc.len() != FLAT_FIELD_COUNT => Err(WorkloadError::InvalidFixture(
                format!(
                    "bson parsing error: flat fixture has {} fields, expected {FLAT_FIELD_COUNT}",
                    doc.len()
                ),
            )),
            Shape::Deep if fixtures::depth(&doc) < 2 => Err(WorkloadError::InvalidFixture(
                "bson parsing error: deep fixture has no nested documents".to_string(),
            )),
            _ => Ok(doc),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocOp {
    /// Serialize the parsed document.
    Encode,
    /// Validate the raw bytes without building a document.
    DecodeLazy,
    /// Parse the raw bytes into a document.
    Decode,
    /// Parse through a streaming source.
    ReaderDecode,
    /// Parse into a sorted map.
    MapDecode,
}

impl DocOp {
    fn suffix(&self) -> &'static str {
        match self {
            DocOp::Encode => "document_encoding",
            DocOp::DecodeLazy => "document_decoding_lazy",
            DocOp::Decode => "document_decoding",
            DocOp::ReaderDecode => "reader_decoding",
            DocOp::MapDecode => "map_decoding",
        }
    }
}

struct Prepared {
    doc: Document,
    bytes: Arc<[u8]>,
}

/// Encodes or decodes a fixture document `iters` times per trial.
pub struct DocumentWorkload {
    name: String,
    shape: Shape,
    op: DocOp,
    data_dir: PathBuf,
    prepared: OnceLock<Prepared>,
}

impl DocumentWorkload {
    pub fn new(shape: Shape, op: DocOp, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: format!("bson_{}_{}", shape.as_str(), op.suffix()),
            shape,
            op,
            data_dir: data_dir.into(),
            prepared: OnceLock::new(),
        }
    }

    fn prepared(&self) -> Result<&Prepared, WorkloadError> {
        self.prepared
            .get()
            .ok_or_else(|| WorkloadError::NotPrepared(self.name.clone()))
    }

    fn check_len(&self, got: usize, expected: usize) -> Result<(), WorkloadError> {
        if got != expected {
            return Err(WorkloadError::Decode(format!(
                "decoded {got} fields, expected {expected}"
            )));
        }
        Ok(())
    }
}

impl Workload for DocumentWorkload {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, _ctx: &RunContext) -> Result<(), WorkloadError> {
        if self.prepared.get().is_some() {
            return Ok(());
        }
        let doc = self.shape.load(&self.data_dir)?;
        let bytes = serde_json::to_vec(&doc).map_err(|e| WorkloadError::Encode(e.to_string()))?;
        // A concurrent setup may have won; either value is identical.
        let _ = self.prepared.set(Prepared {
            doc,
            bytes: bytes.into(),
        });
        Ok(())
    }

    fn run(&self, ctx: &RunContext, iters: u64) -> Result<(), WorkloadError> {
        let prepared = self.prepared()?;
        let expected = prepared.doc.len();

        for i in 0..iters {
            checkpoint(ctx, i)?;
            match self.op {
                DocOp::Encode => {
                    let out = serde_json::to_vec(black_box(&prepared.doc))
                        .map_err(|e| WorkloadError::Encode(e.to_string()))?;
                    if out.is_empty() {
                        return Err(WorkloadError::Encode("marshaling error".to_string()));
                    }
                    black_box(out);
                }
                DocOp::DecodeLazy => {
                    let _: IgnoredAny = serde_json::from_slice(black_box(&prepared.bytes[..]))
                        .map_err(|e| WorkloadError::Decode(e.to_string()))?;
                }
                DocOp::Decode => {
                    let doc: Document = serde_json::from_slice(black_box(&prepared.bytes[..]))
                        .map_err(|e| WorkloadError::Decode(e.to_string()))?;
                    self.check_len(doc.len(), expected)?;
                    black_box(doc);
                }
                DocOp::ReaderDecode => {
                    let stream = Cursor::new(Arc::clone(&prepared.bytes));
                    let doc = DocumentSource::Stream(Box::new(stream)).into_document()?;
                    self.check_len(doc.len(), expected)?;
                    black_box(doc);
                }
                DocOp::MapDecode => {
                    let map: BTreeMap<String, Value> =
                        serde_json::from_slice(black_box(&prepared.bytes[..]))
                            .map_err(|e| WorkloadError::Decode(e.to_string()))?;
                    self.check_len(map.len(), expected)?;
                    black_box(map);
                }
            }
        }
        Ok(())
    }
}

use std::hint::black_box;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::checkpoint;
use super::document::Shape;
use crate::case::Workload;
use crate::context::RunContext;
use crate::error::WorkloadError;
use crate::source::Document;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i64),
    Double(f64),
    Text(String),
    Flag(bool),
    Null,
}

impl FieldValue {
    fn from_value(key: &str, value: &Value) -> Result<Self, WorkloadError> {
        match value {
            Value::Null => Ok(FieldValue::Null),
            Value::Bool(b) => Ok(FieldValue::Flag(*b)),
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .or_else(|| n.as_f64().map(FieldValue::Double))
                .ok_or_else(|| WorkloadError::InvalidFixture(format!("field '{key}': unsupported number {n}"))),
            Value::Array(_) | Value::Object(_) => Err(WorkloadError::InvalidFixture(format!(
                "field '{key}' is not a scalar"
            ))),
        }
    }
}

/// A flat document with typed fields.
pub trait FlatRecord: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Workload name fragment.
    const KIND: &'static str;

    fn from_document(doc: &Document) -> Result<Self, WorkloadError>;

    fn field_count(&self) -> usize;
}

/// Fields stored positionally as `(key, value)` pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatStruct {
    pub fields: Vec<(String, FieldValue)>,
}

impl FlatRecord for FlatStruct {
    const KIND: &'static str = "struct";

    fn from_document(doc: &Document) -> Result<Self, WorkloadError> {
        let fields = doc
            .iter()
            .map(|(k, v)| Ok((k.clone(), FieldValue::from_value(k, v)?)))
            .collect::<Result<_, WorkloadError>>()?;
        Ok(Self { fields })
    }

    fn field_count(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedField {
    #[serde(rename = "k")]
    pub key: String,
    #[serde(rename = "v")]
    pub value: FieldValue,
}

/// Fields carried with explicit serialization tags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatStructTags {
    #[serde(rename = "f")]
    pub fields: Vec<TaggedField>,
}

impl FlatRecord for FlatStructTags {
    const KIND: &'static str = "struct_tags";

    fn from_document(doc: &Document) -> Result<Self, WorkloadError> {
        let fields = doc
            .iter()
            .map(|(k, v)| {
                Ok(TaggedField {
                    key: k.clone(),
                    value: FieldValue::from_value(k, v)?,
                })
            })
            .collect::<Result<_, WorkloadError>>()?;
        Ok(Self { fields })
    }

    fn field_count(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOp {
    Encode,
    Decode,
}

struct Prepared<R> {
    record: R,
    bytes: Vec<u8>,
}

/// Round-trips the flat fixture through a typed record with bincode.
pub struct RecordWorkload<R> {
    name: String,
    op: RecordOp,
    data_dir: PathBuf,
    prepared: OnceLock<Prepared<R>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: FlatRecord> RecordWorkload<R> {
    pub fn new(op: RecordOp, data_dir: impl Into<PathBuf>) -> Self {
        let verb = match op {
            RecordOp::Encode => "encoding",
            RecordOp::Decode => "decoding",
        };
        Self {
            name: format!("bson_flat_{}_{verb}", R::KIND),
            op,
            data_dir: data_dir.into(),
            prepared: OnceLock::new(),
            _record: PhantomData,
        }
    }
}

impl<R: FlatRecord> Workload for RecordWorkload<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, _ctx: &RunContext) -> Result<(), WorkloadError> {
        if self.prepared.get().is_some() {
            return Ok(());
        }
        let doc = Shape::Flat.load(&self.data_dir)?;
        let record = R::from_document(&doc)?;
        let bytes = bincode::serialize(&record).map_err(|e| WorkloadError::Encode(e.to_string()))?;
        let _ = self.prepared.set(Prepared { record, bytes });
        Ok(())
    }

    fn run(&self, ctx: &RunContext, iters: u64) -> Result<(), WorkloadError> {
        let prepared = self
            .prepared
            .get()
            .ok_or_else(|| WorkloadError::NotPrepared(self.name.clone()))?;
        let expected = prepared.record.field_count();

        for i in 0..iters {
            checkpoint(ctx, i)?;
            match self.op {
                RecordOp::Encode => {
                    let out = bincode::serialize(black_box(&prepared.record))
                        .map_err(|e| WorkloadError::Encode(e.to_string()))?;
                    if out.is_empty() {
                        return Err(WorkloadError::Encode("marshaling error".to_string()));
                    }
                    black_box(out);
                }
                RecordOp::Decode => {
                    let record: R = bincode::deserialize(black_box(&prepared.bytes[..]))
                        .map_err(|e| WorkloadError::Decode(e.to_string()))?;
                    if record.field_count() != expected {
                        return Err(WorkloadError::Decode(format!(
                            "decoded {} fields, expected {expected}",
                            record.field_count()
                        )));
                    }
                    black_box(record);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{generate_flat, write_fixtures, GenerateConfig};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn names_carry_record_kind() {
        let w = RecordWorkload::<FlatStruct>::new(RecordOp::Decode, "unused");
        assert_eq!(w.name(), "bson_flat_struct_decoding");
        let w = RecordWorkload::<FlatStructTags>::new(RecordOp::Encode, "unused");
        assert_eq!(w.name(), "bson_flat_struct_tags_encoding");
    }

    #[test]
    fn records_mirror_the_document() {
        let doc = generate_flat(&GenerateConfig::default());
        let plain = FlatStruct::from_document(&doc).unwrap();
        let tagged = FlatStructTags::from_document(&doc).unwrap();
        assert_eq!(plain.field_count(), doc.len());
        assert_eq!(tagged.field_count(), doc.len());

        let bytes = bincode::serialize(&plain).unwrap();
        let back: FlatStruct = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, plain);
    }

    #[test]
    fn nested_fields_are_rejected() {
        let doc = json!({"outer": {"inner": 1}});
        let doc = doc.as_object().unwrap();
        assert!(matches!(
            FlatStruct::from_document(doc),
            Err(WorkloadError::InvalidFixture(_))
        ));
    }

    #[test]
    fn encode_and_decode_run() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path(), &GenerateConfig::default()).unwrap();
        let ctx = RunContext::background();

        let encode = RecordWorkload::<FlatStruct>::new(RecordOp::Encode, dir.path());
        encode.setup(&ctx).unwrap();
        encode.run(&ctx, 50).unwrap();

        let decode = RecordWorkload::<FlatStructTags>::new(RecordOp::Decode, dir.path());
        decode.setup(&ctx).unwrap();
        decode.run(&ctx, 50).unwrap();
    }
}

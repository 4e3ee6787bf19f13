//! Inputs a workload can turn into a document.
//!
//! The set of accepted shapes is closed: raw bytes, an already structured
//! record, or a stream that yields exactly one document.

use std::fmt;
use std::io::Read;

use serde_json::{Map, Value};

use crate::error::SourceError;

/// A decoded document: an ordered map of top-level fields.
pub type Document = Map<String, Value>;

pub enum DocumentSource {
    Bytes(Vec<u8>),
    Record(Value),
    Stream(Box<dyn Read + Send>),
}

impl DocumentSource {
    /// Convert the source into a document.
    ///
    /// Empty byte input yields an empty document. A stream is read to its end
    /// and must contain a single document.
    pub fn into_document(self) -> Result<Document, SourceError> {
        match self {
            DocumentSource::Bytes(bytes) if bytes.is_empty() => Ok(Document::new()),
            DocumentSource::Bytes(bytes) => expect_document(serde_json::from_slice(&bytes)?),
            DocumentSource::Record(value) => expect_document(value),
            DocumentSource::Stream(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                expect_document(serde_json::from_slice(&bytes)?)
            }
        }
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            DocumentSource::Record(value) => f.debug_tuple("Record").field(value).finish(),
            DocumentSource::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Vec<u8>> for DocumentSource {
    fn from(bytes: Vec<u8>) -> Self {
        DocumentSource::Bytes(bytes)
    }
}

impl From<Value> for DocumentSource {
    fn from(value: Value) -> Self {
        DocumentSource::Record(value)
    }
}

fn expect_document(value: Value) -> Result<Document, SourceError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Err(SourceError::NotADocument("null")),
        Value::Bool(_) => Err(SourceError::NotADocument("bool")),
        Value::Number(_) => Err(SourceError::NotADocument("number")),
        Value::String(_) => Err(SourceError::NotADocument("string")),
        Value::Array(_) => Err(SourceError::NotADocument("array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn empty_bytes_are_an_empty_document() {
        let doc = DocumentSource::Bytes(Vec::new()).into_document().unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn all_shapes_decode_to_the_same_document() {
        let value = json!({"a": 1, "b": "two"});
        let bytes = serde_json::to_vec(&value).unwrap();

        let from_bytes = DocumentSource::from(bytes.clone()).into_document().unwrap();
        let from_record = DocumentSource::from(value).into_document().unwrap();
        let from_stream = DocumentSource::Stream(Box::new(Cursor::new(bytes)))
            .into_document()
            .unwrap();

        assert_eq!(from_bytes, from_record);
        assert_eq!(from_bytes, from_stream);
        assert_eq!(from_bytes.len(), 2);
    }

    #[test]
    fn non_documents_are_rejected() {
        let err = DocumentSource::Record(json!([1, 2])).into_document().unwrap_err();
        assert!(matches!(err, SourceError::NotADocument("array")));
        assert!(DocumentSource::Bytes(b"not json".to_vec()).into_document().is_err());
    }
}

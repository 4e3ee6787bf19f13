//! Deterministic document fixtures for the codec workloads.
//!
//! Fixtures are extended-JSON style documents written to
//! `<data_dir>/flat_bson.json` and `<data_dir>/deep_bson.json`:
//!
//! ```text
//! flat: 145 top-level scalar fields (int64 / double / string / bool)
//! deep: `depth` levels of nested sub-documents, `width` scalars per level
//! ```
//!
//! Every field derives its own RNG seed from the master seed and its index, so
//! generation is reproducible regardless of how rayon splits the work.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::error::WorkloadError;
use crate::source::{Document, DocumentSource};

/// Default location of fixture files, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "perf/extended_bson";

pub const FLAT_FIXTURE: &str = "flat_bson.json";
pub const DEEP_FIXTURE: &str = "deep_bson.json";

/// Top-level field count of the flat fixture.
pub const FLAT_FIELD_COUNT: usize = 145;

/// Configuration for fixture generation.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub seed: u64,
    pub flat_fields: usize,
    /// Nesting depth of the deep fixture.
    pub deep_depth: usize,
    /// Scalar fields per nesting level of the deep fixture.
    pub deep_width: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            flat_fields: FLAT_FIELD_COUNT,
            deep_depth: 12,
            deep_width: 8,
        }
    }
}

/// Size, shape and digest of a fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureInfo {
    pub path: PathBuf,
    pub bytes: u64,
    pub top_level_fields: usize,
    pub max_depth: usize,
    pub sha256: String,
}

fn per_field_seed(master_seed: u64, index: usize) -> u64 {
    master_seed
        .wrapping_add(index as u64)
        .wrapping_mul(0x517cc1b727220a95)
}

fn random_word(rng: &mut ChaCha8Rng, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

fn random_scalar(rng: &mut ChaCha8Rng) -> Value {
    match rng.gen_range(0..4) {
        0 => Value::from(rng.gen_range(-1_000_000_000i64..1_000_000_000)),
        1 => Number::from_f64(rng.gen_range(-1.0e6..1.0e6))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        2 => Value::String(random_word(rng, 8, 48)),
        _ => Value::Bool(rng.gen_bool(0.5)),
    }
}

fn scalar_fields(seed: u64, offset: usize, count: usize) -> Vec<(String, Value)> {
    // Indexed parallel iterator: collect preserves order.
    (offset..offset + count)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(per_field_seed(seed, i));
            let key = format!("f{:03}_{}", i - offset, random_word(&mut rng, 3, 10));
            (key, random_scalar(&mut rng))
        })
        .collect()
}

/// Generate the flat fixture document.
pub fn generate_flat(config: &GenerateConfig) -> Document {
    scalar_fields(config.seed, 0, config.flat_fields)
        .into_iter()
        .collect()
}

/// Generate the deep fixture document.
pub fn generate_deep(config: &GenerateConfig) -> Document {
    let width = config.deep_width;
    let mut child: Option<Document> = None;

    for level in (0..config.deep_depth.max(1)).rev() {
        let mut doc: Document = scalar_fields(config.seed, level * width, width)
            .into_iter()
            .collect();
        if let Some(inner) = child.take() {
            doc.insert(format!("level_{}", level + 1), Value::Object(inner));
        }
        child = Some(doc);
    }

    child.unwrap_or_default()
}

fn write_document(path: &Path, doc: &Document) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(64 * 1024, file);
    serde_json::to_writer(&mut writer, doc).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

/// Write the flat and deep fixtures into `dir`, creating it if needed.
pub fn write_fixtures(dir: &Path, config: &GenerateConfig) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let flat_path = dir.join(FLAT_FIXTURE);
    write_document(&flat_path, &generate_flat(config))?;

    let deep_path = dir.join(DEEP_FIXTURE);
    write_document(&deep_path, &generate_deep(config))?;

    Ok(vec![flat_path, deep_path])
}

/// Read a fixture file's raw bytes.
pub fn read_fixture(path: &Path) -> Result<Vec<u8>, WorkloadError> {
    fs::read(path).map_err(|source| WorkloadError::Fixture {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a fixture into a document.
pub fn load_fixture(path: &Path) -> Result<Document, WorkloadError> {
    let bytes = read_fixture(path)?;
    DocumentSource::Bytes(bytes)
        .into_document()
        .map_err(|e| WorkloadError::InvalidFixture(format!("{}: {e}", path.display())))
}

/// Nesting depth of a document; a document without sub-documents has depth 1.
pub fn depth(doc: &Map<String, Value>) -> usize {
    1 + doc
        .values()
        .filter_map(Value::as_object)
        .map(depth)
        .max()
        .unwrap_or(0)
}

fn hex32(d: [u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in d {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// Describe a fixture file on disk.
pub fn fixture_info(path: &Path) -> Result<FixtureInfo, WorkloadError> {
    let bytes = read_fixture(path)?;
    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    let size = bytes.len() as u64;
    let doc = DocumentSource::Bytes(bytes)
        .into_document()
        .map_err(|e| WorkloadError::InvalidFixture(format!("{}: {e}", path.display())))?;

    Ok(FixtureInfo {
        path: path.to_path_buf(),
        bytes: size,
        top_level_fields: doc.len(),
        max_depth: depth(&doc),
        sha256: hex32(digest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generation_is_deterministic() {
        let config = GenerateConfig::default();
        assert_eq!(generate_flat(&config), generate_flat(&config));
        assert_eq!(generate_deep(&config), generate_deep(&config));

        let other = GenerateConfig {
            seed: 7,
            ..GenerateConfig::default()
        };
        assert_ne!(generate_flat(&config), generate_flat(&other));
    }

    #[test]
    fn flat_fixture_has_expected_fields() {
        let doc = generate_flat(&GenerateConfig::default());
        assert_eq!(doc.len(), FLAT_FIELD_COUNT);
        assert_eq!(depth(&doc), 1);
        assert!(doc.values().all(|v| !v.is_object() && !v.is_array()));
    }

    #[test]
    fn deep_fixture_nests() {
        let config = GenerateConfig {
            deep_depth: 5,
            deep_width: 3,
            ..GenerateConfig::default()
        };
        let doc = generate_deep(&config);
        assert_eq!(depth(&doc), 5);
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn write_then_inspect() {
        let dir = tempdir().unwrap();
        let config = GenerateConfig::default();
        let paths = write_fixtures(dir.path(), &config).unwrap();
        assert_eq!(paths.len(), 2);

        let flat = load_fixture(&paths[0]).unwrap();
        let expected = generate_flat(&config);
        assert!(flat.keys().eq(expected.keys()));

        let info = fixture_info(&paths[0]).unwrap();
        assert_eq!(info.top_level_fields, FLAT_FIELD_COUNT);
        assert_eq!(info.bytes, fs::metadata(&paths[0]).unwrap().len());
        assert_eq!(info.sha256.len(), 64);

        let again = fixture_info(&paths[0]).unwrap();
        assert_eq!(info.sha256, again.sha256);
    }

    #[test]
    fn missing_fixture_is_a_load_failure() {
        let dir = tempdir().unwrap();
        let err = load_fixture(&dir.path().join(FLAT_FIXTURE)).unwrap_err();
        assert!(matches!(err, WorkloadError::Fixture { .. }));
    }

    #[test]
    fn malformed_fixture_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FLAT_FIXTURE);
        fs::write(&path, b"[1, 2, 3]").unwrap();
        assert!(matches!(
            load_fixture(&path).unwrap_err(),
            WorkloadError::InvalidFixture(_)
        ));
    }
}

//! The chunk record type and its metadata value model

use crate::error::{RadchunkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Origin tag for a chunk. Closed set; one JSONL output file per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// RadLex ontology term
    Radlex,
    /// LOINC radiology playbook procedure code
    Loinc,
    /// TNM staging protocol section
    TnmLungProtocol,
    /// RECIST guideline section
    Recist,
}

impl SourceType {
    /// Stable tag used in ids, file names and the summary
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Radlex => "radlex",
            SourceType::Loinc => "loinc",
            SourceType::TnmLungProtocol => "tnm_lung_protocol",
            SourceType::Recist => "recist",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata value kinds.
///
/// The metadata map is open (processors add their own keys) but the value
/// kinds are closed, so records stay queryable downstream without
/// reflection. Integer is tried before Float on deserialization, keeping
/// counts lossless through a JSON round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        MetaValue::Integer(value as i64)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        MetaValue::Integer(value as i64)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        MetaValue::List(value)
    }
}

impl From<Option<String>> for MetaValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => MetaValue::String(s),
            None => MetaValue::Null,
        }
    }
}

/// Chunk metadata map. BTreeMap keeps serialization order deterministic.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Atomic unit of retrievable text plus metadata.
///
/// Immutable after construction; the only way to change persisted chunks is
/// a full regeneration of the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier within the source type, deterministic for a given
    /// input (e.g. `radlex_RID56`, `loinc_36643_5`)
    pub id: String,

    /// The text content to be embedded; never empty
    pub text: String,

    /// Origin tag
    pub source_type: SourceType,

    /// Open metadata map; always carries `source_file`, `created_at` and
    /// `char_count` plus the processor's documented key set
    pub metadata: Metadata,
}

impl Chunk {
    /// Construct a validated chunk.
    ///
    /// Rejects empty or whitespace-only text. Fills in the common metadata
    /// fields (`source_file`, `created_at`, `char_count`) alongside the
    /// processor-specific entries in `metadata`.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source_type: SourceType,
        source_file: &str,
        mut metadata: Metadata,
    ) -> Result<Self> {
        let id = id.into();
        let text = text.into();

        if text.trim().is_empty() {
            return Err(RadchunkError::Validation(format!(
                "chunk {} has empty text",
                id
            )));
        }

        metadata.insert("source_file".to_string(), source_file.into());
        metadata.insert(
            "created_at".to_string(),
            chrono::Utc::now().to_rfc3339().into(),
        );
        metadata.insert("char_count".to_string(), text.chars().count().into());

        Ok(Self {
            id,
            text,
            source_type,
            metadata,
        })
    }

    /// Character count recorded at construction time
    pub fn char_count(&self) -> usize {
        match self.metadata.get("char_count") {
            Some(MetaValue::Integer(n)) => *n as usize,
            _ => self.text.chars().count(),
        }
    }
}

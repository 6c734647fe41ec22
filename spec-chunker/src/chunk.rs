//! Core chunk model and deterministic chunk identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of logical unit a chunk was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Endpoint,
    Schema,
    Security,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Endpoint => "endpoint",
            ChunkType::Schema => "schema",
            ChunkType::Security => "security",
        }
    }

    /// Parses the lowercase tag stored in vector-store metadata.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "endpoint" => Some(ChunkType::Endpoint),
            "schema" => Some(ChunkType::Schema),
            "security" => Some(ChunkType::Security),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical identity of a unit: the tuple every chunk id is derived from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub source_spec: String,
    pub chunk_type: ChunkType,
    /// Uppercase HTTP method; empty unless `Endpoint`.
    pub method: String,
    /// Path template; empty unless `Endpoint`.
    pub path: String,
    /// Schema name; empty unless `Schema`.
    pub schema_name: String,
}

impl ChunkKey {
    pub fn endpoint(source_spec: &str, method: &str, path: &str) -> Self {
        Self {
            source_spec: source_spec.to_string(),
            chunk_type: ChunkType::Endpoint,
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            schema_name: String::new(),
        }
    }

    pub fn schema(source_spec: &str, name: &str) -> Self {
        Self {
            source_spec: source_spec.to_string(),
            chunk_type: ChunkType::Schema,
            method: String::new(),
            path: String::new(),
            schema_name: name.to_string(),
        }
    }

    pub fn security(source_spec: &str) -> Self {
        Self {
            source_spec: source_spec.to_string(),
            chunk_type: ChunkType::Security,
            method: String::new(),
            path: String::new(),
            schema_name: String::new(),
        }
    }

    /// Deterministic chunk id.
    ///
    /// - endpoint: `{source_spec}.endpoint.{METHOD}.{path}`
    /// - schema:   `{source_spec}.schema.{schema_name}`
    /// - security: `{source_spec}.security`
    ///
    /// `source_spec` never contains `.` (enforced by [`validate_source_spec`]) and
    /// methods are alphabetic, so distinct keys never produce the same id.
    pub fn id(&self) -> String {
        match self.chunk_type {
            ChunkType::Endpoint => format!(
                "{}.endpoint.{}.{}",
                self.source_spec, self.method, self.path
            ),
            ChunkType::Schema => format!("{}.schema.{}", self.source_spec, self.schema_name),
            ChunkType::Security => format!("{}.security", self.source_spec),
        }
    }
}

/// Checks that a document identifier can be used as an id prefix.
pub fn validate_source_spec(source_spec: &str) -> Result<(), String> {
    if source_spec.trim().is_empty() {
        return Err("source_spec is empty".into());
    }
    if source_spec.contains('.') {
        return Err(format!("source_spec '{source_spec}' must not contain '.'"));
    }
    if source_spec.chars().any(char::is_whitespace) {
        return Err(format!("source_spec '{source_spec}' must not contain whitespace"));
    }
    Ok(())
}

/// An indivisible retrievable unit.
///
/// Built once per logical unit during ingestion; never mutated afterwards
/// except for filling `embedding` right before upsert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub source_spec: String,
    /// Uppercase HTTP method for endpoints, empty otherwise.
    #[serde(default)]
    pub method: String,
    /// Path template for endpoints, empty otherwise.
    #[serde(default)]
    pub path: String,
    /// Schema name for schema chunks, empty otherwise.
    #[serde(default)]
    pub schema_name: String,
    pub content: String,
    /// Situating sentence(s); empty when contextualization was skipped or failed.
    #[serde(default)]
    pub context_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(key: &ChunkKey, content: String, context_prefix: String) -> Self {
        Self {
            id: key.id(),
            chunk_type: key.chunk_type,
            source_spec: key.source_spec.clone(),
            method: key.method.clone(),
            path: key.path.clone(),
            schema_name: key.schema_name.clone(),
            content,
            context_prefix,
            embedding: None,
        }
    }

    /// Text sent to the embedding model: prefix, blank line, content.
    pub fn embedding_text(&self) -> String {
        let prefix = self.context_prefix.trim();
        if prefix.is_empty() {
            self.content.clone()
        } else {
            format!("{prefix}\n\n{}", self.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_documented_format() {
        assert_eq!(
            ChunkKey::endpoint("ats", "post", "/candidates").id(),
            "ats.endpoint.POST./candidates"
        );
        assert_eq!(ChunkKey::schema("ats", "Candidate").id(), "ats.schema.Candidate");
        assert_eq!(ChunkKey::security("hris").id(), "hris.security");
    }

    #[test]
    fn ids_are_stable_and_distinct_per_unit() {
        let a = ChunkKey::endpoint("ats", "GET", "/candidates/{id}");
        assert_eq!(a.id(), a.clone().id());
        let b = ChunkKey::endpoint("ats", "DELETE", "/candidates/{id}");
        let c = ChunkKey::endpoint("hris", "GET", "/candidates/{id}");
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(
            ChunkKey::schema("ats", "security").id(),
            ChunkKey::security("ats").id()
        );
    }

    #[test]
    fn rejects_dotted_or_blank_source_spec() {
        assert!(validate_source_spec("ats").is_ok());
        assert!(validate_source_spec("ats.v1").is_err());
        assert!(validate_source_spec("  ").is_err());
        assert!(validate_source_spec("my api").is_err());
    }

    #[test]
    fn embedding_text_skips_empty_prefix() {
        let key = ChunkKey::schema("ats", "Candidate");
        let bare = Chunk::new(&key, "Schema: Candidate".into(), String::new());
        assert_eq!(bare.embedding_text(), "Schema: Candidate");

        let ctx = Chunk::new(&key, "Schema: Candidate".into(), "ATS candidate model.".into());
        assert_eq!(ctx.embedding_text(), "ATS candidate model.\n\nSchema: Candidate");
    }

    #[test]
    fn serializes_type_tag_lowercase() {
        let c = Chunk::new(&ChunkKey::security("ats"), "x".into(), String::new());
        let v = serde_json::to_value(&c).expect("serializable");
        assert_eq!(v["type"], "security");
        assert!(v.get("embedding").is_none());
    }
}

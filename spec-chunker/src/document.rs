//! Raw specification documents and their document-level summary.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::chunk::validate_source_spec;
use crate::error::ChunkError;

const SUMMARY_TAGS: usize = 10;
const SUMMARY_SCHEMAS: usize = 15;
const SUMMARY_PATHS: usize = 15;

/// One OpenAPI document plus the identifier used as its chunk-id prefix.
#[derive(Clone, Debug)]
pub struct SpecDocument {
    pub source_spec: String,
    pub raw: Value,
}

impl SpecDocument {
    /// Wraps an already-parsed document.
    ///
    /// # Errors
    /// [`ChunkError::InvalidDocument`] if the identifier is unusable or the
    /// document root is not a JSON object.
    pub fn new(source_spec: impl Into<String>, raw: Value) -> Result<Self, ChunkError> {
        let source_spec = source_spec.into();
        validate_source_spec(&source_spec).map_err(|reason| ChunkError::InvalidDocument {
            source_spec: source_spec.clone(),
            reason,
        })?;
        if !raw.is_object() {
            return Err(ChunkError::InvalidDocument {
                source_spec,
                reason: "document root is not a JSON object".into(),
            });
        }
        Ok(Self { source_spec, raw })
    }

    /// Reads a JSON document from disk; the identifier is the lowercased file stem
    /// (`specs/ats.json` → `ats`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChunkError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        debug!(path = %path.display(), source_spec = %stem, "reading spec document");
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(stem, &text)
    }

    /// Parses a JSON document body, e.g. one fetched over HTTP.
    pub fn from_json_str(source_spec: impl Into<String>, text: &str) -> Result<Self, ChunkError> {
        let raw: Value = serde_json::from_str(text)?;
        Self::new(source_spec, raw)
    }

    /// Identifier for a document served at `url`: the lowercased stem of the
    /// last path segment (`https://host/oas/hris.json` → `hris`).
    pub fn source_spec_from_url(url: &str) -> String {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
        let stem = match last.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => last,
        };
        stem.to_ascii_lowercase()
    }

    pub fn title(&self) -> &str {
        str_at(&self.raw, &["info", "title"]).unwrap_or("Unknown API")
    }

    pub fn version(&self) -> &str {
        str_at(&self.raw, &["info", "version"]).unwrap_or("N/A")
    }

    /// First server URL, or empty.
    pub fn base_url(&self) -> &str {
        self.raw
            .get("servers")
            .and_then(Value::as_array)
            .and_then(|s| s.first())
            .and_then(|s| s.get("url"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary::from_document(self)
    }
}

/// Compact, human-readable overview of a document given to the contextualizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentSummary {
    pub title: String,
    pub version: String,
    pub description: String,
    pub servers: Vec<String>,
    pub tags: Vec<String>,
    pub schemas: Vec<String>,
    pub paths: Vec<String>,
}

impl DocumentSummary {
    pub fn from_document(doc: &SpecDocument) -> Self {
        let raw = &doc.raw;
        let servers = raw
            .get("servers")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(|s| s.get("url").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let tags = raw
            .get("tags")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(|t| t.get("name").and_then(Value::as_str))
                    .take(SUMMARY_TAGS)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let schemas = raw
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
            .map(|m| m.keys().take(SUMMARY_SCHEMAS).cloned().collect())
            .unwrap_or_default();
        let paths = raw
            .get("paths")
            .and_then(Value::as_object)
            .map(|m| m.keys().take(SUMMARY_PATHS).cloned().collect())
            .unwrap_or_default();

        Self {
            title: doc.title().to_string(),
            version: doc.version().to_string(),
            description: str_at(raw, &["info", "description"])
                .unwrap_or("")
                .to_string(),
            servers,
            tags,
            schemas,
            paths,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "API: {} (v{})\nDescription: {}\nServers: {}\nTags: {}\nSchemas: {}...\nPaths: {}...",
            self.title,
            self.version,
            self.description.trim(),
            self.servers.join(", "),
            self.tags.join(", "),
            self.schemas.join(", "),
            self.paths.join(", "),
        )
    }
}

fn str_at<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .try_fold(v, |cur, k| cur.get(*k))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_caps_lists_and_keeps_document_order() {
        let mut paths = serde_json::Map::new();
        for i in 0..20 {
            paths.insert(format!("/p{i}"), json!({}));
        }
        let tags: Vec<Value> = (0..12).map(|i| json!({ "name": format!("t{i}") })).collect();
        let raw = json!({
            "info": { "title": "ATS", "version": "1.0.0", "description": "Applicant tracking" },
            "servers": [{ "url": "https://api.example.com" }],
            "tags": tags,
            "paths": paths,
        });
        let s = SpecDocument::new("ats", raw).expect("valid").summary();
        assert_eq!(s.tags.len(), 10);
        assert_eq!(s.paths.len(), 15);
        assert_eq!(s.paths[0], "/p0");
        assert_eq!(s.paths[14], "/p14");
        assert!(s.render().starts_with("API: ATS (v1.0.0)"));
    }

    #[test]
    fn defaults_for_missing_info() {
        let doc = SpecDocument::new("x", json!({})).expect("valid");
        assert_eq!(doc.title(), "Unknown API");
        assert_eq!(doc.version(), "N/A");
        assert_eq!(doc.base_url(), "");
    }

    #[test]
    fn source_spec_comes_from_the_last_url_segment() {
        assert_eq!(
            SpecDocument::source_spec_from_url("https://api.eu1.stackone.com/oas/HRIS.json"),
            "hris"
        );
        assert_eq!(SpecDocument::source_spec_from_url("http://h/oas/crm.json?v=2#top"), "crm");
        assert_eq!(SpecDocument::source_spec_from_url("http://h/specs/lms/"), "lms");
    }

    #[test]
    fn parses_fetched_body() {
        let d = SpecDocument::from_json_str("iam", r#"{"info":{"title":"IAM"}}"#).expect("doc");
        assert_eq!(d.title(), "IAM");
        assert!(matches!(
            SpecDocument::from_json_str("iam", "<html>").unwrap_err(),
            ChunkError::Parse(_)
        ));
    }

    #[test]
    fn rejects_non_object_root() {
        let err = SpecDocument::new("ats", json!([1, 2])).unwrap_err();
        assert!(matches!(err, ChunkError::InvalidDocument { .. }));
    }
}

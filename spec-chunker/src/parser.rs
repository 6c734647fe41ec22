//! OpenAPI parser: turns a document into typed logical units with rendered text.
//!
//! One unit per `(method, path)` operation, one per named schema, and a single
//! combined unit for all security schemes. Units that cannot be rendered are
//! reported as [`RejectedUnit`]s and never abort the document.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::chunk::ChunkKey;
use crate::document::{DocumentSummary, SpecDocument};
use crate::error::RejectedUnit;

/// HTTP methods recognised inside a path item; other keys are ignored.
pub const HTTP_METHODS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "options", "head", "trace",
];

/// A parsed unit ready to become a chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct LogicalUnit {
    pub key: ChunkKey,
    pub content: String,
}

/// Everything the builder needs from one document.
#[derive(Clone, Debug)]
pub struct ParsedDocument {
    pub summary: DocumentSummary,
    pub units: Vec<LogicalUnit>,
    pub rejected: Vec<RejectedUnit>,
}

/// Parses a document into endpoint, schema and security units.
pub fn parse_document(doc: &SpecDocument) -> ParsedDocument {
    let header = Header {
        title: doc.title().to_string(),
        version: doc.version().to_string(),
        base_url: doc.base_url().to_string(),
    };
    let mut units = Vec::new();
    let mut rejected = Vec::new();

    match doc.raw.get("paths") {
        None => {}
        Some(Value::Object(paths)) => {
            parse_paths(&doc.source_spec, &header, paths, &mut units, &mut rejected)
        }
        Some(_) => rejected.push(RejectedUnit::new("paths", "`paths` is not an object")),
    }

    if let Some(components) = doc.raw.get("components") {
        match components.get("schemas") {
            None => {}
            Some(Value::Object(schemas)) => {
                for (name, def) in schemas {
                    match render_schema(&header, name, def) {
                        Ok(content) => units.push(LogicalUnit {
                            key: ChunkKey::schema(&doc.source_spec, name),
                            content,
                        }),
                        Err(reason) => rejected.push(RejectedUnit::new(
                            format!("components.schemas.{name}"),
                            reason,
                        )),
                    }
                }
            }
            Some(_) => rejected.push(RejectedUnit::new(
                "components.schemas",
                "`schemas` is not an object",
            )),
        }

        match components.get("securitySchemes") {
            None => {}
            Some(Value::Object(schemes)) if schemes.is_empty() => {}
            Some(Value::Object(schemes)) => {
                let (content, bad) = render_security(&header, schemes);
                rejected.extend(bad);
                if let Some(content) = content {
                    units.push(LogicalUnit {
                        key: ChunkKey::security(&doc.source_spec),
                        content,
                    });
                }
            }
            Some(_) => rejected.push(RejectedUnit::new(
                "components.securitySchemes",
                "`securitySchemes` is not an object",
            )),
        }
    }

    for r in &rejected {
        warn!(source_spec = %doc.source_spec, unit = %r.unit, reason = %r.reason, "unit rejected");
    }
    debug!(
        source_spec = %doc.source_spec,
        units = units.len(),
        rejected = rejected.len(),
        "document parsed"
    );

    ParsedDocument {
        summary: doc.summary(),
        units,
        rejected,
    }
}

/// Per-document lines repeated at the top of every chunk.
struct Header {
    title: String,
    version: String,
    base_url: String,
}

fn parse_paths(
    source_spec: &str,
    header: &Header,
    paths: &Map<String, Value>,
    units: &mut Vec<LogicalUnit>,
    rejected: &mut Vec<RejectedUnit>,
) {
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            rejected.push(RejectedUnit::new(
                format!("paths.{path}"),
                "path item is not an object",
            ));
            continue;
        };
        let shared_params = item
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for (method, op) in item {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let unit = format!("paths.{path}.{method}");
            let Some(op) = op.as_object() else {
                rejected.push(RejectedUnit::new(unit, "operation is not an object"));
                continue;
            };
            let params = merge_parameters(shared_params, op.get("parameters"));
            units.push(LogicalUnit {
                key: ChunkKey::endpoint(source_spec, method, path),
                content: render_endpoint(header, method, path, op, &params),
            });
        }
    }
}

/// Path-level parameters followed by operation-level ones; the operation wins
/// on `(name, in)` collisions and keeps its own position.
fn merge_parameters<'a>(shared: &'a [Value], own: Option<&'a Value>) -> Vec<&'a Value> {
    let own: Vec<&Value> = own
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default();
    let own_keys: Vec<(String, String)> = own.iter().map(|p| param_key(p)).collect();

    shared
        .iter()
        .filter(|p| !own_keys.contains(&param_key(p)))
        .chain(own)
        .collect()
}

fn param_key(p: &Value) -> (String, String) {
    if let Some(r) = p.get("$ref").and_then(Value::as_str) {
        return (r.to_string(), String::new());
    }
    (
        p.get("name").and_then(Value::as_str).unwrap_or("").to_string(),
        p.get("in").and_then(Value::as_str).unwrap_or("").to_string(),
    )
}

fn render_endpoint(
    header: &Header,
    method: &str,
    path: &str,
    op: &Map<String, Value>,
    params: &[&Value],
) -> String {
    let mut out = header_lines(header);
    push_line(&mut out, "Endpoint", &format!("{} {path}", method.to_ascii_uppercase()));
    push_opt(&mut out, "Operation ID", op.get("operationId"));
    push_opt(&mut out, "Summary", op.get("summary"));
    if let Some(tags) = op.get("tags").and_then(Value::as_array) {
        let tags: Vec<&str> = tags.iter().filter_map(Value::as_str).collect();
        if !tags.is_empty() {
            push_line(&mut out, "Tags", &tags.join(", "));
        }
    }
    push_opt(&mut out, "Description", op.get("description"));
    if op.get("deprecated").and_then(Value::as_bool) == Some(true) {
        out.push_str("Deprecated: yes\n");
    }

    if !params.is_empty() {
        out.push_str("Parameters:\n");
        for p in params {
            out.push_str(&render_parameter(p));
        }
    }

    if let Some(body) = op.get("requestBody") {
        let required = body.get("required").and_then(Value::as_bool) == Some(true);
        out.push_str(if required {
            "Request body (required):"
        } else {
            "Request body:"
        });
        out.push_str(&media_summary(body));
        out.push('\n');
        if let Some(d) = body.get("description").and_then(Value::as_str) {
            out.push_str(&format!("  {}\n", d.trim()));
        }
    }

    if let Some(responses) = op.get("responses").and_then(Value::as_object) {
        out.push_str("Responses:\n");
        for (status, resp) in responses {
            let desc = resp
                .get("description")
                .and_then(Value::as_str)
                .map(str::trim)
                .or_else(|| resp.get("$ref").and_then(Value::as_str).map(ref_name))
                .unwrap_or("");
            out.push_str(&format!("- {status}: {desc}{}\n", media_summary(resp)));
        }
    }

    out.trim_end().to_string()
}

fn render_parameter(p: &Value) -> String {
    if let Some(r) = p.get("$ref").and_then(Value::as_str) {
        return format!("- {} (ref)\n", ref_name(r));
    }
    let name = p.get("name").and_then(Value::as_str).unwrap_or("?");
    let location = p.get("in").and_then(Value::as_str).unwrap_or("?");
    let mut attrs = vec![location.to_string()];
    if p.get("required").and_then(Value::as_bool) == Some(true) {
        attrs.push("required".into());
    }
    if let Some(schema) = p.get("schema") {
        attrs.push(type_label(schema));
    }
    let mut line = format!("- {name} ({})", attrs.join(", "));
    if let Some(d) = p.get("description").and_then(Value::as_str) {
        line.push_str(": ");
        line.push_str(&one_line(d));
    }
    line.push('\n');
    line
}

/// ` [application/json: Candidate]` for a request body or response, or empty.
fn media_summary(v: &Value) -> String {
    let Some(content) = v.get("content").and_then(Value::as_object) else {
        return String::new();
    };
    let parts: Vec<String> = content
        .iter()
        .map(|(mime, media)| match media.get("schema") {
            Some(s) => format!("{mime}: {}", type_label(s)),
            None => mime.clone(),
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join("; "))
    }
}

fn render_schema(header: &Header, name: &str, def: &Value) -> Result<String, String> {
    let Some(obj) = def.as_object() else {
        return Err("schema definition is not an object".into());
    };
    let mut out = header_lines(header);
    push_line(&mut out, "Schema", name);
    push_line(&mut out, "Type", &type_label(def));
    push_opt(&mut out, "Title", obj.get("title"));
    push_opt(&mut out, "Description", obj.get("description"));

    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        out.push_str("Fields:\n");
        for (field, fdef) in props {
            let mut line = format!("- {field} ({}", type_label(fdef));
            if required.contains(&field.as_str()) {
                line.push_str(", required");
            }
            if fdef.get("nullable").and_then(Value::as_bool) == Some(true) {
                line.push_str(", nullable");
            }
            line.push(')');
            if let Some(d) = fdef.get("description").and_then(Value::as_str) {
                line.push_str(": ");
                line.push_str(&one_line(d));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }

    for combinator in ["allOf", "oneOf", "anyOf"] {
        if let Some(parts) = obj.get(combinator).and_then(Value::as_array) {
            let labels: Vec<String> = parts.iter().map(type_label).collect();
            out.push_str(&format!("Composed of ({combinator}): {}\n", labels.join(", ")));
        }
    }

    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        let values: Vec<String> = values.iter().map(scalar_text).collect();
        push_line(&mut out, "Enum", &values.join(", "));
    }

    Ok(out.trim_end().to_string())
}

/// All schemes in one text; schemes that are not objects are rejected individually.
fn render_security(
    header: &Header,
    schemes: &Map<String, Value>,
) -> (Option<String>, Vec<RejectedUnit>) {
    let mut out = header_lines(header);
    out.push_str("Security schemes:\n");
    let mut rendered = 0usize;
    let mut rejected = Vec::new();

    for (name, scheme) in schemes {
        let Some(s) = scheme.as_object() else {
            rejected.push(RejectedUnit::new(
                format!("components.securitySchemes.{name}"),
                "security scheme is not an object",
            ));
            continue;
        };
        let kind = s.get("type").and_then(Value::as_str).unwrap_or("unknown");
        let mut line = format!("- {name}: {kind}");
        match kind {
            "http" => {
                if let Some(scheme) = s.get("scheme").and_then(Value::as_str) {
                    line.push_str(&format!(" ({scheme})"));
                }
            }
            "apiKey" => {
                let at = s.get("in").and_then(Value::as_str).unwrap_or("?");
                let key = s.get("name").and_then(Value::as_str).unwrap_or("?");
                line.push_str(&format!(" in {at} \"{key}\""));
            }
            "oauth2" => {
                if let Some(flows) = s.get("flows").and_then(Value::as_object) {
                    let flows: Vec<&str> = flows.keys().map(String::as_str).collect();
                    line.push_str(&format!(" (flows: {})", flows.join(", ")));
                }
            }
            "openIdConnect" => {
                if let Some(url) = s.get("openIdConnectUrl").and_then(Value::as_str) {
                    line.push_str(&format!(" ({url})"));
                }
            }
            _ => {}
        }
        if let Some(d) = s.get("description").and_then(Value::as_str) {
            line.push_str(": ");
            line.push_str(&one_line(d));
        }
        out.push_str(&line);
        out.push('\n');
        rendered += 1;
    }

    let content = (rendered > 0).then(|| out.trim_end().to_string());
    (content, rejected)
}

fn header_lines(h: &Header) -> String {
    let mut out = format!("Service: {} (v{})\n", h.title, h.version);
    if !h.base_url.is_empty() {
        push_line(&mut out, "Base URL", &h.base_url);
    }
    out
}

fn push_line(out: &mut String, label: &str, value: &str) {
    out.push_str(label);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn push_opt(out: &mut String, label: &str, value: Option<&Value>) {
    if let Some(s) = value.and_then(Value::as_str).map(str::trim) {
        if !s.is_empty() {
            push_line(out, label, &one_line(s));
        }
    }
}

/// Short type description: `$ref` by last segment, arrays as `array<T>`.
pub fn type_label(schema: &Value) -> String {
    if let Some(r) = schema.get("$ref").and_then(Value::as_str) {
        return ref_name(r).to_string();
    }
    for combinator in ["oneOf", "anyOf", "allOf"] {
        if let Some(parts) = schema.get(combinator).and_then(Value::as_array) {
            let labels: Vec<String> = parts.iter().map(type_label).collect();
            return format!("{combinator}<{}>", labels.join(" | "));
        }
    }
    match schema.get("type").and_then(Value::as_str) {
        Some("array") => {
            let inner = schema
                .get("items")
                .map(type_label)
                .unwrap_or_else(|| "any".into());
            format!("array<{inner}>")
        }
        Some(t) => match schema.get("format").and_then(Value::as_str) {
            Some(f) => format!("{t}({f})"),
            None => t.to_string(),
        },
        None if schema.get("properties").is_some() => "object".into(),
        None => "any".into(),
    }
}

/// Last path segment of a JSON reference: `#/components/schemas/Candidate` → `Candidate`.
pub fn ref_name(r: &str) -> &str {
    r.rsplit('/').next().unwrap_or(r)
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkType;
    use serde_json::json;

    fn ats() -> SpecDocument {
        SpecDocument::new(
            "ats",
            json!({
                "openapi": "3.0.0",
                "info": { "title": "ATS", "version": "1.0.0" },
                "servers": [{ "url": "https://api.example.com" }],
                "paths": {
                    "/candidates": {
                        "parameters": [
                            { "name": "x-account-id", "in": "header", "required": true,
                              "schema": { "type": "string" } },
                            { "name": "page_size", "in": "query", "schema": { "type": "integer" } }
                        ],
                        "summary": "ignored path-level key",
                        "get": {
                            "operationId": "ats_list_candidates",
                            "summary": "List Candidates",
                            "tags": ["Candidates"],
                            "parameters": [
                                { "name": "page_size", "in": "query", "description": "Max  results",
                                  "schema": { "type": "integer", "format": "int32" } }
                            ],
                            "responses": {
                                "200": { "description": "The list of candidates.",
                                  "content": { "application/json": { "schema": {
                                      "$ref": "#/components/schemas/CandidatesPaginated" } } } }
                            }
                        },
                        "post": {
                            "summary": "Create Candidate",
                            "requestBody": { "required": true, "content": { "application/json": {
                                "schema": { "$ref": "#/components/schemas/Candidate" } } } },
                            "responses": { "201": { "description": "Created" } }
                        }
                    },
                    "/broken": { "get": "nope" }
                },
                "components": {
                    "schemas": {
                        "Candidate": {
                            "type": "object",
                            "required": ["id"],
                            "properties": {
                                "id": { "type": "string", "description": "Unique id" },
                                "emails": { "type": "array", "items": { "$ref": "#/components/schemas/Email" } }
                            }
                        },
                        "Flag": true
                    },
                    "securitySchemes": {
                        "basic": { "type": "http", "scheme": "basic" },
                        "key": { "type": "apiKey", "in": "header", "name": "X-API-Key" }
                    }
                }
            }),
        )
        .expect("valid document")
    }

    #[test]
    fn one_unit_per_operation_schema_and_one_security_unit() {
        let parsed = parse_document(&ats());
        let ids: Vec<String> = parsed.units.iter().map(|u| u.key.id()).collect();
        assert_eq!(
            ids,
            vec![
                "ats.endpoint.GET./candidates",
                "ats.endpoint.POST./candidates",
                "ats.schema.Candidate",
                "ats.security",
            ]
        );
        let kinds: Vec<ChunkType> = parsed.units.iter().map(|u| u.key.chunk_type).collect();
        assert_eq!(kinds.iter().filter(|k| **k == ChunkType::Security).count(), 1);
    }

    #[test]
    fn malformed_units_are_rejected_not_fatal() {
        let parsed = parse_document(&ats());
        let rejected: Vec<&str> = parsed.rejected.iter().map(|r| r.unit.as_str()).collect();
        assert_eq!(rejected, vec!["paths./broken.get", "components.schemas.Flag"]);
    }

    #[test]
    fn operation_parameters_override_path_level_ones() {
        let parsed = parse_document(&ats());
        let get = &parsed.units[0].content;
        assert!(get.contains("- x-account-id (header, required, string)"));
        assert!(get.contains("- page_size (query, integer(int32)): Max results"));
        assert_eq!(get.matches("page_size").count(), 1);
        assert!(get.contains("Operation ID: ats_list_candidates"));
        assert!(get.contains("- 200: The list of candidates. [application/json: CandidatesPaginated]"));
        assert!(get.starts_with("Service: ATS (v1.0.0)\nBase URL: https://api.example.com"));
    }

    #[test]
    fn request_body_and_schema_fields_render_refs_by_name() {
        let parsed = parse_document(&ats());
        assert!(parsed.units[1]
            .content
            .contains("Request body (required): [application/json: Candidate]"));
        let schema = &parsed.units[2].content;
        assert!(schema.contains("- id (string, required): Unique id"));
        assert!(schema.contains("- emails (array<Email>)"));
    }

    #[test]
    fn security_schemes_are_combined() {
        let parsed = parse_document(&ats());
        let sec = &parsed.units[3].content;
        assert!(sec.contains("- basic: http (basic)"));
        assert!(sec.contains("- key: apiKey in header \"X-API-Key\""));
    }

    #[test]
    fn document_without_paths_or_components_yields_nothing() {
        let doc = SpecDocument::new("empty", json!({ "info": { "title": "E" } })).expect("valid");
        let parsed = parse_document(&doc);
        assert!(parsed.units.is_empty());
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn type_labels() {
        assert_eq!(type_label(&json!({ "$ref": "#/components/schemas/A" })), "A");
        assert_eq!(
            type_label(&json!({ "oneOf": [{ "type": "string" }, { "$ref": "#/x/B" }] })),
            "oneOf<string | B>"
        );
        assert_eq!(type_label(&json!({})), "any");
    }
}

//! Response body parsing and schema repair (`spec.md` §4.C).

use crate::error::{ExtractError, Result};
use serde_json::{Map, Value};
use strata_protocol::{ExtractedEdge, ExtractedEvidence, ExtractedNode};

/// Strip an optional ```` ```json … ``` ```` or ```` ``` … ``` ```` fence,
/// keeping whatever preamble/epilogue text surrounds it out of the result.
pub fn strip_fences(body: &str) -> String {
    let trimmed = body.trim();
    if let Some(start) = trimmed.find("```") {
        let after_open = &trimmed[start + 3..];
        let after_open = after_open.strip_prefix("json").unwrap_or(after_open);
        let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
        if let Some(end) = after_open.find("```") {
            return after_open[..end].trim().to_string();
        }
        return after_open.trim().to_string();
    }
    trimmed.to_string()
}

/// Extract the first balanced `{…}` or `[…]` fragment from `body`,
/// ignoring braces/brackets inside string literals.
pub fn extract_balanced_fragment(body: &str) -> Option<String> {
    let bytes = body.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(body[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// If `fragment` looks like a comma-separated run of objects outside any
/// list (`{...}, {...}`), wrap it in `[ … ]`.
fn wrap_bare_object_sequence(fragment: &str) -> String {
    let trimmed = fragment.trim();
    if trimmed.starts_with('[') {
        return trimmed.to_string();
    }
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        let inner_after_first = &trimmed[1..];
        if inner_after_first.contains("},") {
            return format!("[{trimmed}]");
        }
    }
    trimmed.to_string()
}

pub fn parse_response(body: &str) -> Result<Value> {
    let stripped = strip_fences(body);
    let fragment = extract_balanced_fragment(&stripped).unwrap_or(stripped);
    let wrapped = wrap_bare_object_sequence(&fragment);
    serde_json::from_str(&wrapped).map_err(|e| ExtractError::JsonParse(e.to_string()))
}

fn take_alias(obj: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|k| obj.get(*k).cloned())
}

fn repair_node_object(mut obj: Map<String, Value>) -> Map<String, Value> {
    if !obj.contains_key("node_id") {
        if let Some(v) = take_alias(&obj, &["id", "entity_id", "entity_name", "entity", "name"]) {
            obj.insert("node_id".to_string(), v);
        }
    }
    if !obj.contains_key("node_type") {
        if let Some(v) = take_alias(&obj, &["entity_type", "type"]) {
            obj.insert("node_type".to_string(), v);
        }
    }
    if !obj.contains_key("name") {
        if let Some(id) = obj.get("node_id").cloned() {
            obj.insert("name".to_string(), id);
        }
    }
    if !obj.contains_key("system") {
        obj.insert("system".to_string(), Value::String("unknown".to_string()));
    }
    match obj.get("attributes") {
        Some(Value::Array(items)) => {
            let mut map = Map::new();
            for item in items {
                if let (Some(name), Some(value)) =
                    (item.get("name").and_then(Value::as_str), item.get("value"))
                {
                    map.insert(name.to_string(), value.clone());
                }
            }
            obj.insert("attributes".to_string(), Value::Object(map));
        }
        Some(Value::Object(_)) => {}
        _ => {
            obj.insert("attributes".to_string(), Value::Object(Map::new()));
        }
    }
    for key in ["node_id", "node_type", "name", "system"] {
        obj.entry(key.to_string()).or_insert_with(|| Value::String(String::new()));
    }
    obj
}

fn repair_edge_object(mut obj: Map<String, Value>) -> Option<Map<String, Value>> {
    if !obj.contains_key("from_node_id") {
        if let Some(v) = obj.get("source_id").cloned() {
            obj.insert("from_node_id".to_string(), v);
        }
    }
    if !obj.contains_key("to_node_id") {
        if let Some(v) = obj.get("target_id").cloned() {
            obj.insert("to_node_id".to_string(), v);
        }
    }
    let has_from = obj.get("from_node_id").and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    let has_to = obj.get("to_node_id").and_then(Value::as_str).is_some_and(|s| !s.is_empty());
    if !has_from || !has_to {
        return None;
    }
    obj.entry("confidence".to_string()).or_insert(Value::from(0.5));
    obj.entry("is_hypothesis".to_string()).or_insert(Value::Bool(true));
    obj.entry("rationale".to_string()).or_insert(Value::Null);
    obj.entry("evidence_refs".to_string()).or_insert(Value::Array(vec![]));
    Some(obj)
}

/// Result of extraction schema repair: nodes/edges ready to deserialize,
/// plus a count of edges dropped for missing endpoints (logged by the
/// caller).
pub struct RepairedExtraction {
    pub nodes: Vec<ExtractedNode>,
    pub edges: Vec<ExtractedEdge>,
    pub evidences: Vec<ExtractedEvidence>,
    pub assumptions: Vec<String>,
    pub dropped_edges: usize,
}

/// Schema repair for `extract*` actions (`spec.md` §4.C). `deep_dive` is
/// exempt from this and should be deserialized directly instead.
pub fn repair_extraction_schema(value: Value) -> Result<RepairedExtraction> {
    let value = match value {
        Value::Array(items) => {
            let mut map = Map::new();
            map.insert("nodes".to_string(), Value::Array(items));
            map.insert("edges".to_string(), Value::Array(vec![]));
            Value::Object(map)
        }
        Value::Object(map) => Value::Object(map),
        other => return Err(ExtractError::Validation(format!("expected object or array, got {other}"))),
    };

    let Value::Object(mut root) = value else { unreachable!() };

    let Some(raw_nodes) = root.remove("nodes") else {
        return Err(ExtractError::Validation("response is missing required `nodes` field".to_string()));
    };
    let Value::Array(raw_nodes) = raw_nodes else {
        return Err(ExtractError::Validation("`nodes` must be a list".to_string()));
    };

    let raw_edges = match root.remove("edges") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    let nodes: Vec<ExtractedNode> = raw_nodes
        .into_iter()
        .filter_map(|n| n.as_object().cloned())
        .map(repair_node_object)
        .map(Value::Object)
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    let total_edges = raw_edges.len();
    let endpoint_valid: Vec<Map<String, Value>> = raw_edges
        .into_iter()
        .filter_map(|e| e.as_object().cloned())
        .filter_map(repair_edge_object)
        .collect();
    let mut dropped_edges = total_edges - endpoint_valid.len();
    let edges: Vec<ExtractedEdge> = endpoint_valid
        .into_iter()
        .map(Value::Object)
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(edge) => Some(edge),
            Err(_) => {
                dropped_edges += 1;
                None
            }
        })
        .collect();

    let evidences: Vec<ExtractedEvidence> = root
        .get("evidences")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();
    let assumptions: Vec<String> = root
        .get("assumptions")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    Ok(RepairedExtraction { nodes, edges, evidences, assumptions, dropped_edges })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence_with_preamble_and_epilogue() {
        let body = "Here is the result:\n```json\n{\"nodes\": []}\n```\nLet me know if you need more.";
        let parsed = parse_response(body).unwrap();
        assert!(parsed.get("nodes").is_some());
    }

    #[test]
    fn wraps_bare_object_sequence_in_list() {
        let repaired = repair_extraction_schema(serde_json::json!([
            {"id": "a", "type": "TABLE"},
            {"id": "b", "type": "TABLE"}
        ]))
        .unwrap();
        assert_eq!(repaired.nodes.len(), 2);
        assert_eq!(repaired.nodes[0].node_id, "a");
        assert_eq!(repaired.nodes[0].node_type, "TABLE");
    }

    #[test]
    fn missing_nodes_field_is_validation_error() {
        let err = repair_extraction_schema(serde_json::json!({"edges": []})).unwrap_err();
        assert!(matches!(err, ExtractError::Validation(_)));
    }

    #[test]
    fn edge_missing_endpoint_is_dropped() {
        let repaired = repair_extraction_schema(serde_json::json!({
            "nodes": [],
            "edges": [
                {"source_id": "a", "target_id": "b", "edge_type": "READS_FROM"},
                {"source_id": "a", "edge_type": "READS_FROM"}
            ]
        }))
        .unwrap();
        assert_eq!(repaired.edges.len(), 1);
        assert_eq!(repaired.dropped_edges, 1);
    }

    #[test]
    fn edge_aliases_source_id_target_id() {
        let repaired = repair_extraction_schema(serde_json::json!({
            "nodes": [],
            "edges": [{"source_id": "a", "target_id": "b", "edge_type": "READS_FROM"}]
        }))
        .unwrap();
        assert_eq!(repaired.edges[0].from_node_id, "a");
        assert_eq!(repaired.edges[0].to_node_id, "b");
    }
}

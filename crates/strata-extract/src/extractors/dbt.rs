//! Deterministic dbt `manifest.json` walker (`spec.md` §4.B): every
//! `nodes`/`sources` entry becomes an asset node, `depends_on.nodes`
//! references become `DEPENDS_ON` edges.

use serde_json::Value;
use std::collections::BTreeMap;
use strata_protocol::{ExtractedEdge, ExtractedEvidence, ExtractedNode, ExtractionResult};

use crate::error::{ExtractError, Result};

fn node_display_name(unique_id: &str, obj: &Value) -> String {
    obj.get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| unique_id.to_string())
}

pub fn extract(file_path: &str, content: &str) -> Result<ExtractionResult> {
    let manifest: Value = serde_json::from_str(content)
        .map_err(|e| ExtractError::JsonParse(e.to_string()))?;

    let mut result = ExtractionResult::new("dbt_manifest_walker", file_path);
    let mut known_ids: BTreeMap<String, String> = BTreeMap::new();

    for key in ["nodes", "sources"] {
        let Some(entries) = manifest.get(key).and_then(Value::as_object) else { continue };
        for (unique_id, obj) in entries {
            let name = node_display_name(unique_id, obj);
            let node_type = if key == "sources" { "TABLE" } else { "TABLE" };
            known_ids.insert(unique_id.clone(), unique_id.clone());
            result.nodes.push(ExtractedNode {
                node_id: unique_id.clone(),
                node_type: node_type.to_string(),
                name,
                system: "dbt".to_string(),
                attributes: BTreeMap::new(),
            });
        }
    }

    let Some(nodes) = manifest.get("nodes").and_then(Value::as_object) else {
        return Ok(result);
    };
    for (unique_id, obj) in nodes {
        let Some(depends_on) = obj
            .get("depends_on")
            .and_then(|d| d.get("nodes"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for dep in depends_on {
            let Some(dep_id) = dep.as_str() else { continue };
            if !known_ids.contains_key(dep_id) {
                continue;
            }
            let evidence_idx = result.evidences.len();
            result.evidences.push(ExtractedEvidence {
                file_path: file_path.to_string(),
                kind: "code".to_string(),
                line_start: None,
                line_end: None,
                xpath: None,
                snippet: format!("{unique_id} depends_on {dep_id}"),
                hash: None,
            });
            result.edges.push(ExtractedEdge {
                from_node_id: unique_id.clone(),
                to_node_id: dep_id.to_string(),
                edge_type: "DEPENDS_ON".to_string(),
                confidence: 0.95,
                is_hypothesis: false,
                rationale: None,
                evidence_refs: vec![evidence_idx],
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
    {
        "nodes": {
            "model.proj.stg_customers": {
                "name": "stg_customers",
                "depends_on": { "nodes": ["source.proj.raw.customers"] }
            }
        },
        "sources": {
            "source.proj.raw.customers": { "name": "customers" }
        }
    }
    "#;

    #[test]
    fn depends_on_becomes_edge_between_known_nodes() {
        let result = extract("target/manifest.json", MANIFEST).unwrap();
        assert_eq!(result.nodes.len(), 2);
        assert!(result.edges.iter().any(|e| {
            e.edge_type == "DEPENDS_ON"
                && e.from_node_id == "model.proj.stg_customers"
                && e.to_node_id == "source.proj.raw.customers"
        }));
    }

    #[test]
    fn unknown_dependency_id_is_skipped() {
        let manifest = r#"{"nodes": {"model.proj.x": {"name": "x", "depends_on": {"nodes": ["model.proj.ghost"]}}}}"#;
        let result = extract("manifest.json", manifest).unwrap();
        assert!(result.edges.is_empty());
    }
}

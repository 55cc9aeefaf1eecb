//! Line state machine for DataStage `.dsx` export files (`spec.md`
//! §4.B): tracks `BEGIN DSJOB` / `BEGIN DSSTAGE` / `BEGIN DSLINK`
//! blocks and emits a structural summary — the job as a `PROCESS`
//! node, each stage/link `CONTAINS`-edged beneath it. Column-level
//! lineage for `.dsx` is left to the `extract.deep_dive` LLM action.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use strata_protocol::{ExtractedEdge, ExtractedEvidence, ExtractedNode, ExtractionResult};

fn quoted_value(line: &str, key: &str) -> Option<String> {
    static RE_CACHE: OnceLock<std::sync::Mutex<BTreeMap<String, Regex>>> = OnceLock::new();
    let cache = RE_CACHE.get_or_init(|| std::sync::Mutex::new(BTreeMap::new()));
    let mut cache = cache.lock().unwrap();
    let re = cache.entry(key.to_string()).or_insert_with(|| {
        Regex::new(&format!(r#"(?i)^\s*{key}\s+"([^"]*)""#)).unwrap()
    });
    re.captures(line).map(|c| c[1].to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Job,
    Stage,
    Link,
}

pub fn extract(file_path: &str, content: &str) -> ExtractionResult {
    let mut result = ExtractionResult::new("dsx_walker", file_path);

    let mut job_node_id: Option<String> = None;
    let mut stack: Vec<Block> = Vec::new();
    let mut pending_name: Option<String> = None;

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("BEGIN DSJOB") {
            stack.push(Block::Job);
            pending_name = None;
            continue;
        }
        if trimmed.eq_ignore_ascii_case("BEGIN DSSTAGE") {
            stack.push(Block::Stage);
            pending_name = None;
            continue;
        }
        if trimmed.eq_ignore_ascii_case("BEGIN DSLINK") {
            stack.push(Block::Link);
            pending_name = None;
            continue;
        }
        if trimmed.eq_ignore_ascii_case("END DSJOB")
            || trimmed.eq_ignore_ascii_case("END DSSTAGE")
            || trimmed.eq_ignore_ascii_case("END DSLINK")
        {
            stack.pop();
            continue;
        }

        if let Some(name) = quoted_value(trimmed, "Identifier").or_else(|| quoted_value(trimmed, "Name")) {
            pending_name = Some(name);
        }

        match (stack.last(), &pending_name) {
            (Some(Block::Job), Some(name)) if job_node_id.is_none() => {
                let node_id = format!("dsjob::{name}");
                result.nodes.push(ExtractedNode {
                    node_id: node_id.clone(),
                    node_type: "PROCESS".to_string(),
                    name: name.clone(),
                    system: "datastage".to_string(),
                    attributes: BTreeMap::new(),
                });
                job_node_id = Some(node_id);
                pending_name = None;
            }
            (Some(Block::Stage), Some(name)) => {
                emit_child(&mut result, file_path, &job_node_id, name, "COMPONENT_TRANSFORM", line_no);
                pending_name = None;
            }
            (Some(Block::Link), Some(name)) => {
                emit_child(&mut result, file_path, &job_node_id, name, "COMPONENT_TRANSFORM", line_no);
                pending_name = None;
            }
            _ => {}
        }
    }

    result
}

fn emit_child(
    result: &mut ExtractionResult,
    file_path: &str,
    job_node_id: &Option<String>,
    name: &str,
    node_type: &str,
    line_no: usize,
) {
    let Some(job_node_id) = job_node_id else { return };
    let child_id = format!("{job_node_id}::{name}");
    if result.nodes.iter().any(|n| n.node_id == child_id) {
        return;
    }
    result.nodes.push(ExtractedNode {
        node_id: child_id.clone(),
        node_type: node_type.to_string(),
        name: name.to_string(),
        system: "datastage".to_string(),
        attributes: BTreeMap::new(),
    });
    let evidence_idx = result.evidences.len();
    result.evidences.push(ExtractedEvidence {
        file_path: file_path.to_string(),
        kind: "code".to_string(),
        line_start: Some(line_no as u32 + 1),
        line_end: None,
        xpath: None,
        snippet: name.to_string(),
        hash: None,
    });
    result.edges.push(ExtractedEdge {
        from_node_id: job_node_id.clone(),
        to_node_id: child_id,
        edge_type: "CONTAINS".to_string(),
        confidence: 0.7,
        is_hypothesis: false,
        rationale: None,
        evidence_refs: vec![evidence_idx],
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        BEGIN DSJOB
        Identifier "LoadCustomers"
        BEGIN DSSTAGE
        Name "TransformStage"
        StageType "Transformer"
        END DSSTAGE
        BEGIN DSLINK
        Name "LinkA"
        END DSLINK
        END DSJOB
    "#;

    #[test]
    fn job_and_stage_and_link_are_contained() {
        let result = extract("jobs/load.dsx", SAMPLE);
        assert!(result.nodes.iter().any(|n| n.node_type == "PROCESS" && n.name == "LoadCustomers"));
        assert!(result.nodes.iter().any(|n| n.name == "TransformStage"));
        assert!(result.nodes.iter().any(|n| n.name == "LinkA"));
        assert_eq!(result.edges.iter().filter(|e| e.edge_type == "CONTAINS").count(), 2);
    }
}

//! Deterministic SQL/DDL macro extractor (`spec.md` §4.B): splits on
//! `GO` batch separators, finds table references via regex, and emits
//! `READS_FROM`/`WRITES_TO`/`CREATES` edges from the file node. CTEs
//! declared within a statement are not emitted as table nodes.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use strata_protocol::{ExtractedEdge, ExtractedEvidence, ExtractedNode, ExtractionResult};

fn go_splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^\s*GO\s*$").unwrap())
}

fn cte_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bWITH\s+(\w+)\s+AS\s*\(|,\s*(\w+)\s+AS\s*\(").unwrap())
}

const TABLE_IDENT: &str = r"([\[\]a-zA-Z0-9_\.]+)";

fn from_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)\bFROM\s+{TABLE_IDENT}")).unwrap())
}

fn join_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)\bJOIN\s+{TABLE_IDENT}")).unwrap())
}

fn insert_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)\bINSERT\s+INTO\s+{TABLE_IDENT}")).unwrap())
}

fn update_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)\bUPDATE\s+{TABLE_IDENT}")).unwrap())
}

fn merge_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)\bMERGE\s+(?:INTO\s+)?{TABLE_IDENT}")).unwrap())
}

fn create_table_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?i)\bCREATE\s+TABLE\s+{TABLE_IDENT}")).unwrap())
}

fn normalize_ident(raw: &str) -> String {
    raw.replace(['[', ']'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RefKind {
    Reads,
    Writes,
    Creates,
}

pub fn extract(file_path: &str, content: &str) -> ExtractionResult {
    let mut result = ExtractionResult::new("sql_parser", file_path);

    let file_node_id = file_path.to_string();
    let basename = file_path.rsplit('/').next().unwrap_or(file_path).to_string();
    result.nodes.push(ExtractedNode {
        node_id: file_node_id.clone(),
        node_type: "FILE".to_string(),
        name: basename,
        system: "unknown".to_string(),
        attributes: BTreeMap::new(),
    });

    let mut table_refs: BTreeMap<String, RefKind> = BTreeMap::new();

    for statement in go_splitter().split(content) {
        let cte_names: std::collections::HashSet<String> = cte_pattern()
            .captures_iter(statement)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_ascii_lowercase())
            .collect();

        let mut record = |pattern: &Regex, kind: RefKind, stmt: &str| {
            for cap in pattern.captures_iter(stmt) {
                let raw = cap.get(1).unwrap().as_str();
                let table = normalize_ident(raw);
                if cte_names.contains(&table.to_ascii_lowercase()) {
                    continue;
                }
                table_refs.entry(table).or_insert(kind);
            }
        };

        record(from_pattern(), RefKind::Reads, statement);
        record(join_pattern(), RefKind::Reads, statement);
        record(insert_pattern(), RefKind::Writes, statement);
        record(update_pattern(), RefKind::Writes, statement);
        record(merge_pattern(), RefKind::Writes, statement);
        record(create_table_pattern(), RefKind::Creates, statement);
    }

    for (table, kind) in &table_refs {
        result.nodes.push(ExtractedNode {
            node_id: table.clone(),
            node_type: "TABLE".to_string(),
            name: table.clone(),
            system: "unknown".to_string(),
            attributes: BTreeMap::new(),
        });

        let evidence_idx = result.evidences.len();
        result.evidences.push(ExtractedEvidence {
            file_path: file_path.to_string(),
            kind: "regex_match".to_string(),
            line_start: None,
            line_end: None,
            xpath: None,
            snippet: table.clone(),
            hash: None,
        });

        let edge_type = match kind {
            RefKind::Reads => "READS_FROM",
            RefKind::Writes => "WRITES_TO",
            RefKind::Creates => "CREATES",
        };
        result.edges.push(ExtractedEdge {
            from_node_id: file_node_id.clone(),
            to_node_id: table.clone(),
            edge_type: edge_type.to_string(),
            confidence: 0.9,
            is_hypothesis: false,
            rationale: None,
            evidence_refs: vec![evidence_idx],
        });
    }

    result
}

//! The uniform extraction output every deterministic extractor and LLM
//! action produces (`spec.md` §4.B): `ExtractionResult { meta, nodes[],
//! edges[], evidences[], assumptions[] }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionMeta {
    pub extractor_id: String,
    pub file_path: String,
}

/// A node as produced by an extractor, keyed by a *local* `node_id` that is
/// only meaningful within one `ExtractionResult` — Catalog Sync resolves it
/// to a stable `AssetId` (`spec.md` §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedNode {
    pub node_id: String,
    pub node_type: String,
    pub name: String,
    pub system: String,
    pub attributes: BTreeMap<String, Value>,
}

impl ExtractedNode {
    /// Apply the normalization rules in `spec.md` §4.B: a missing/blank
    /// `node_id` is replaced with a deterministic placeholder, a missing
    /// `node_type`/`system` defaults to `"unknown"`.
    pub fn normalize(mut self, index: usize, job_prefix: &str) -> Self {
        if self.node_id.trim().is_empty() {
            self.node_id = format!("unnamed_node_{index}_{job_prefix}");
        }
        if self.node_type.trim().is_empty() {
            self.node_type = "unknown".to_string();
        }
        if self.system.trim().is_empty() {
            self.system = "unknown".to_string();
        }
        if self.name.trim().is_empty() {
            self.name = self.node_id.clone();
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEdge {
    pub from_node_id: String,
    pub to_node_id: String,
    pub edge_type: String,
    pub confidence: f64,
    pub is_hypothesis: bool,
    pub rationale: Option<String>,
    /// Indices into the sibling `evidences` vector this edge is supported by.
    pub evidence_refs: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEvidence {
    pub file_path: String,
    pub kind: String,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
    pub xpath: Option<String>,
    pub snippet: String,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub meta: ExtractionMeta,
    pub nodes: Vec<ExtractedNode>,
    pub edges: Vec<ExtractedEdge>,
    pub evidences: Vec<ExtractedEvidence>,
    pub assumptions: Vec<String>,
}

impl ExtractionResult {
    pub fn new(extractor_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            meta: ExtractionMeta {
                extractor_id: extractor_id.into(),
                file_path: file_path.into(),
            },
            ..Default::default()
        }
    }
}

/// Deep-dive output: package components, transformation IR, and
/// column-level lineage for a single file (`spec.md` GLOSSARY: Deep-dive).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepDiveResult {
    pub package_id: String,
    pub package_name: String,
    pub components: Vec<DeepDiveComponent>,
    pub transformations: Vec<DeepDiveTransformation>,
    pub column_lineage: Vec<DeepDiveColumnLineage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepDiveComponent {
    pub component_id: String,
    pub name: String,
    pub component_type: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepDiveTransformation {
    pub source_component_id: Option<String>,
    pub operation: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepDiveColumnLineage {
    /// Either a node_id from the macro extraction, a dotted
    /// `"schema.table.col"` reference, or a raw asset UUID string
    /// (`spec.md` §4.F: "The asset resolver also accepts names and
    /// `node_id`s ... and may infer an asset from a dotted column").
    pub source_ref: Option<String>,
    pub source_column: String,
    pub target_ref: Option<String>,
    pub target_column: String,
    pub transformation_rule: Option<String>,
    pub confidence: f64,
}

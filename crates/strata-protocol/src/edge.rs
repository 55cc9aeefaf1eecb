//! Edge: a typed relationship between two assets (`spec.md` §3 Edge).

use crate::enums::EdgeType;
use serde::{Deserialize, Serialize};
use strata_ids::{AssetId, EdgeId, SolutionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub project_id: SolutionId,
    pub from_asset_id: AssetId,
    pub to_asset_id: AssetId,
    pub edge_type: EdgeType,
    pub confidence: f64,
    pub is_hypothesis: bool,
    pub extractor_id: String,
    pub rationale: Option<String>,
}

impl Edge {
    /// The `(project_id, from, to, edge_type)` dedup key (`spec.md` §3 Edge).
    pub fn dedup_key(&self) -> (SolutionId, AssetId, AssetId, EdgeType) {
        (
            self.project_id.clone(),
            self.from_asset_id.clone(),
            self.to_asset_id.clone(),
            self.edge_type,
        )
    }

    pub fn new(
        project_id: SolutionId,
        from_asset_id: AssetId,
        to_asset_id: AssetId,
        edge_type: EdgeType,
        confidence: f64,
        extractor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            project_id,
            from_asset_id,
            to_asset_id,
            edge_type,
            confidence: confidence.clamp(0.0, 1.0),
            is_hypothesis: confidence < 1.0,
            extractor_id: extractor_id.into(),
            rationale: None,
        }
    }
}

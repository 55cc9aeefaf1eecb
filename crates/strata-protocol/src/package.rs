//! Deep-dive model: Package / Component / Transformation IR / Column
//! Lineage (`spec.md` §3 "Package / Component / Transformation / Column
//! Lineage").

use crate::enums::{ComponentType, Operation};
use serde::{Deserialize, Serialize};
use strata_ids::{AssetId, ColumnLineageId, ComponentId, PackageId, SolutionId, TransformationId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub project_id: SolutionId,
    pub name: String,
    pub source_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageComponent {
    pub id: ComponentId,
    pub package_id: PackageId,
    pub name: String,
    pub component_type: ComponentType,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationIr {
    pub id: TransformationId,
    pub package_id: PackageId,
    /// The component that emitted this transformation, if it sanitized
    /// cleanly (`spec.md` §4.F: "null out invalid `source_component_id`").
    pub source_component_id: Option<ComponentId>,
    pub operation: Operation,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnLineage {
    pub id: ColumnLineageId,
    pub project_id: SolutionId,
    pub source_asset_id: Option<AssetId>,
    pub source_column: String,
    pub target_asset_id: Option<AssetId>,
    pub target_column: String,
    pub transformation_rule: Option<String>,
    pub confidence: f64,
}

impl ColumnLineage {
    /// A column lineage row bridges into `edge_index` as `DETAILED_LINEAGE`
    /// only when both endpoints resolved to a real asset (`spec.md` §3,
    /// §4.F, §8 invariant).
    pub fn both_endpoints_resolved(&self) -> bool {
        self.source_asset_id.is_some() && self.target_asset_id.is_some()
    }
}

//! Asset (Node): a logical data object (`spec.md` §3 Asset).

use crate::enums::AssetType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strata_ids::AssetId;
use strata_ids::SolutionId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub project_id: SolutionId,
    pub asset_type: AssetType,
    pub name_display: String,
    pub canonical_name: String,
    pub system: String,
    /// Open attribute map; includes parsed columns, schema, `package_id`
    /// linkage, and (for bridged components) `component_id`.
    pub tags: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// The `(project_id, name_display, asset_type)` dedup key
    /// (`spec.md` §3 Asset, §8 idempotence invariant).
    pub fn dedup_key(&self) -> (SolutionId, String, AssetType) {
        (
            self.project_id.clone(),
            self.name_display.clone(),
            self.asset_type,
        )
    }

    pub fn new(
        project_id: SolutionId,
        asset_type: AssetType,
        name_display: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        let name_display = name_display.into();
        let now = Utc::now();
        Self {
            id: AssetId::new(),
            project_id,
            asset_type,
            canonical_name: name_display.clone(),
            name_display,
            system: system.into(),
            tags: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

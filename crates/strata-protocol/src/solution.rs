//! Solution: a project/workspace (`spec.md` §3).

use crate::enums::SolutionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_ids::SolutionId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    pub display_name: String,
    /// Artifact reference: archive path, git URL, `local://...`, or bucket key.
    pub storage_path: String,
    pub status: SolutionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Solution {
    pub fn new(display_name: impl Into<String>, storage_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SolutionId::new(),
            display_name: display_name.into(),
            storage_path: storage_path.into(),
            status: SolutionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

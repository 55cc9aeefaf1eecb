//! Audit Snapshot: a point-in-time coverage report (`spec.md` §3, §4.I).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_ids::{AuditSnapshotId, SolutionId};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AuditMetrics {
    pub total_assets: u64,
    pub total_relationships: u64,
    pub coverage_score: f64,
    pub avg_confidence: f64,
    pub hypothesis_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSnapshot {
    pub id: AuditSnapshotId,
    pub project_id: SolutionId,
    pub metrics: AuditMetrics,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

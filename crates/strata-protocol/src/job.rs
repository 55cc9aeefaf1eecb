//! Job: a single discovery run over a solution (`spec.md` §3, §4.H).

use crate::enums::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_ids::{JobId, PlanId, SolutionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub solution_id: SolutionId,
    pub status: JobStatus,
    pub current_stage: String,
    pub progress_pct: u8,
    pub plan_id: Option<PlanId>,
    pub requires_approval: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Construct a fresh job as created on submit (`spec.md` §6 `submit`).
    ///
    /// Per the spec's Open Question resolution: fresh submissions default
    /// `requires_approval = true`; re-runs of an already-approved solution
    /// should pass `false` explicitly.
    pub fn new_submission(solution_id: SolutionId, requires_approval: bool) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            solution_id,
            status: JobStatus::Queued,
            current_stage: "ingest".to_string(),
            progress_pct: 0,
            plan_id: None,
            requires_approval,
            started_at: None,
            finished_at: None,
            error_message: None,
            error_details: None,
            created_at: now,
            updated_at: now,
        }
    }
}

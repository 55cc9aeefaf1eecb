//! Queue Entry: a claimable token referencing a job (`spec.md` §3, §4.G).

use crate::enums::QueueStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_ids::{JobId, QueueEntryId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: QueueEntryId,
    pub job_id: JobId,
    pub status: QueueStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(job_id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id: QueueEntryId::new(),
            job_id,
            status: QueueStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

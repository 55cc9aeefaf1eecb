//! SQL-backed job queue (`spec.md` §4.G).
//!
//! FIFO with single-flight atomic claim: `enqueue` → `claim_next` →
//! `complete`/`fail`. Multiple workers may race `claim_next`; exactly one
//! wins per entry (`strata_db::LineageStore::claim_next`).

pub mod error;

pub use error::{QueueError, Result};

use std::sync::Arc;
use std::time::Duration;
use strata_db::LineageStore;
use strata_ids::{JobId, QueueEntryId};
use strata_protocol::QueueEntry;
use tracing::{debug, info};

/// How long a worker sleeps between empty polls (`spec.md` §4.G).
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct JobQueue {
    store: Arc<LineageStore>,
}

impl JobQueue {
    pub fn new(store: Arc<LineageStore>) -> Self {
        Self { store }
    }

    pub async fn enqueue(&self, job_id: &JobId) -> Result<QueueEntryId> {
        let id = self.store.enqueue(job_id).await?;
        info!(%job_id, "enqueued job");
        Ok(id)
    }

    pub async fn claim_next(&self) -> Result<Option<QueueEntry>> {
        let claimed = self.store.claim_next().await?;
        if let Some(entry) = &claimed {
            info!(job_id = %entry.job_id, attempt = entry.attempts, "claimed queue entry");
        }
        Ok(claimed)
    }

    pub async fn complete(&self, id: &QueueEntryId) -> Result<()> {
        self.store.complete_queue_entry(id).await?;
        Ok(())
    }

    pub async fn fail(&self, id: &QueueEntryId, error: &str) -> Result<()> {
        self.store.fail_queue_entry(id, error).await?;
        Ok(())
    }

    /// Block until an entry can be claimed, sleeping `POLL_INTERVAL`
    /// between empty polls. Runs until claimed or `cancel` resolves.
    pub async fn claim_next_blocking(
        &self,
        cancel: impl std::future::Future<Output = ()>,
    ) -> Result<Option<QueueEntry>> {
        tokio::pin!(cancel);
        loop {
            if let Some(entry) = self.claim_next().await? {
                return Ok(Some(entry));
            }
            debug!("queue empty, sleeping");
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => continue,
                _ = &mut cancel => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::{Job, QueueStatus, Solution};

    async fn seeded_queue() -> (JobQueue, JobId) {
        let store = Arc::new(LineageStore::open(None).await.unwrap());
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        let job = Job::new_submission(solution.id, true);
        store.insert_job(&job).await.unwrap();
        (JobQueue::new(store), job.id)
    }

    #[tokio::test]
    async fn enqueue_claim_complete_round_trips() {
        let (queue, job_id) = seeded_queue().await;
        let entry_id = queue.enqueue(&job_id).await.unwrap();

        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id, entry_id);

        queue.complete(&entry_id).await.unwrap();
    }

    #[tokio::test]
    async fn racing_claims_only_one_winner() {
        let (queue, job_id) = seeded_queue().await;
        queue.enqueue(&job_id).await.unwrap();

        let a = queue.claim_next().await.unwrap();
        let b = queue.claim_next().await.unwrap();
        assert!(a.is_some());
        assert!(b.is_none());
    }

    #[tokio::test]
    async fn fail_records_last_error() {
        let (queue, job_id) = seeded_queue().await;
        let entry_id = queue.enqueue(&job_id).await.unwrap();
        queue.claim_next().await.unwrap();

        queue.fail(&entry_id, "ingest_error: 404").await.unwrap();
        let entry = queue.store.get_queue_entry(&entry_id).await.unwrap();
        assert_eq!(entry.status, QueueStatus::Failed);
        assert_eq!(entry.last_error.as_deref(), Some("ingest_error: 404"));
    }
}

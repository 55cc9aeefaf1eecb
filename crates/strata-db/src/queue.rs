//! Queue Entry persistence (`spec.md` §4.G Job Queue).
//!
//! `claim_next` is a single atomic `UPDATE ... WHERE id = (SELECT ...)
//! RETURNING *` rather than the select-then-update transaction the
//! teacher uses, so the at-most-one-claim invariant holds without relying
//! on transaction isolation.

use crate::error::{DbError, Result};
use crate::LineageStore;
use chrono::{DateTime, Utc};
use strata_ids::{JobId, QueueEntryId};
use strata_protocol::{QueueEntry, QueueStatus};

impl LineageStore {
    pub async fn enqueue(&self, job_id: &JobId) -> Result<QueueEntryId> {
        let entry = QueueEntry::new(job_id.clone());
        sqlx::query(
            r#"INSERT INTO job_queue (id, job_id, status, attempts, last_error, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&entry.id)
        .bind(&entry.job_id)
        .bind(entry.status)
        .bind(entry.attempts as i64)
        .bind(&entry.last_error)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(entry.id)
    }

    /// Atomically claim the oldest pending entry, or `None` if the queue
    /// is empty or every pending entry was claimed by a racing worker.
    pub async fn claim_next(&self) -> Result<Option<QueueEntry>> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, QueueEntryRow>(
            r#"UPDATE job_queue
               SET status = ?, attempts = attempts + 1, updated_at = ?
               WHERE id = (
                   SELECT id FROM job_queue WHERE status = ? ORDER BY created_at LIMIT 1
               )
               AND status = ?
               RETURNING id, job_id, status, attempts, last_error, created_at, updated_at"#,
        )
        .bind(QueueStatus::Processing)
        .bind(now)
        .bind(QueueStatus::Pending)
        .bind(QueueStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn complete_queue_entry(&self, id: &QueueEntryId) -> Result<()> {
        let rows = sqlx::query("UPDATE job_queue SET status = ?, updated_at = ? WHERE id = ?")
            .bind(QueueStatus::Completed)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("queue entry {id} not found")));
        }
        Ok(())
    }

    pub async fn fail_queue_entry(&self, id: &QueueEntryId, error: &str) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE job_queue SET status = ?, last_error = ?, updated_at = ? WHERE id = ?",
        )
        .bind(QueueStatus::Failed)
        .bind(error)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("queue entry {id} not found")));
        }
        Ok(())
    }

    pub async fn get_queue_entry(&self, id: &QueueEntryId) -> Result<QueueEntry> {
        let row = sqlx::query_as::<_, QueueEntryRow>(
            r#"SELECT id, job_id, status, attempts, last_error, created_at, updated_at
               FROM job_queue WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| DbError::not_found(format!("queue entry {id} not found")))
    }
}

#[derive(sqlx::FromRow)]
struct QueueEntryRow {
    id: QueueEntryId,
    job_id: JobId,
    status: QueueStatus,
    attempts: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<QueueEntryRow> for QueueEntry {
    fn from(row: QueueEntryRow) -> Self {
        QueueEntry {
            id: row.id,
            job_id: row.job_id,
            status: row.status,
            attempts: row.attempts as u32,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::{Job, Solution};

    async fn seeded_job(store: &LineageStore) -> JobId {
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        let job = Job::new_submission(solution.id, true);
        store.insert_job(&job).await.unwrap();
        job.id
    }

    #[tokio::test]
    async fn claim_next_returns_oldest_pending_only_once() {
        let store = LineageStore::open(None).await.unwrap();
        let job_id = seeded_job(&store).await;
        store.enqueue(&job_id).await.unwrap();

        let claimed = store.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.status, QueueStatus::Processing);
        assert_eq!(claimed.attempts, 1);

        let second = store.claim_next().await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn claim_next_on_empty_queue_returns_none() {
        let store = LineageStore::open(None).await.unwrap();
        assert!(store.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_then_fail_transitions() {
        let store = LineageStore::open(None).await.unwrap();
        let job_id = seeded_job(&store).await;
        let entry_id = store.enqueue(&job_id).await.unwrap();
        store.claim_next().await.unwrap();

        store.complete_queue_entry(&entry_id).await.unwrap();
        let entry = store.get_queue_entry(&entry_id).await.unwrap();
        assert_eq!(entry.status, QueueStatus::Completed);
    }
}

//! Job CRUD (`spec.md` §3 Job, §4.H orchestrator state machine).

use crate::error::{DbError, Result};
use crate::LineageStore;
use chrono::{DateTime, Utc};
use strata_ids::{JobId, PlanId, SolutionId};
use strata_protocol::{Job, JobStatus};

impl LineageStore {
    pub async fn insert_job(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO job_run
               (id, solution_id, status, current_stage, progress_pct, plan_id,
                requires_approval, started_at, finished_at, error_message,
                error_details, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&job.id)
        .bind(&job.solution_id)
        .bind(job.status)
        .bind(&job.current_stage)
        .bind(job.progress_pct as i64)
        .bind(&job.plan_id)
        .bind(job.requires_approval)
        .bind(job.started_at)
        .bind(job.finished_at)
        .bind(&job.error_message)
        .bind(&job.error_details)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_job(&self, id: &JobId) -> Result<Job> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"SELECT id, solution_id, status, current_stage, progress_pct, plan_id,
                      requires_approval, started_at, finished_at, error_message,
                      error_details, created_at, updated_at
               FROM job_run WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| DbError::not_found(format!("job {id} not found")))
    }

    pub async fn set_job_plan(&self, id: &JobId, plan_id: &PlanId) -> Result<()> {
        sqlx::query("UPDATE job_run SET plan_id = ?, updated_at = ? WHERE id = ?")
            .bind(plan_id)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_job_status(&self, id: &JobId, status: JobStatus) -> Result<()> {
        let rows = sqlx::query("UPDATE job_run SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("job {id} not found")));
        }
        Ok(())
    }

    pub async fn set_job_progress(&self, id: &JobId, stage: &str, pct: u8) -> Result<()> {
        sqlx::query(
            "UPDATE job_run SET current_stage = ?, progress_pct = ?, updated_at = ? WHERE id = ?",
        )
        .bind(stage)
        .bind(pct as i64)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_job_started(&self, id: &JobId) -> Result<()> {
        let now = Utc::now();
        sqlx::query("UPDATE job_run SET status = ?, started_at = ?, updated_at = ? WHERE id = ?")
            .bind(JobStatus::Running)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_job_finished(
        &self,
        id: &JobId,
        status: JobStatus,
        error_message: Option<&str>,
        error_details: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"UPDATE job_run
               SET status = ?, finished_at = ?, error_message = ?, error_details = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(status)
        .bind(now)
        .bind(error_message)
        .bind(error_details)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_jobs_for_solution(&self, solution_id: &SolutionId) -> Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"SELECT id, solution_id, status, current_stage, progress_pct, plan_id,
                      requires_approval, started_at, finished_at, error_message,
                      error_details, created_at, updated_at
               FROM job_run WHERE solution_id = ? ORDER BY created_at"#,
        )
        .bind(solution_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: JobId,
    solution_id: SolutionId,
    status: JobStatus,
    current_stage: String,
    progress_pct: i64,
    plan_id: Option<PlanId>,
    requires_approval: bool,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    error_details: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            solution_id: row.solution_id,
            status: row.status,
            current_stage: row.current_stage,
            progress_pct: row.progress_pct as u8,
            plan_id: row.plan_id,
            requires_approval: row.requires_approval,
            started_at: row.started_at,
            finished_at: row.finished_at,
            error_message: row.error_message,
            error_details: row.error_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::Solution;

    async fn seeded_solution(store: &LineageStore) -> SolutionId {
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        solution.id
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = LineageStore::open(None).await.unwrap();
        let solution_id = seeded_solution(&store).await;
        let job = Job::new_submission(solution_id, true);
        store.insert_job(&job).await.unwrap();

        let fetched = store.get_job(&job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Queued);
        assert!(fetched.requires_approval);
    }

    #[tokio::test]
    async fn set_job_started_marks_running() {
        let store = LineageStore::open(None).await.unwrap();
        let solution_id = seeded_solution(&store).await;
        let job = Job::new_submission(solution_id, false);
        store.insert_job(&job).await.unwrap();

        store.set_job_started(&job.id).await.unwrap();
        let fetched = store.get_job(&job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Running);
        assert!(fetched.started_at.is_some());
    }

    #[tokio::test]
    async fn set_job_finished_records_error() {
        let store = LineageStore::open(None).await.unwrap();
        let solution_id = seeded_solution(&store).await;
        let job = Job::new_submission(solution_id, false);
        store.insert_job(&job).await.unwrap();

        store
            .set_job_finished(&job.id, JobStatus::Failed, Some("boom"), None)
            .await
            .unwrap();
        let fetched = store.get_job(&job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("boom"));
    }
}

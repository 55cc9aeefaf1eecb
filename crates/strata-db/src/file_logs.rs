//! File Processing Log persistence (`spec.md` §3, §4.I Audit Logger).

use crate::error::{DbError, Result};
use crate::LineageStore;
use chrono::{DateTime, Utc};
use strata_ids::{FileLogId, JobId};
use strata_protocol::{FileLogStatus, FileProcessingLog};

impl LineageStore {
    pub async fn insert_file_log(&self, log: &FileProcessingLog) -> Result<()> {
        let fallback_chain = log
            .fallback_chain
            .as_ref()
            .map(|chain| serde_json::to_string(chain))
            .transpose()?;
        sqlx::query(
            r#"INSERT INTO file_processing_log
               (id, job_id, file_path, action_name, strategy_used, model_provider,
                model_used, fallback_used, fallback_chain, status, tokens_in, tokens_out,
                cost_estimate_usd, latency_ms, error_type, error_message, retry_count,
                nodes_extracted, edges_extracted, evidences_extracted, result_hash, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&log.id)
        .bind(&log.job_id)
        .bind(&log.file_path)
        .bind(&log.action_name)
        .bind(&log.strategy_used)
        .bind(&log.model_provider)
        .bind(&log.model_used)
        .bind(log.fallback_used)
        .bind(fallback_chain)
        .bind(log.status)
        .bind(log.tokens_in as i64)
        .bind(log.tokens_out as i64)
        .bind(log.cost_estimate_usd)
        .bind(log.latency_ms as i64)
        .bind(&log.error_type)
        .bind(&log.error_message)
        .bind(log.retry_count as i64)
        .bind(log.nodes_extracted as i64)
        .bind(log.edges_extracted as i64)
        .bind(log.evidences_extracted as i64)
        .bind(&log.result_hash)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_file_log_outcome(&self, log: &FileProcessingLog) -> Result<()> {
        let fallback_chain = log
            .fallback_chain
            .as_ref()
            .map(|chain| serde_json::to_string(chain))
            .transpose()?;
        let rows = sqlx::query(
            r#"UPDATE file_processing_log
               SET model_provider = ?, model_used = ?, fallback_used = ?, fallback_chain = ?,
                   status = ?, tokens_in = ?, tokens_out = ?, cost_estimate_usd = ?,
                   latency_ms = ?, error_type = ?, error_message = ?, retry_count = ?,
                   nodes_extracted = ?, edges_extracted = ?, evidences_extracted = ?,
                   result_hash = ?
               WHERE id = ?"#,
        )
        .bind(&log.model_provider)
        .bind(&log.model_used)
        .bind(log.fallback_used)
        .bind(fallback_chain)
        .bind(log.status)
        .bind(log.tokens_in as i64)
        .bind(log.tokens_out as i64)
        .bind(log.cost_estimate_usd)
        .bind(log.latency_ms as i64)
        .bind(&log.error_type)
        .bind(&log.error_message)
        .bind(log.retry_count as i64)
        .bind(log.nodes_extracted as i64)
        .bind(log.edges_extracted as i64)
        .bind(log.evidences_extracted as i64)
        .bind(&log.result_hash)
        .bind(&log.id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("file log {} not found", log.id)));
        }
        Ok(())
    }

    pub async fn list_file_logs_for_job(&self, job_id: &JobId) -> Result<Vec<FileProcessingLog>> {
        let rows = sqlx::query_as::<_, FileLogRow>(
            r#"SELECT id, job_id, file_path, action_name, strategy_used, model_provider,
                      model_used, fallback_used, fallback_chain, status, tokens_in, tokens_out,
                      cost_estimate_usd, latency_ms, error_type, error_message, retry_count,
                      nodes_extracted, edges_extracted, evidences_extracted, result_hash, created_at
               FROM file_processing_log WHERE job_id = ? ORDER BY created_at"#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct FileLogRow {
    id: FileLogId,
    job_id: JobId,
    file_path: String,
    action_name: String,
    strategy_used: String,
    model_provider: Option<String>,
    model_used: Option<String>,
    fallback_used: bool,
    fallback_chain: Option<String>,
    status: FileLogStatus,
    tokens_in: i64,
    tokens_out: i64,
    cost_estimate_usd: f64,
    latency_ms: i64,
    error_type: Option<String>,
    error_message: Option<String>,
    retry_count: i64,
    nodes_extracted: i64,
    edges_extracted: i64,
    evidences_extracted: i64,
    result_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<FileLogRow> for FileProcessingLog {
    type Error = DbError;

    fn try_from(row: FileLogRow) -> Result<Self> {
        let fallback_chain = row
            .fallback_chain
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(FileProcessingLog {
            id: row.id,
            job_id: row.job_id,
            file_path: row.file_path,
            action_name: row.action_name,
            strategy_used: row.strategy_used,
            model_provider: row.model_provider,
            model_used: row.model_used,
            fallback_used: row.fallback_used,
            fallback_chain,
            status: row.status,
            tokens_in: row.tokens_in as u64,
            tokens_out: row.tokens_out as u64,
            cost_estimate_usd: row.cost_estimate_usd,
            latency_ms: row.latency_ms as u64,
            error_type: row.error_type,
            error_message: row.error_message,
            retry_count: row.retry_count as u32,
            nodes_extracted: row.nodes_extracted as u32,
            edges_extracted: row.edges_extracted as u32,
            evidences_extracted: row.evidences_extracted as u32,
            result_hash: row.result_hash,
            created_at: row.created_at,
        })
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
    async fn insert_then_list_round_trips_fallback_chain() {
        let store = LineageStore::open(None).await.unwrap();
        let job_id = seeded_job(&store).await;
        let mut log = FileProcessingLog::pending(job_id.clone(), "a.dtsx", "deep_dive", "llm_action");
        log.fallback_chain = Some(vec!["gpt-4o".into(), "gpt-4o-mini".into()]);
        log.fallback_used = true;
        store.insert_file_log(&log).await.unwrap();

        let logs = store.list_file_logs_for_job(&job_id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].fallback_chain.as_deref(), Some(&["gpt-4o".to_string(), "gpt-4o-mini".to_string()][..]));
    }

    #[tokio::test]
    async fn update_outcome_marks_success() {
        let store = LineageStore::open(None).await.unwrap();
        let job_id = seeded_job(&store).await;
        let mut log = FileProcessingLog::pending(job_id, "a.sql", "parse", "parser_only");
        store.insert_file_log(&log).await.unwrap();

        log.status = FileLogStatus::Success;
        log.nodes_extracted = 3;
        store.update_file_log_outcome(&log).await.unwrap();

        let logs = store.list_file_logs_for_job(&log.job_id).await.unwrap();
        assert_eq!(logs[0].status, FileLogStatus::Success);
        assert_eq!(logs[0].nodes_extracted, 3);
    }
}

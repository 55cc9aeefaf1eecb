//! File Processing Log: one row per `(job, file, action)` (`spec.md` §3).

use crate::enums::FileLogStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_ids::{FileLogId, JobId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProcessingLog {
    pub id: FileLogId,
    pub job_id: JobId,
    pub file_path: String,
    pub action_name: String,
    pub strategy_used: String,
    pub model_provider: Option<String>,
    pub model_used: Option<String>,
    pub fallback_used: bool,
    pub fallback_chain: Option<Vec<String>>,
    pub status: FileLogStatus,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub cost_estimate_usd: f64,
    pub latency_ms: u64,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub nodes_extracted: u32,
    pub edges_extracted: u32,
    pub evidences_extracted: u32,
    pub result_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FileProcessingLog {
    pub fn pending(job_id: JobId, file_path: impl Into<String>, action_name: impl Into<String>, strategy_used: impl Into<String>) -> Self {
        Self {
            id: FileLogId::new(),
            job_id,
            file_path: file_path.into(),
            action_name: action_name.into(),
            strategy_used: strategy_used.into(),
            model_provider: None,
            model_used: None,
            fallback_used: false,
            fallback_chain: None,
            status: FileLogStatus::Pending,
            tokens_in: 0,
            tokens_out: 0,
            cost_estimate_usd: 0.0,
            latency_ms: 0,
            error_type: None,
            error_message: None,
            retry_count: 0,
            nodes_extracted: 0,
            edges_extracted: 0,
            evidences_extracted: 0,
            result_hash: None,
            created_at: Utc::now(),
        }
    }
}

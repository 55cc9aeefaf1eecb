//! Audit Logger (`spec.md` §4.I): keeps in-flight `FileProcessingLog` rows
//! in memory keyed by `log_id`, writes the full row to the store only once
//! the item's outcome is known, and rolls per-project coverage metrics on
//! demand.

pub mod error;

pub use error::{AuditError, Result};

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use strata_db::LineageStore;
use strata_ids::{AuditSnapshotId, FileLogId, JobId, SolutionId};
use strata_protocol::{AuditMetrics, AuditSnapshot, FileLogStatus, FileProcessingLog};
use tracing::{debug, warn};

/// Fields known only once an item's extraction has run
/// (`spec.md` §3 File Processing Log).
#[derive(Debug, Clone, Default)]
pub struct CompletionOutcome {
    pub status: FileLogStatus,
    pub model_provider: Option<String>,
    pub model_used: Option<String>,
    pub fallback_used: bool,
    pub fallback_chain: Option<Vec<String>>,
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
}

pub struct AuditLogger {
    store: LineageStore,
    in_flight: Mutex<HashMap<FileLogId, FileProcessingLog>>,
}

impl AuditLogger {
    pub fn new(store: LineageStore) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Register an item's log row in memory and return its id. Nothing is
    /// written to the store until `complete` or `log_file_error`.
    pub fn start(
        &self,
        job_id: JobId,
        file_path: impl Into<String>,
        action_name: impl Into<String>,
        strategy_used: impl Into<String>,
    ) -> FileLogId {
        let log = FileProcessingLog::pending(job_id, file_path, action_name, strategy_used);
        let id = log.id.clone();
        self.in_flight.lock().unwrap().insert(id.clone(), log);
        id
    }

    /// Apply a successful (or fallback-exhausted) outcome and persist it.
    pub async fn complete(&self, log_id: &FileLogId, outcome: CompletionOutcome) -> Result<()> {
        let mut log = self.take(log_id)?;
        log.status = outcome.status;
        log.model_provider = outcome.model_provider;
        log.model_used = outcome.model_used;
        log.fallback_used = outcome.fallback_used;
        log.fallback_chain = outcome.fallback_chain;
        log.tokens_in = outcome.tokens_in;
        log.tokens_out = outcome.tokens_out;
        log.cost_estimate_usd = outcome.cost_estimate_usd;
        log.latency_ms = outcome.latency_ms;
        log.error_type = outcome.error_type;
        log.error_message = outcome.error_message;
        log.retry_count = outcome.retry_count;
        log.nodes_extracted = outcome.nodes_extracted;
        log.edges_extracted = outcome.edges_extracted;
        log.evidences_extracted = outcome.evidences_extracted;
        log.result_hash = outcome.result_hash;

        self.store.insert_file_log(&log).await?;
        debug!(log_id = %log.id, status = ?log.status, "file log persisted");
        Ok(())
    }

    /// A hard, pre-extraction failure for this item (e.g. the artifact
    /// couldn't even be read). Persists a `failed` row.
    pub async fn log_file_error(
        &self,
        log_id: &FileLogId,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Result<()> {
        let mut log = self.take(log_id)?;
        log.status = FileLogStatus::Failed;
        log.error_type = Some(error_type.into());
        log.error_message = Some(error_message.into());
        self.store.insert_file_log(&log).await?;
        warn!(log_id = %log.id, "file log persisted with error");
        Ok(())
    }

    fn take(&self, log_id: &FileLogId) -> Result<FileProcessingLog> {
        self.in_flight
            .lock()
            .unwrap()
            .remove(log_id)
            .ok_or_else(|| AuditError::UnknownLog(log_id.to_string()))
    }

    /// Compute coverage metrics and take a snapshot for `project_id`
    /// (`spec.md` §4.I).
    pub async fn snapshot(&self, project_id: &SolutionId) -> Result<AuditSnapshot> {
        let assets = self.store.list_assets(project_id).await?;
        let edges = self.store.list_edges(project_id).await?;
        let column_lineage = self.store.list_column_lineage(project_id).await?;

        let functional: Vec<_> = assets.iter().filter(|a| a.asset_type.is_functional()).collect();
        let connected: std::collections::HashSet<_> = edges
            .iter()
            .flat_map(|e| [e.from_asset_id.clone(), e.to_asset_id.clone()])
            .chain(
                column_lineage
                    .iter()
                    .flat_map(|c| [c.source_asset_id.clone(), c.target_asset_id.clone()])
                    .flatten(),
            )
            .collect();
        let connected_functional = functional
            .iter()
            .filter(|a| connected.contains(&a.id))
            .count();
        let coverage_score = if functional.is_empty() {
            100.0
        } else {
            (100.0 * connected_functional as f64 / functional.len() as f64).min(100.0)
        };

        let mut confidences: Vec<f64> = edges.iter().map(|e| e.confidence).collect();
        confidences.extend(column_lineage.iter().map(|c| c.confidence));
        let avg_confidence = if confidences.is_empty() {
            1.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };

        let hypothesis_ratio = if edges.is_empty() {
            0.0
        } else {
            100.0 * edges.iter().filter(|e| e.is_hypothesis).count() as f64 / edges.len() as f64
        };

        let total_relationships = edges.len() as u64 + column_lineage.len() as u64;

        let mut orphans: Vec<_> = functional
            .iter()
            .filter(|a| !connected.contains(&a.id))
            .map(|a| a.name_display.clone())
            .collect();
        orphans.sort();
        orphans.truncate(10);

        let low_confidence_cluster = edges.iter().filter(|e| e.confidence < 0.5).count();
        let mut gaps = orphans;
        if low_confidence_cluster > 0 {
            gaps.push(format!(
                "{low_confidence_cluster} edges with confidence below 0.5"
            ));
        }

        let mut recommendations = Vec::new();
        if coverage_score < 50.0 {
            recommendations.push(
                "coverage below 50%: rerun with a deep_scan plan to pick up more files".to_string(),
            );
        }
        if hypothesis_ratio > 50.0 {
            recommendations.push(
                "more than half of edges are unconfirmed hypotheses: review LLM-sourced edges"
                    .to_string(),
            );
        }
        if low_confidence_cluster > 0 {
            recommendations.push(format!(
                "{low_confidence_cluster} low-confidence edges: consider a deep-dive pass over their source files"
            ));
        }

        let snapshot = AuditSnapshot {
            id: AuditSnapshotId::new(),
            project_id: project_id.clone(),
            metrics: AuditMetrics {
                total_assets: assets.len() as u64,
                total_relationships,
                coverage_score,
                avg_confidence,
                hypothesis_ratio,
            },
            gaps,
            recommendations,
            created_at: Utc::now(),
        };
        self.store.insert_audit_snapshot(&snapshot).await?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::{Asset, AssetType, Edge, EdgeType, Job, Solution};

    async fn seeded_job(store: &LineageStore) -> (SolutionId, JobId) {
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        let job = Job::new_submission(solution.id.clone(), true);
        store.insert_job(&job).await.unwrap();
        (solution.id, job.id)
    }

    #[tokio::test]
    async fn completing_a_started_log_persists_the_full_row() {
        let store = LineageStore::open(None).await.unwrap();
        let (_project_id, job_id) = seeded_job(&store).await;
        let logger = AuditLogger::new(store.clone());

        let log_id = logger.start(job_id.clone(), "scripts/load.sql", "parse", "parser_only");
        logger
            .complete(
                &log_id,
                CompletionOutcome {
                    status: FileLogStatus::Success,
                    nodes_extracted: 2,
                    edges_extracted: 1,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let logs = store.list_file_logs_for_job(&job_id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, FileLogStatus::Success);
        assert_eq!(logs[0].nodes_extracted, 2);
    }

    #[tokio::test]
    async fn completing_an_unknown_log_id_is_an_error() {
        let store = LineageStore::open(None).await.unwrap();
        let logger = AuditLogger::new(store);
        let bogus = FileLogId::new();
        let err = logger
            .complete(&bogus, CompletionOutcome::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "validation_error");
    }

    #[tokio::test]
    async fn log_file_error_persists_a_failed_row() {
        let store = LineageStore::open(None).await.unwrap();
        let (_project_id, job_id) = seeded_job(&store).await;
        let logger = AuditLogger::new(store.clone());

        let log_id = logger.start(job_id.clone(), "broken.dtsx", "extract", "parser_only");
        logger
            .log_file_error(&log_id, "ingest_error", "file not found")
            .await
            .unwrap();

        let logs = store.list_file_logs_for_job(&job_id).await.unwrap();
        assert_eq!(logs[0].status, FileLogStatus::Failed);
        assert_eq!(logs[0].error_type.as_deref(), Some("ingest_error"));
    }

    #[tokio::test]
    async fn snapshot_computes_coverage_and_flags_orphans() {
        let store = LineageStore::open(None).await.unwrap();
        let (project_id, _job_id) = seeded_job(&store).await;
        let logger = AuditLogger::new(store.clone());

        let connected_a = Asset::new(project_id.clone(), AssetType::Table, "a", "sqlserver");
        let connected_b = Asset::new(project_id.clone(), AssetType::Table, "b", "sqlserver");
        let orphan = Asset::new(project_id.clone(), AssetType::Table, "orphan", "sqlserver");
        let a_id = store.upsert_asset(&connected_a).await.unwrap();
        let b_id = store.upsert_asset(&connected_b).await.unwrap();
        store.upsert_asset(&orphan).await.unwrap();

        let edge = Edge::new(project_id.clone(), a_id, b_id, EdgeType::ReadsFrom, 0.3, "sql_parser");
        store.upsert_edge(&edge).await.unwrap();

        let snapshot = logger.snapshot(&project_id).await.unwrap();
        assert_eq!(snapshot.metrics.total_assets, 3);
        assert!((snapshot.metrics.coverage_score - (200.0 / 3.0)).abs() < 0.01);
        assert!(snapshot.gaps.iter().any(|g| g.contains("orphan")));
        assert!(snapshot.gaps.iter().any(|g| g.contains("confidence below 0.5")));
        assert!(snapshot
            .recommendations
            .iter()
            .any(|r| r.contains("low-confidence")));
    }
}

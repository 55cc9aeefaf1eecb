//! Orchestrator (`spec.md` §4.H): the job lifecycle state machine.
//!
//! `queued -> running(ingest) -> running(planning) -> planning_ready ->
//! (approval) -> running(execution) -> completed`, with `failed` and
//! `cancelled` as the two other terminal states. One call to `run_job`
//! drives a claimed job through as much of that machine as it can in one
//! pass; re-entering the same `job_id` later (after approval, or after a
//! worker crash) picks up where the plan items' persisted `status` left
//! off rather than redoing finished work.

pub mod error;

pub use error::{OrchestratorError, Result};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::path::Path;
use strata_audit::{AuditLogger, CompletionOutcome};
use strata_catalog::CatalogSync;
use strata_db::LineageStore;
use strata_extract::llm::{routing::RoutingLoader, ActionRunner, LlmClient, Payload, Schema};
use strata_extract::registry::{self, RegistryResult};
use strata_extract::ExtractError;
use strata_fetch::ArtifactFetcher;
use strata_ids::JobId;
use strata_planner::Planner;
use strata_protocol::{
    DeepDiveResult, ExtractionResult, FileLogStatus, Job, JobStatus, PlanItem, PlanItemStatus,
    PlanMode, PlanStatus, Strategy,
};
use strata_queue::JobQueue;
use tracing::{info, warn};

/// Where a single `run_job` call left off. The caller (typically a worker
/// loop polling the queue) decides what this means for the queue entry:
/// `PlanPending` and `Completed` both release it as complete (the
/// re-enqueue for `PlanPending` comes later, from the approval endpoint);
/// `Cancelled` and `Failed` fail it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    PlanPending,
    Completed,
    Cancelled,
    Failed,
}

pub struct Orchestrator<C: LlmClient> {
    store: LineageStore,
    queue: JobQueue,
    fetcher: ArtifactFetcher,
    planner: Planner,
    catalog: CatalogSync,
    audit: AuditLogger,
    action_runner: ActionRunner<C>,
    routing: RoutingLoader,
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn mime_for(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("").to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// `sql`/`ddl` files classified `PARSER_PLUS_LLM`, and every `.dtsx`/`.dsx`
/// package, get a deep-dive pass (`spec.md` §4.H step 3.5).
fn deep_dive_applies(item: &PlanItem) -> bool {
    match item.file_type.as_str() {
        "dtsx" | "dsx" => true,
        "sql" | "ddl" => item.strategy == Strategy::ParserPlusLlm,
        _ => false,
    }
}

impl<C: LlmClient> Orchestrator<C> {
    pub fn new(
        store: LineageStore,
        queue: JobQueue,
        fetcher: ArtifactFetcher,
        planner: Planner,
        catalog: CatalogSync,
        audit: AuditLogger,
        action_runner: ActionRunner<C>,
        routing: RoutingLoader,
    ) -> Self {
        Self { store, queue, fetcher, planner, catalog, audit, action_runner, routing }
    }

    async fn fail_job(
        &self,
        job_id: &JobId,
        error_type: &'static str,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Result<JobOutcome> {
        let message = message.into();
        let details = details.into();
        self.store
            .set_job_finished(job_id, JobStatus::Failed, Some(&message), Some(&details))
            .await?;
        warn!(%job_id, error_type, %message, "job failed");
        Ok(JobOutcome::Failed)
    }

    /// Drive `job_id` through ingest, plan-check, execution, and
    /// post-process. See the module doc for what each `JobOutcome` means
    /// for the caller's queue entry.
    pub async fn run_job(&self, job_id: &JobId) -> Result<JobOutcome> {
        let job = self.store.get_job(job_id).await?;

        self.store.set_job_started(job_id).await?;
        self.store.set_job_progress(job_id, "ingest", 0).await?;

        let solution = match self.store.get_solution(&job.solution_id).await {
            Ok(s) => s,
            Err(e) => {
                return self
                    .fail_job(job_id, "ingest_error", "solution not found", e.to_string())
                    .await
            }
        };
        let local_root = match self.fetcher.fetch(job.solution_id.as_str(), &solution.storage_path) {
            Ok(p) => p,
            Err(e) => {
                return self
                    .fail_job(job_id, e.error_type(), "artifact fetch failed", e.to_string())
                    .await
            }
        };

        self.store.set_job_progress(job_id, "planning", 0).await?;
        let plan = match self.store.get_plan_for_job(job_id).await {
            Ok(plan) => plan,
            Err(_) => match self.planner.plan_job(&job, &local_root, PlanMode::Standard).await {
                Ok(plan) => plan,
                Err(e) => {
                    return self
                        .fail_job(job_id, "planner_error", "plan generation failed", e.to_string())
                        .await
                }
            },
        };
        if plan.status != PlanStatus::Approved {
            info!(%job_id, plan_id = %plan.id, status = ?plan.status, "plan not yet approved, waiting");
            return Ok(JobOutcome::PlanPending);
        }

        match self.execute(&job, &plan.id, &local_root).await {
            Ok(JobOutcome::Cancelled) => return Ok(JobOutcome::Cancelled),
            Ok(_) => {}
            Err(e) => {
                return self
                    .fail_job(job_id, e.error_type(), "execution failed", e.to_string())
                    .await
            }
        }

        let snapshot = self.audit.snapshot(&job.solution_id).await?;
        info!(%job_id, coverage = snapshot.metrics.coverage_score, "audit snapshot recorded");
        self.store.set_job_progress(job_id, "complete", 100).await?;
        self.store.set_job_finished(job_id, JobStatus::Completed, None, None).await?;
        Ok(JobOutcome::Completed)
    }

    /// Execute every enabled, not-yet-terminal item of `job`'s plan in
    /// `(area.order_index, item.order_index)` order (`spec.md` §4.H step 3,
    /// §5 ordering guarantee). Items already `completed`/`failed` from a
    /// prior run of this same job are left untouched, which is what makes
    /// re-entry resumable rather than a restart.
    async fn execute(&self, job: &Job, plan_id: &strata_ids::PlanId, local_root: &Path) -> Result<JobOutcome> {
        let items = self.store.list_plan_items(plan_id).await?;
        let total = items.len().max(1);

        for (i, item) in items.iter().enumerate() {
            if matches!(item.status, PlanItemStatus::Completed | PlanItemStatus::Failed) {
                continue;
            }
            if !item.enabled {
                continue;
            }

            let current = self.store.get_job(&job.id).await?;
            if current.status == JobStatus::Cancelled {
                info!(job_id = %job.id, "cancellation observed at item boundary");
                return Ok(JobOutcome::Cancelled);
            }

            let pct = ((i as f64 / total as f64) * 100.0).floor() as u8;
            self.store
                .set_job_progress(&job.id, &format!("processing: {}", basename(&item.path)), pct)
                .await?;

            if item.strategy == Strategy::Skip {
                self.store.set_plan_item_status(&item.id, PlanItemStatus::Completed).await?;
                continue;
            }

            self.store.set_plan_item_status(&item.id, PlanItemStatus::Running).await?;
            match self.process_item(job, item, local_root).await {
                Ok(()) => {
                    self.store.set_plan_item_status(&item.id, PlanItemStatus::Completed).await?;
                }
                Err(e) => {
                    warn!(path = %item.path, error = %e, "item failed, continuing with next item");
                    self.store.set_plan_item_status(&item.id, PlanItemStatus::Failed).await?;
                }
            }
        }

        Ok(JobOutcome::Completed)
    }

    /// Read, dispatch, sync, and (where it applies) deep-dive one plan
    /// item. Per-item failures are returned to the caller, never panicked
    /// on — `execute` isolates them (`spec.md` §7 propagation policy).
    async fn process_item(&self, job: &Job, item: &PlanItem, local_root: &Path) -> Result<()> {
        let full_path = local_root.join(&item.path);
        let bytes = std::fs::read(&full_path)
            .map_err(|source| OrchestratorError::Io { path: item.path.clone(), source })?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let log_id = self.audit.start(
            job.id.clone(),
            item.path.clone(),
            item.classifier.clone(),
            item.strategy.as_str().to_string(),
        );

        let dispatched = self.dispatch_item(job, item, &text, &bytes).await;
        let (mut result, deep_dive, completion) = match dispatched {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = self.audit.log_file_error(&log_id, e.error_type(), e.to_string()).await;
                return Err(e);
            }
        };
        self.audit.complete(&log_id, completion).await?;

        registry::normalize(&mut result, job.id.as_str());
        let sync_outcome =
            self.catalog.sync_extraction(&job.solution_id, &result, &item.file_hash).await?;

        let deep_dive = match deep_dive {
            Some(dd) => Some(dd),
            None if deep_dive_applies(item) => self.run_deep_dive_action(job, item, &text).await?,
            None => None,
        };
        if let Some(dd) = deep_dive {
            self.catalog
                .sync_deep_dive(&job.solution_id, &item.path, &dd, &sync_outcome)
                .await?;
        }

        Ok(())
    }

    /// Run the deterministic extractor for `item`, or the LLM/VLM action
    /// the registry names instead (`spec.md` §4.B/§4.C).
    async fn dispatch_item(
        &self,
        job: &Job,
        item: &PlanItem,
        text: &str,
        bytes: &[u8],
    ) -> Result<(ExtractionResult, Option<DeepDiveResult>, CompletionOutcome)> {
        match registry::extract(&item.path, text)? {
            RegistryResult::Extraction(result) => {
                let completion = CompletionOutcome {
                    status: FileLogStatus::Success,
                    nodes_extracted: result.nodes.len() as u32,
                    edges_extracted: result.edges.len() as u32,
                    evidences_extracted: result.evidences.len() as u32,
                    ..Default::default()
                };
                Ok((result, None, completion))
            }
            RegistryResult::ExtractionWithDeepDive(result, deep_dive) => {
                let completion = CompletionOutcome {
                    status: FileLogStatus::Success,
                    nodes_extracted: result.nodes.len() as u32,
                    edges_extracted: result.edges.len() as u32,
                    evidences_extracted: result.evidences.len() as u32,
                    ..Default::default()
                };
                Ok((result, Some(deep_dive), completion))
            }
            RegistryResult::LlmAction { action, vision } => {
                let profile = self.routing.resolve_action(action)?;
                let payload = if vision {
                    Payload::Vision {
                        mime: mime_for(&item.path).to_string(),
                        base64: STANDARD.encode(bytes),
                        prompt: text.to_string(),
                    }
                } else {
                    Payload::Text(text.to_string())
                };

                let outcome = self
                    .action_runner
                    .run(
                        action,
                        &profile,
                        Some(&job.solution_id),
                        payload,
                        &HashMap::new(),
                        Schema::Extraction,
                    )
                    .await?;

                let repaired = strata_extract::llm::runner::into_extraction(outcome.raw_value)?;
                let completion = CompletionOutcome {
                    status: FileLogStatus::Success,
                    model_provider: Some(outcome.provider),
                    model_used: Some(outcome.model_used),
                    fallback_used: outcome.fallback_used,
                    fallback_chain: Some(outcome.models_attempted),
                    tokens_in: outcome.tokens_in as u64,
                    tokens_out: outcome.tokens_out as u64,
                    cost_estimate_usd: outcome.cost_estimate_usd,
                    retry_count: outcome.retry_count,
                    nodes_extracted: repaired.nodes.len() as u32,
                    edges_extracted: repaired.edges.len() as u32,
                    evidences_extracted: repaired.evidences.len() as u32,
                    ..Default::default()
                };

                let mut result = ExtractionResult::new(format!("llm:{action}"), item.path.clone());
                result.nodes = repaired.nodes;
                result.edges = repaired.edges;
                result.evidences = repaired.evidences;
                result.assumptions = repaired.assumptions;
                Ok((result, None, completion))
            }
        }
    }

    /// Deep-dive is enrichment on top of an already-synced macro
    /// extraction: a failed deep-dive action is logged and the item still
    /// completes with whatever macro-level lineage it already has
    /// (`spec.md` §9 Open Question — see `DESIGN.md`).
    async fn run_deep_dive_action(
        &self,
        job: &Job,
        item: &PlanItem,
        text: &str,
    ) -> Result<Option<DeepDiveResult>> {
        const ACTION: &str = "extract.deep_dive";
        let profile = self.routing.resolve_action(ACTION)?;
        let log_id = self.audit.start(
            job.id.clone(),
            item.path.clone(),
            ACTION.to_string(),
            item.strategy.as_str().to_string(),
        );

        let run = self
            .action_runner
            .run(
                ACTION,
                &profile,
                Some(&job.solution_id),
                Payload::Text(text.to_string()),
                &HashMap::new(),
                Schema::PassThrough,
            )
            .await;

        match run {
            Ok(outcome) => match serde_json::from_value::<DeepDiveResult>(outcome.raw_value) {
                Ok(deep_dive) => {
                    self.audit
                        .complete(
                            &log_id,
                            CompletionOutcome {
                                status: FileLogStatus::Success,
                                model_provider: Some(outcome.provider),
                                model_used: Some(outcome.model_used),
                                fallback_used: outcome.fallback_used,
                                fallback_chain: Some(outcome.models_attempted),
                                tokens_in: outcome.tokens_in as u64,
                                tokens_out: outcome.tokens_out as u64,
                                cost_estimate_usd: outcome.cost_estimate_usd,
                                retry_count: outcome.retry_count,
                                nodes_extracted: deep_dive.components.len() as u32,
                                ..Default::default()
                            },
                        )
                        .await?;
                    Ok(Some(deep_dive))
                }
                Err(e) => {
                    let err = ExtractError::JsonParse(e.to_string());
                    self.audit.log_file_error(&log_id, err.error_type(), err.to_string()).await?;
                    warn!(path = %item.path, "deep-dive response failed to parse, skipping");
                    Ok(None)
                }
            },
            Err(e) => {
                self.audit.log_file_error(&log_id, e.error_type(), e.to_string()).await?;
                warn!(path = %item.path, "deep-dive action failed, skipping");
                Ok(None)
            }
        }
    }

    /// Run `job_id` and settle its queue entry accordingly: `PlanPending`
    /// and `Completed` release it as complete, `Cancelled` fails it with
    /// `"User Cancelled"`, any other failure fails it with the job's error
    /// message (`spec.md` §5 Cancellation).
    pub async fn process_claimed(&self, entry: &strata_protocol::QueueEntry) -> Result<JobOutcome> {
        let outcome = self.run_job(&entry.job_id).await?;
        match outcome {
            JobOutcome::PlanPending | JobOutcome::Completed => {
                self.queue.complete(&entry.id).await?;
            }
            JobOutcome::Cancelled => {
                self.queue.fail(&entry.id, "User Cancelled").await?;
            }
            JobOutcome::Failed => {
                let job = self.store.get_job(&entry.job_id).await?;
                let message = job.error_message.as_deref().unwrap_or("job failed");
                self.queue.fail(&entry.id, message).await?;
            }
        }
        Ok(outcome)
    }

    /// Long-running worker loop: block on the queue, process one claim at
    /// a time, repeat until `cancel` resolves (`spec.md` §5 Scheduling
    /// model: "each claimed job is processed on one worker start-to-finish").
    pub async fn worker_loop(&self, mut cancel: impl std::future::Future<Output = ()> + Unpin) -> Result<()> {
        loop {
            let entry = tokio::select! {
                biased;
                _ = &mut cancel => return Ok(()),
                entry = self.queue.claim_next_blocking(std::future::pending()) => entry?,
            };
            let Some(entry) = entry else { return Ok(()) };
            if let Err(e) = self.process_claimed(&entry).await {
                warn!(job_id = %entry.job_id, error = %e, "worker loop: job processing error");
            }
        }
    }
}

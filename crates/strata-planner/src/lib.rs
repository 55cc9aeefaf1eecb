//! Planner (`spec.md` §4.D): breadth-first walk of the artifact root,
//! per-file classification through the Policy Engine, cost/time
//! estimation, and a persisted `Plan` ready for approval.

pub mod error;

pub use error::{PlannerError, Result};

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use strata_db::LineageStore;
use strata_ids::{JobId, PlanId, PlanItemId};
use strata_policy::{classify, decide_action, estimate, FileMeta};
use strata_protocol::{
    Area, Job, JobStatus, Plan, PlanItem, PlanItemStatus, PlanMode, PlanStatus, PlanSummary,
    RecommendedAction, Strategy,
};
use strata_queue::JobQueue;
use tracing::info;

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}

/// Human-readable classification label, mirroring the predicate that
/// `strata_policy::classify` matched (`spec.md` §4.D table) — distinct from
/// both `file_type` (the raw extension) and the skip/review reason.
fn classifier_label(meta: &FileMeta, action: RecommendedAction) -> &'static str {
    if action == RecommendedAction::Skip {
        return "skipped";
    }
    let ext = meta.extension();
    let path_lower = meta.path.to_ascii_lowercase();
    if matches!(ext.as_str(), "sql" | "ddl") || path_lower.contains("schema") || path_lower.contains("migration") {
        return "schema_sql";
    }
    if matches!(ext.as_str(), "md" | "json" | "txt")
        && (path_lower.contains("readme") || path_lower.contains("contract") || path_lower.contains("docs"))
    {
        return "documentation";
    }
    if matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp") {
        return "diagram_image";
    }
    if matches!(ext.as_str(), "dtsx" | "dsx") {
        return "etl_package";
    }
    if path_lower.contains("jobs") || path_lower.contains("pipelines") {
        return "pipeline_definition";
    }
    if matches!(ext.as_str(), "py" | "sh" | "bat" | "ps1") {
        return "script";
    }
    if matches!(ext.as_str(), "xml" | "config" | "yaml" | "yml" | "env") {
        return "configuration";
    }
    "other"
}

/// Forward-slash, root-relative path — stable across OSes and used as the
/// `(project_id, file_path, file_hash)` rerun-idempotence key.
fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

pub struct Planner {
    store: LineageStore,
    queue: JobQueue,
}

impl Planner {
    pub fn new(store: LineageStore, queue: JobQueue) -> Self {
        Self { store, queue }
    }

    /// Walk `artifact_root`, classify and estimate every file, and persist
    /// `Plan(status=ready)` with its areas and items. Sets `job.plan_id`
    /// and `job.status=planning_ready`. When `job.requires_approval` is
    /// false the plan and job are advanced straight to `approved`/`queued`
    /// and re-enqueued, matching the "auto-approves in the same
    /// transaction" wording in `spec.md` §4.D.
    pub async fn plan_job(
        &self,
        job: &Job,
        artifact_root: &Path,
        mode: PlanMode,
    ) -> Result<Plan> {
        let mut plan = Plan::draft(job.id.clone(), mode);
        let mut by_area: HashMap<Area, Vec<PlanItem>> = HashMap::new();
        for area in Area::ORDER {
            by_area.insert(area, Vec::new());
        }

        for entry in walkdir::WalkDir::new(artifact_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let bytes = std::fs::read(path).map_err(|source| PlannerError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let size_bytes = bytes.len() as u64;
            let hash = sha256_hex(&bytes);
            let rel_path = relative_path(artifact_root, path);

            let meta = FileMeta { path: rel_path.clone(), size_bytes };
            let already_processed = self
                .store
                .evidence_exists(&job.solution_id, &rel_path, &hash)
                .await?;
            let decision = decide_action(&meta, already_processed);
            let (area, strategy) = classify(&meta, decision.action);
            let item_estimate = estimate(size_bytes, strategy);
            let classifier = classifier_label(&meta, decision.action).to_string();

            let item = PlanItem {
                id: PlanItemId::new(),
                plan_id: plan.id.clone(),
                area,
                order_index: 0,
                path: rel_path,
                file_hash: hash,
                size_bytes,
                file_type: meta.extension(),
                classifier,
                strategy,
                recommended_action: decision.action,
                enabled: strategy != Strategy::Skip,
                estimate: item_estimate,
                status: PlanItemStatus::Pending,
            };
            by_area.get_mut(&area).unwrap().push(item);
        }

        let mut summary = PlanSummary::default();
        for items in by_area.values_mut() {
            items.sort_by(|a, b| a.path.cmp(&b.path));
            for (i, item) in items.iter_mut().enumerate() {
                item.order_index = i as i64;
                summary.total_files += 1;
                summary.total_cost_est += item.estimate.cost_usd;
                summary.total_time_est += item.estimate.time_seconds;
            }
        }
        plan.summary = summary;

        self.store.insert_plan(&plan).await?;
        for area in Area::ORDER {
            self.store
                .insert_plan_area(&plan.id, area, area.order_index())
                .await?;
            for item in &by_area[&area] {
                self.store.insert_plan_item(item).await?;
            }
        }
        self.store.set_plan_status(&plan.id, PlanStatus::Ready).await?;
        self.store.set_job_plan(&job.id, &plan.id).await?;
        self.store
            .set_job_status(&job.id, JobStatus::PlanningReady)
            .await?;
        plan.status = PlanStatus::Ready;
        info!(job_id = %job.id, plan_id = %plan.id, files = plan.summary.total_files, "plan persisted");

        if !job.requires_approval {
            self.approve(&plan.id, &job.id).await?;
            plan.status = PlanStatus::Approved;
        }

        Ok(plan)
    }

    /// Transition a plan to `approved`, the job to `queued`, and re-enqueue
    /// it (`spec.md` §6 `approve`, §4.D auto-approve path).
    pub async fn approve(&self, plan_id: &PlanId, job_id: &JobId) -> Result<()> {
        self.store.set_plan_status(plan_id, PlanStatus::Approved).await?;
        self.store.set_job_status(job_id, JobStatus::Queued).await?;
        self.queue.enqueue(job_id).await?;
        info!(%job_id, %plan_id, "plan approved and job re-enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_protocol::Solution;

    async fn seeded(requires_approval: bool) -> (Planner, Job) {
        let store = LineageStore::open(None).await.unwrap();
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();
        let job = Job::new_submission(solution.id, requires_approval);
        store.insert_job(&job).await.unwrap();
        let queue = JobQueue::new(Arc::new(store.clone()));
        (Planner::new(store, queue), job)
    }

    fn write(dir: &std::path::Path, rel: &str, contents: &str) {
        let full = dir.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    #[tokio::test]
    async fn plans_files_into_areas_with_deterministic_order() {
        let (planner, job) = seeded(true).await;
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "db/b_create.sql", "CREATE TABLE b (id int);");
        write(dir.path(), "db/a_create.sql", "CREATE TABLE a (id int);");
        write(dir.path(), "docs/readme.md", "# hello");
        write(dir.path(), "app/Cargo.lock", "# autogenerated");

        let plan = planner
            .plan_job(&job, dir.path(), PlanMode::Standard)
            .await
            .unwrap();
        assert_eq!(plan.status, PlanStatus::Ready);
        assert_eq!(plan.summary.total_files, 4);

        let items = planner.store.list_plan_items(&plan.id).await.unwrap();
        let foundation: Vec<_> = items.iter().filter(|i| i.area == Area::Foundation).collect();
        assert_eq!(foundation.len(), 2);
        assert_eq!(foundation[0].path, "db/a_create.sql");
        assert_eq!(foundation[0].order_index, 0);
        assert_eq!(foundation[1].path, "db/b_create.sql");
        assert_eq!(foundation[1].order_index, 1);

        let lockfile = items.iter().find(|i| i.path.ends_with("Cargo.lock")).unwrap();
        assert_eq!(lockfile.strategy, Strategy::Skip);
        assert!(!lockfile.enabled);
        assert_eq!(lockfile.area, Area::Aux);
    }

    #[tokio::test]
    async fn requires_approval_true_leaves_plan_ready_for_review() {
        let (planner, job) = seeded(true).await;
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.sql", "SELECT 1;");

        let plan = planner
            .plan_job(&job, dir.path(), PlanMode::Standard)
            .await
            .unwrap();
        assert_eq!(plan.status, PlanStatus::Ready);

        let fetched_job = planner.store.get_job(&job.id).await.unwrap();
        assert_eq!(fetched_job.status, JobStatus::PlanningReady);
    }

    #[tokio::test]
    async fn requires_approval_false_auto_approves_and_requeues() {
        let (planner, job) = seeded(false).await;
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.sql", "SELECT 1;");

        let plan = planner
            .plan_job(&job, dir.path(), PlanMode::Standard)
            .await
            .unwrap();
        assert_eq!(plan.status, PlanStatus::Approved);

        let fetched_job = planner.store.get_job(&job.id).await.unwrap();
        assert_eq!(fetched_job.status, JobStatus::Queued);

        let claimed = planner.queue.claim_next().await.unwrap();
        assert!(claimed.is_some());
    }

    #[tokio::test]
    async fn rerun_with_unchanged_hash_is_skipped() {
        let (planner, job) = seeded(true).await;
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "scripts/load.py", "print('hi')");

        let first = planner
            .plan_job(&job, dir.path(), PlanMode::Standard)
            .await
            .unwrap();
        let first_items = planner.store.list_plan_items(&first.id).await.unwrap();
        let evidence = strata_protocol::Evidence::new(
            job.solution_id.clone(),
            "scripts/load.py",
            strata_protocol::EvidenceKind::Code,
            "print('hi')",
        )
        .with_hash(first_items[0].file_hash.clone());
        planner.store.insert_evidence(&evidence).await.unwrap();

        let second_job = Job::new_submission(job.solution_id.clone(), true);
        planner.store.insert_job(&second_job).await.unwrap();
        let second = planner
            .plan_job(&second_job, dir.path(), PlanMode::Standard)
            .await
            .unwrap();
        let second_items = planner.store.list_plan_items(&second.id).await.unwrap();
        let item = second_items.iter().find(|i| i.path == "scripts/load.py").unwrap();
        assert_eq!(item.recommended_action, RecommendedAction::Skip);
        assert_eq!(item.classifier, "skipped");
    }
}

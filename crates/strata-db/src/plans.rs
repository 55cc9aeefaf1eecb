//! Plan / Area / Plan Item CRUD (`spec.md` §3 Plan, §4.D Planner).

use crate::error::{DbError, Result};
use crate::LineageStore;
use strata_ids::{JobId, PlanId, PlanItemId};
use strata_protocol::{
    Area, Estimate, Plan, PlanItem, PlanItemStatus, PlanMode, PlanStatus, PlanSummary,
    RecommendedAction, Strategy,
};

impl LineageStore {
    pub async fn insert_plan(&self, plan: &Plan) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO job_plan
               (id, job_id, status, mode, total_files, total_cost_est, total_time_est)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&plan.id)
        .bind(&plan.job_id)
        .bind(plan.status)
        .bind(plan.mode)
        .bind(plan.summary.total_files as i64)
        .bind(plan.summary.total_cost_est)
        .bind(plan.summary.total_time_est)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_plan(&self, id: &PlanId) -> Result<Plan> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"SELECT id, job_id, status, mode, total_files, total_cost_est, total_time_est
               FROM job_plan WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| DbError::not_found(format!("plan {id} not found")))
    }

    pub async fn get_plan_for_job(&self, job_id: &JobId) -> Result<Plan> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"SELECT id, job_id, status, mode, total_files, total_cost_est, total_time_est
               FROM job_plan WHERE job_id = ?"#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| DbError::not_found(format!("plan for job {job_id} not found")))
    }

    pub async fn set_plan_status(&self, id: &PlanId, status: PlanStatus) -> Result<()> {
        let rows = sqlx::query("UPDATE job_plan SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("plan {id} not found")));
        }
        Ok(())
    }

    pub async fn set_plan_summary(&self, id: &PlanId, summary: PlanSummary) -> Result<()> {
        sqlx::query(
            "UPDATE job_plan SET total_files = ?, total_cost_est = ?, total_time_est = ? WHERE id = ?",
        )
        .bind(summary.total_files as i64)
        .bind(summary.total_cost_est)
        .bind(summary.total_time_est)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_plan_area(&self, plan_id: &PlanId, area: Area, order_index: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO job_plan_area (id, plan_id, area, order_index) VALUES (?, ?, ?, ?)",
        )
        .bind(strata_ids::PlanAreaId::new())
        .bind(plan_id)
        .bind(area)
        .bind(order_index)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_plan_item(&self, item: &PlanItem) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO job_plan_item
               (id, plan_id, area, order_index, path, file_hash, size_bytes, file_type,
                classifier, strategy, recommended_action, enabled, est_tokens,
                est_cost_usd, est_time_seconds, status)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&item.id)
        .bind(&item.plan_id)
        .bind(item.area)
        .bind(item.order_index)
        .bind(&item.path)
        .bind(&item.file_hash)
        .bind(item.size_bytes as i64)
        .bind(&item.file_type)
        .bind(&item.classifier)
        .bind(item.strategy)
        .bind(item.recommended_action)
        .bind(item.enabled)
        .bind(item.estimate.tokens as i64)
        .bind(item.estimate.cost_usd)
        .bind(item.estimate.time_seconds)
        .bind(item.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_plan_item_enabled(&self, id: &PlanItemId, enabled: bool) -> Result<()> {
        let rows = sqlx::query("UPDATE job_plan_item SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("plan item {id} not found")));
        }
        Ok(())
    }

    pub async fn set_plan_item_status(&self, id: &PlanItemId, status: PlanItemStatus) -> Result<()> {
        sqlx::query("UPDATE job_plan_item SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All items for a plan, ordered by area then `order_index` — the
    /// deterministic execution order the orchestrator walks (`spec.md` §4.H).
    pub async fn list_plan_items(&self, plan_id: &PlanId) -> Result<Vec<PlanItem>> {
        let rows = sqlx::query_as::<_, PlanItemRow>(
            r#"SELECT id, plan_id, area, order_index, path, file_hash, size_bytes, file_type,
                      classifier, strategy, recommended_action, enabled, est_tokens,
                      est_cost_usd, est_time_seconds, status
               FROM job_plan_item WHERE plan_id = ? ORDER BY area, order_index"#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: PlanId,
    job_id: JobId,
    status: PlanStatus,
    mode: PlanMode,
    total_files: i64,
    total_cost_est: f64,
    total_time_est: f64,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan {
            id: row.id,
            job_id: row.job_id,
            status: row.status,
            mode: row.mode,
            summary: PlanSummary {
                total_files: row.total_files as u32,
                total_cost_est: row.total_cost_est,
                total_time_est: row.total_time_est,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlanItemRow {
    id: PlanItemId,
    plan_id: PlanId,
    area: Area,
    order_index: i64,
    path: String,
    file_hash: String,
    size_bytes: i64,
    file_type: String,
    classifier: String,
    strategy: Strategy,
    recommended_action: RecommendedAction,
    enabled: bool,
    est_tokens: i64,
    est_cost_usd: f64,
    est_time_seconds: f64,
    status: PlanItemStatus,
}

impl From<PlanItemRow> for PlanItem {
    fn from(row: PlanItemRow) -> Self {
        PlanItem {
            id: row.id,
            plan_id: row.plan_id,
            area: row.area,
            order_index: row.order_index,
            path: row.path,
            file_hash: row.file_hash,
            size_bytes: row.size_bytes as u64,
            file_type: row.file_type,
            classifier: row.classifier,
            strategy: row.strategy,
            recommended_action: row.recommended_action,
            enabled: row.enabled,
            estimate: Estimate {
                tokens: row.est_tokens as u64,
                cost_usd: row.est_cost_usd,
                time_seconds: row.est_time_seconds,
            },
            status: row.status,
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
    async fn insert_plan_and_items_orders_by_area_then_index() {
        let store = LineageStore::open(None).await.unwrap();
        let job_id = seeded_job(&store).await;
        let plan = Plan::draft(job_id, PlanMode::Standard);
        store.insert_plan(&plan).await.unwrap();

        let mut second = PlanItem {
            id: PlanItemId::new(),
            plan_id: plan.id.clone(),
            area: Area::Foundation,
            order_index: 1,
            path: "b.sql".into(),
            file_hash: "h2".into(),
            size_bytes: 5,
            file_type: "sql".into(),
            classifier: "sql".into(),
            strategy: Strategy::ParserOnly,
            recommended_action: RecommendedAction::Process,
            enabled: true,
            estimate: Estimate::default(),
            status: PlanItemStatus::Pending,
        };
        let mut first = second.clone();
        first.id = PlanItemId::new();
        first.order_index = 0;
        first.path = "a.sql".into();
        second.path = "b.sql".into();

        store.insert_plan_item(&second).await.unwrap();
        store.insert_plan_item(&first).await.unwrap();

        let items = store.list_plan_items(&plan.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, "a.sql");
        assert_eq!(items[1].path, "b.sql");
    }

    #[tokio::test]
    async fn disabling_item_persists() {
        let store = LineageStore::open(None).await.unwrap();
        let job_id = seeded_job(&store).await;
        let plan = Plan::draft(job_id, PlanMode::Standard);
        store.insert_plan(&plan).await.unwrap();

        let item = PlanItem {
            id: PlanItemId::new(),
            plan_id: plan.id.clone(),
            area: Area::Foundation,
            order_index: 0,
            path: "a.sql".into(),
            file_hash: "h".into(),
            size_bytes: 5,
            file_type: "sql".into(),
            classifier: "sql".into(),
            strategy: Strategy::ParserOnly,
            recommended_action: RecommendedAction::Process,
            enabled: true,
            estimate: Estimate::default(),
            status: PlanItemStatus::Pending,
        };
        store.insert_plan_item(&item).await.unwrap();
        store.set_plan_item_enabled(&item.id, false).await.unwrap();

        let items = store.list_plan_items(&plan.id).await.unwrap();
        assert!(!items[0].enabled);
        assert!(!items[0].is_executable());
    }
}

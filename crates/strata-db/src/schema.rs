//! `CREATE TABLE` statements for every table in `spec.md` §6
//! "Persisted state layout". Single source of truth for the schema.

use crate::error::Result;
use crate::LineageStore;
use tracing::info;

impl LineageStore {
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        self.create_core_tables().await?;
        self.create_plan_tables().await?;
        self.create_catalog_tables().await?;
        self.create_deep_dive_tables().await?;
        self.create_audit_tables().await?;
        self.create_prompt_tables().await?;
        info!("lineage store schema verified");
        Ok(())
    }

    async fn create_core_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS solutions (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS job_run (
                id TEXT PRIMARY KEY,
                solution_id TEXT NOT NULL REFERENCES solutions(id),
                status TEXT NOT NULL DEFAULT 'queued',
                current_stage TEXT NOT NULL DEFAULT 'ingest',
                progress_pct INTEGER NOT NULL DEFAULT 0,
                plan_id TEXT,
                requires_approval INTEGER NOT NULL DEFAULT 1,
                started_at TEXT,
                finished_at TEXT,
                error_message TEXT,
                error_details TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_run_solution ON job_run(solution_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS job_queue (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES job_run(id),
                status TEXT NOT NULL DEFAULT 'pending',
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_queue_status ON job_queue(status, created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_plan_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS job_plan (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL UNIQUE REFERENCES job_run(id),
                status TEXT NOT NULL DEFAULT 'draft',
                mode TEXT NOT NULL DEFAULT 'standard',
                total_files INTEGER NOT NULL DEFAULT 0,
                total_cost_est REAL NOT NULL DEFAULT 0,
                total_time_est REAL NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS job_plan_area (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL REFERENCES job_plan(id),
                area TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                UNIQUE(plan_id, area)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS job_plan_item (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL REFERENCES job_plan(id),
                area TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                path TEXT NOT NULL,
                file_hash TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                file_type TEXT NOT NULL,
                classifier TEXT NOT NULL,
                strategy TEXT NOT NULL,
                recommended_action TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                est_tokens INTEGER NOT NULL DEFAULT 0,
                est_cost_usd REAL NOT NULL DEFAULT 0,
                est_time_seconds REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending'
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_plan_item_plan ON job_plan_item(plan_id, area, order_index)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_catalog_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS asset (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                asset_type TEXT NOT NULL,
                name_display TEXT NOT NULL,
                canonical_name TEXT NOT NULL,
                system TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(project_id, name_display, asset_type)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS evidence (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                kind TEXT NOT NULL,
                line_start INTEGER,
                line_end INTEGER,
                xpath TEXT,
                byte_start INTEGER,
                byte_end INTEGER,
                snippet TEXT NOT NULL,
                hash TEXT,
                UNIQUE(project_id, hash, file_path)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS edge_index (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                from_asset_id TEXT NOT NULL REFERENCES asset(id),
                to_asset_id TEXT NOT NULL REFERENCES asset(id),
                edge_type TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 1.0,
                is_hypothesis INTEGER NOT NULL DEFAULT 0,
                extractor_id TEXT NOT NULL,
                rationale TEXT,
                UNIQUE(project_id, from_asset_id, to_asset_id, edge_type)
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_edge_from ON edge_index(from_asset_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_edge_to ON edge_index(to_asset_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS edge_evidence (
                edge_id TEXT NOT NULL REFERENCES edge_index(id),
                evidence_id TEXT NOT NULL REFERENCES evidence(id),
                PRIMARY KEY (edge_id, evidence_id)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_deep_dive_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS package (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                name TEXT NOT NULL,
                source_path TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS package_component (
                id TEXT PRIMARY KEY,
                package_id TEXT NOT NULL REFERENCES package(id),
                asset_id TEXT REFERENCES asset(id),
                name TEXT NOT NULL,
                component_type TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS transformation_ir (
                id TEXT PRIMARY KEY,
                package_id TEXT NOT NULL REFERENCES package(id),
                source_component_id TEXT,
                operation TEXT NOT NULL,
                detail TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS column_lineage (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                source_asset_id TEXT,
                source_column TEXT NOT NULL,
                target_asset_id TEXT,
                target_column TEXT NOT NULL,
                transformation_rule TEXT,
                confidence REAL NOT NULL DEFAULT 1.0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_audit_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS file_processing_log (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES job_run(id),
                file_path TEXT NOT NULL,
                action_name TEXT NOT NULL,
                strategy_used TEXT NOT NULL,
                model_provider TEXT,
                model_used TEXT,
                fallback_used INTEGER NOT NULL DEFAULT 0,
                fallback_chain TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                tokens_in INTEGER NOT NULL DEFAULT 0,
                tokens_out INTEGER NOT NULL DEFAULT 0,
                cost_estimate_usd REAL NOT NULL DEFAULT 0,
                latency_ms INTEGER NOT NULL DEFAULT 0,
                error_type TEXT,
                error_message TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                nodes_extracted INTEGER NOT NULL DEFAULT 0,
                edges_extracted INTEGER NOT NULL DEFAULT 0,
                evidences_extracted INTEGER NOT NULL DEFAULT 0,
                result_hash TEXT,
                created_at TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_file_log_job ON file_processing_log(job_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS audit_snapshot (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                total_assets INTEGER NOT NULL,
                total_relationships INTEGER NOT NULL,
                coverage_score REAL NOT NULL,
                avg_confidence REAL NOT NULL,
                hypothesis_ratio REAL NOT NULL,
                gaps TEXT NOT NULL DEFAULT '[]',
                recommendations TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_snapshot_project ON audit_snapshot(project_id, created_at)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS reasoning_log (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES job_run(id),
                summary TEXT NOT NULL,
                created_at TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_prompt_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS prompt_layer (
                name TEXT PRIMARY KEY,
                layer_type TEXT NOT NULL,
                content TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS action_prompt_config (
                action TEXT PRIMARY KEY,
                base_layer TEXT,
                domain_layer TEXT,
                org_layer TEXT,
                reasoner_layer TEXT
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS project_action_config (
                project_id TEXT NOT NULL,
                action TEXT NOT NULL,
                solution_layer TEXT NOT NULL,
                PRIMARY KEY (project_id, action)
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

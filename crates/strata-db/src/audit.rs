//! Audit Snapshot persistence (`spec.md` §4.I Audit Logger).

use crate::error::{DbError, Result};
use crate::LineageStore;
use chrono::{DateTime, Utc};
use strata_ids::{AuditSnapshotId, SolutionId};
use strata_protocol::{AuditMetrics, AuditSnapshot};

impl LineageStore {
    pub async fn insert_audit_snapshot(&self, snapshot: &AuditSnapshot) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO audit_snapshot
               (id, project_id, total_assets, total_relationships, coverage_score,
                avg_confidence, hypothesis_ratio, gaps, recommendations, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.project_id)
        .bind(snapshot.metrics.total_assets as i64)
        .bind(snapshot.metrics.total_relationships as i64)
        .bind(snapshot.metrics.coverage_score)
        .bind(snapshot.metrics.avg_confidence)
        .bind(snapshot.metrics.hypothesis_ratio)
        .bind(serde_json::to_string(&snapshot.gaps)?)
        .bind(serde_json::to_string(&snapshot.recommendations)?)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent snapshot for a project, if any has been taken.
    pub async fn latest_audit_snapshot(&self, project_id: &SolutionId) -> Result<Option<AuditSnapshot>> {
        let row = sqlx::query_as::<_, AuditSnapshotRow>(
            r#"SELECT id, project_id, total_assets, total_relationships, coverage_score,
                      avg_confidence, hypothesis_ratio, gaps, recommendations, created_at
               FROM audit_snapshot WHERE project_id = ? ORDER BY created_at DESC LIMIT 1"#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Full snapshot history for a project, newest first (`spec.md` §6
    /// `get_audit_history`).
    pub async fn list_audit_snapshots(&self, project_id: &SolutionId) -> Result<Vec<AuditSnapshot>> {
        let rows = sqlx::query_as::<_, AuditSnapshotRow>(
            r#"SELECT id, project_id, total_assets, total_relationships, coverage_score,
                      avg_confidence, hypothesis_ratio, gaps, recommendations, created_at
               FROM audit_snapshot WHERE project_id = ? ORDER BY created_at DESC"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn get_audit_snapshot(&self, id: &AuditSnapshotId) -> Result<AuditSnapshot> {
        let row = sqlx::query_as::<_, AuditSnapshotRow>(
            r#"SELECT id, project_id, total_assets, total_relationships, coverage_score,
                      avg_confidence, hypothesis_ratio, gaps, recommendations, created_at
               FROM audit_snapshot WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(DbError::not_found(format!("audit snapshot {id} not found"))),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuditSnapshotRow {
    id: AuditSnapshotId,
    project_id: SolutionId,
    total_assets: i64,
    total_relationships: i64,
    coverage_score: f64,
    avg_confidence: f64,
    hypothesis_ratio: f64,
    gaps: String,
    recommendations: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditSnapshotRow> for AuditSnapshot {
    type Error = DbError;

    fn try_from(row: AuditSnapshotRow) -> Result<Self> {
        Ok(AuditSnapshot {
            id: row.id,
            project_id: row.project_id,
            metrics: AuditMetrics {
                total_assets: row.total_assets as u64,
                total_relationships: row.total_relationships as u64,
                coverage_score: row.coverage_score,
                avg_confidence: row.avg_confidence,
                hypothesis_ratio: row.hypothesis_ratio,
            },
            gaps: serde_json::from_str(&row.gaps)?,
            recommendations: serde_json::from_str(&row.recommendations)?,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::Solution;

    #[tokio::test]
    async fn latest_snapshot_picks_most_recent() {
        let store = LineageStore::open(None).await.unwrap();
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();

        let older = AuditSnapshot {
            id: AuditSnapshotId::new(),
            project_id: solution.id.clone(),
            metrics: AuditMetrics::default(),
            gaps: vec![],
            recommendations: vec![],
            created_at: Utc::now() - chrono::Duration::hours(1),
        };
        let newer = AuditSnapshot {
            id: AuditSnapshotId::new(),
            project_id: solution.id.clone(),
            metrics: AuditMetrics { total_assets: 5, ..Default::default() },
            gaps: vec!["no lineage for staging.raw_orders".to_string()],
            recommendations: vec![],
            created_at: Utc::now(),
        };
        store.insert_audit_snapshot(&older).await.unwrap();
        store.insert_audit_snapshot(&newer).await.unwrap();

        let latest = store.latest_audit_snapshot(&solution.id).await.unwrap().unwrap();
        assert_eq!(latest.metrics.total_assets, 5);

        let history = store.list_audit_snapshots(&solution.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, newer.id);
        assert_eq!(history[1].id, older.id);
    }
}

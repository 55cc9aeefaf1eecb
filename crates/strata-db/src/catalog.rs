//! Asset / Evidence / Edge persistence (`spec.md` §4.F Catalog Sync).
//!
//! Upserts are keyed on the dedup keys `Asset::dedup_key()` /
//! `Edge::dedup_key()` define, so reruns over an unchanged artifact leave
//! the catalog unchanged (`spec.md` §8 idempotence invariant).

use crate::error::{DbError, Result};
use crate::LineageStore;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use strata_ids::{AssetId, EdgeId, EvidenceId, SolutionId};
use strata_protocol::{Asset, AssetType, Edge, EdgeType, Evidence, EvidenceKind, Locator};

impl LineageStore {
    /// Insert a new asset, or return the existing one if its dedup key
    /// already exists — the id returned is always the catalog's canonical
    /// id for that `(project_id, name_display, asset_type)` triple.
    pub async fn upsert_asset(&self, asset: &Asset) -> Result<AssetId> {
        if let Some(existing) = self
            .find_asset_by_dedup_key(&asset.project_id, &asset.name_display, asset.asset_type)
            .await?
        {
            self.touch_asset(&existing.id).await?;
            return Ok(existing.id);
        }

        sqlx::query(
            r#"INSERT INTO asset
               (id, project_id, asset_type, name_display, canonical_name, system, tags,
                created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&asset.id)
        .bind(&asset.project_id)
        .bind(asset.asset_type)
        .bind(&asset.name_display)
        .bind(&asset.canonical_name)
        .bind(&asset.system)
        .bind(serde_json::to_string(&asset.tags)?)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(asset.id.clone())
    }

    async fn touch_asset(&self, id: &AssetId) -> Result<()> {
        sqlx::query("UPDATE asset SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Catalog Sync's asset step (`spec.md` §4.F): look up by dedup key, and
    /// on a hit merge `extra_tags` into the existing row's `tags`, refresh
    /// `system`, and touch `updated_at` rather than leaving the first-seen
    /// values frozen. On a miss, insert `asset` as a fresh row.
    pub async fn sync_asset(
        &self,
        asset: &Asset,
        extra_tags: &BTreeMap<String, Value>,
    ) -> Result<AssetId> {
        if let Some(existing) = self
            .find_asset_by_dedup_key(&asset.project_id, &asset.name_display, asset.asset_type)
            .await?
        {
            let mut tags = existing.tags;
            tags.extend(extra_tags.clone());
            sqlx::query("UPDATE asset SET tags = ?, system = ?, updated_at = ? WHERE id = ?")
                .bind(serde_json::to_string(&tags)?)
                .bind(&asset.system)
                .bind(Utc::now())
                .bind(&existing.id)
                .execute(&self.pool)
                .await?;
            return Ok(existing.id);
        }

        let mut fresh = asset.clone();
        fresh.tags.extend(extra_tags.clone());
        self.upsert_asset(&fresh).await
    }

    pub async fn find_asset_by_dedup_key(
        &self,
        project_id: &SolutionId,
        name_display: &str,
        asset_type: AssetType,
    ) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(
            r#"SELECT id, project_id, asset_type, name_display, canonical_name, system, tags,
                      created_at, updated_at
               FROM asset WHERE project_id = ? AND name_display = ? AND asset_type = ?"#,
        )
        .bind(project_id)
        .bind(name_display)
        .bind(asset_type)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn get_asset(&self, id: &AssetId) -> Result<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(
            r#"SELECT id, project_id, asset_type, name_display, canonical_name, system, tags,
                      created_at, updated_at
               FROM asset WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(DbError::not_found(format!("asset {id} not found"))),
        }
    }

    pub async fn list_assets(&self, project_id: &SolutionId) -> Result<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(
            r#"SELECT id, project_id, asset_type, name_display, canonical_name, system, tags,
                      created_at, updated_at
               FROM asset WHERE project_id = ? ORDER BY name_display"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn count_assets(&self, project_id: &SolutionId) -> Result<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM asset WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    /// Insert a new edge, or return the existing id if its dedup key
    /// already exists. Confidence is only ever raised on rerun, never
    /// lowered, to avoid a later hypothesis pass clobbering a confirmed
    /// deterministic edge (`spec.md` §4.F).
    pub async fn upsert_edge(&self, edge: &Edge) -> Result<EdgeId> {
        if let Some(existing) = self
            .find_edge_by_dedup_key(
                &edge.project_id,
                &edge.from_asset_id,
                &edge.to_asset_id,
                edge.edge_type,
            )
            .await?
        {
            if edge.confidence > existing.confidence {
                sqlx::query(
                    "UPDATE edge_index SET confidence = ?, is_hypothesis = ? WHERE id = ?",
                )
                .bind(edge.confidence)
                .bind(edge.is_hypothesis)
                .bind(&existing.id)
                .execute(&self.pool)
                .await?;
            }
            return Ok(existing.id);
        }

        sqlx::query(
            r#"INSERT INTO edge_index
               (id, project_id, from_asset_id, to_asset_id, edge_type, confidence,
                is_hypothesis, extractor_id, rationale)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&edge.id)
        .bind(&edge.project_id)
        .bind(&edge.from_asset_id)
        .bind(&edge.to_asset_id)
        .bind(edge.edge_type)
        .bind(edge.confidence)
        .bind(edge.is_hypothesis)
        .bind(&edge.extractor_id)
        .bind(&edge.rationale)
        .execute(&self.pool)
        .await?;
        Ok(edge.id.clone())
    }

    pub async fn find_edge_by_dedup_key(
        &self,
        project_id: &SolutionId,
        from_asset_id: &AssetId,
        to_asset_id: &AssetId,
        edge_type: EdgeType,
    ) -> Result<Option<Edge>> {
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"SELECT id, project_id, from_asset_id, to_asset_id, edge_type, confidence,
                      is_hypothesis, extractor_id, rationale
               FROM edge_index
               WHERE project_id = ? AND from_asset_id = ? AND to_asset_id = ? AND edge_type = ?"#,
        )
        .bind(project_id)
        .bind(from_asset_id)
        .bind(to_asset_id)
        .bind(edge_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_edges(&self, project_id: &SolutionId) -> Result<Vec<Edge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"SELECT id, project_id, from_asset_id, to_asset_id, edge_type, confidence,
                      is_hypothesis, extractor_id, rationale
               FROM edge_index WHERE project_id = ?"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count_edges(&self, project_id: &SolutionId) -> Result<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM edge_index WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }

    pub async fn insert_evidence(&self, evidence: &Evidence) -> Result<EvidenceId> {
        sqlx::query(
            r#"INSERT INTO evidence
               (id, project_id, file_path, kind, line_start, line_end, xpath,
                byte_start, byte_end, snippet, hash)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(project_id, hash, file_path) DO UPDATE SET snippet = excluded.snippet"#,
        )
        .bind(&evidence.id)
        .bind(&evidence.project_id)
        .bind(&evidence.file_path)
        .bind(evidence.kind)
        .bind(evidence.locator.line_start.map(|v| v as i64))
        .bind(evidence.locator.line_end.map(|v| v as i64))
        .bind(&evidence.locator.xpath)
        .bind(evidence.locator.byte_start.map(|v| v as i64))
        .bind(evidence.locator.byte_end.map(|v| v as i64))
        .bind(&evidence.snippet)
        .bind(&evidence.hash)
        .execute(&self.pool)
        .await?;
        Ok(evidence.id.clone())
    }

    pub async fn link_edge_evidence(&self, edge_id: &EdgeId, evidence_id: &EvidenceId) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO edge_evidence (edge_id, evidence_id) VALUES (?, ?)",
        )
        .bind(edge_id)
        .bind(evidence_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether a `(project_id, file_path, hash)` triple has already been
    /// recorded as evidence — the Planner's rerun-idempotence check
    /// (`spec.md` §4.D: "if a matching ... already exists in Evidence,
    /// action becomes SKIP").
    pub async fn evidence_exists(
        &self,
        project_id: &SolutionId,
        file_path: &str,
        hash: &str,
    ) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM evidence WHERE project_id = ? AND file_path = ? AND hash = ?",
        )
        .bind(project_id)
        .bind(file_path)
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn list_evidence_for_edge(&self, edge_id: &EdgeId) -> Result<Vec<Evidence>> {
        let rows = sqlx::query_as::<_, EvidenceRow>(
            r#"SELECT e.id, e.project_id, e.file_path, e.kind, e.line_start, e.line_end,
                      e.xpath, e.byte_start, e.byte_end, e.snippet, e.hash
               FROM evidence e
               JOIN edge_evidence ee ON ee.evidence_id = e.id
               WHERE ee.edge_id = ?"#,
        )
        .bind(edge_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct AssetRow {
    id: AssetId,
    project_id: SolutionId,
    asset_type: AssetType,
    name_display: String,
    canonical_name: String,
    system: String,
    tags: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = DbError;

    fn try_from(row: AssetRow) -> Result<Self> {
        let tags: BTreeMap<String, Value> = serde_json::from_str(&row.tags)?;
        Ok(Asset {
            id: row.id,
            project_id: row.project_id,
            asset_type: row.asset_type,
            name_display: row.name_display,
            canonical_name: row.canonical_name,
            system: row.system,
            tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    id: EdgeId,
    project_id: SolutionId,
    from_asset_id: AssetId,
    to_asset_id: AssetId,
    edge_type: EdgeType,
    confidence: f64,
    is_hypothesis: bool,
    extractor_id: String,
    rationale: Option<String>,
}

impl From<EdgeRow> for Edge {
    fn from(row: EdgeRow) -> Self {
        Edge {
            id: row.id,
            project_id: row.project_id,
            from_asset_id: row.from_asset_id,
            to_asset_id: row.to_asset_id,
            edge_type: row.edge_type,
            confidence: row.confidence,
            is_hypothesis: row.is_hypothesis,
            extractor_id: row.extractor_id,
            rationale: row.rationale,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EvidenceRow {
    id: EvidenceId,
    project_id: SolutionId,
    file_path: String,
    kind: EvidenceKind,
    line_start: Option<i64>,
    line_end: Option<i64>,
    xpath: Option<String>,
    byte_start: Option<i64>,
    byte_end: Option<i64>,
    snippet: String,
    hash: Option<String>,
}

impl From<EvidenceRow> for Evidence {
    fn from(row: EvidenceRow) -> Self {
        Evidence {
            id: row.id,
            project_id: row.project_id,
            file_path: row.file_path,
            kind: row.kind,
            locator: Locator {
                file: String::new(),
                line_start: row.line_start.map(|v| v as u32),
                line_end: row.line_end.map(|v| v as u32),
                xpath: row.xpath,
                byte_start: row.byte_start.map(|v| v as u64),
                byte_end: row.byte_end.map(|v| v as u64),
            },
            snippet: row.snippet,
            hash: row.hash,
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
    async fn upserting_same_asset_twice_keeps_one_row() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_solution(&store).await;

        let asset = Asset::new(project_id.clone(), AssetType::Table, "dbo.customers", "sqlserver");
        let id1 = store.upsert_asset(&asset).await.unwrap();

        let mut rerun = Asset::new(project_id.clone(), AssetType::Table, "dbo.customers", "sqlserver");
        rerun.id = AssetId::new();
        let id2 = store.upsert_asset(&rerun).await.unwrap();

        assert_eq!(id1, id2);
        assert_eq!(store.count_assets(&project_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upserting_same_edge_twice_keeps_one_row_and_raises_confidence() {
        let store = LineageStore::open(None).await.unwrap();
        let project_id = seeded_solution(&store).await;
        let a = Asset::new(project_id.clone(), AssetType::Table, "a", "sqlserver");
        let b = Asset::new(project_id.clone(), AssetType::Table, "b", "sqlserver");
        let a_id = store.upsert_asset(&a).await.unwrap();
        let b_id = store.upsert_asset(&b).await.unwrap();

        let edge = Edge::new(project_id.clone(), a_id.clone(), b_id.clone(), EdgeType::ReadsFrom, 0.5, "sql_parser");
        store.upsert_edge(&edge).await.unwrap();

        let stronger = Edge::new(project_id.clone(), a_id, b_id, EdgeType::ReadsFrom, 0.9, "llm_action");
        store.upsert_edge(&stronger).await.unwrap();

        assert_eq!(store.count_edges(&project_id).await.unwrap(), 1);
        let stored = store
            .find_edge_by_dedup_key(&project_id, &edge.from_asset_id, &edge.to_asset_id, EdgeType::ReadsFrom)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.confidence, 0.9);
    }
}

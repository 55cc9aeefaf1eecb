//! Solution CRUD (`spec.md` §3 Solution).

use crate::error::{DbError, Result};
use crate::LineageStore;
use strata_ids::SolutionId;
use strata_protocol::{Solution, SolutionStatus};

impl LineageStore {
    pub async fn insert_solution(&self, solution: &Solution) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO solutions (id, display_name, storage_path, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&solution.id)
        .bind(&solution.display_name)
        .bind(&solution.storage_path)
        .bind(solution.status)
        .bind(solution.created_at)
        .bind(solution.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_solution(&self, id: &SolutionId) -> Result<Solution> {
        let row = sqlx::query_as::<_, SolutionRow>(
            "SELECT id, display_name, storage_path, status, created_at, updated_at
             FROM solutions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| DbError::not_found(format!("solution {id} not found")))
    }

    pub async fn set_solution_status(&self, id: &SolutionId, status: SolutionStatus) -> Result<()> {
        let rows = sqlx::query("UPDATE solutions SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(chrono::Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(DbError::not_found(format!("solution {id} not found")));
        }
        Ok(())
    }

    pub async fn list_solutions(&self) -> Result<Vec<Solution>> {
        let rows = sqlx::query_as::<_, SolutionRow>(
            "SELECT id, display_name, storage_path, status, created_at, updated_at
             FROM solutions ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct SolutionRow {
    id: SolutionId,
    display_name: String,
    storage_path: String,
    status: SolutionStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SolutionRow> for Solution {
    fn from(row: SolutionRow) -> Self {
        Solution {
            id: row.id,
            display_name: row.display_name,
            storage_path: row.storage_path,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = LineageStore::open(None).await.unwrap();
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();

        let fetched = store.get_solution(&solution.id).await.unwrap();
        assert_eq!(fetched.display_name, "acme-etl");
        assert_eq!(fetched.status, SolutionStatus::Pending);
    }

    #[tokio::test]
    async fn get_missing_solution_is_not_found() {
        let store = LineageStore::open(None).await.unwrap();
        let err = store.get_solution(&strata_ids::SolutionId::new()).await;
        assert!(matches!(err, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn set_status_updates_row() {
        let store = LineageStore::open(None).await.unwrap();
        let solution = Solution::new("acme-etl", "git://example/acme-etl.git");
        store.insert_solution(&solution).await.unwrap();

        store
            .set_solution_status(&solution.id, SolutionStatus::Ready)
            .await
            .unwrap();
        let fetched = store.get_solution(&solution.id).await.unwrap();
        assert_eq!(fetched.status, SolutionStatus::Ready);
    }
}

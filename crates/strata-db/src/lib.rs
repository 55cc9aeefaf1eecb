//! Relational store for the lineage discovery core (`spec.md` §6).
//!
//! `LineageStore` wraps a single `SqlitePool` and exposes one method group
//! per entity family, mirroring the teacher's per-concern `impl` blocks
//! rather than a single monolithic repository trait.

pub mod audit;
pub mod catalog;
pub mod deep_dive;
pub mod error;
pub mod file_logs;
pub mod jobs;
pub mod plans;
pub mod pool;
pub mod prompts;
pub mod queue;
pub mod schema;
pub mod solutions;

pub use error::{DbError, Result};

use sqlx::SqlitePool;

#[derive(Clone)]
pub struct LineageStore {
    pool: SqlitePool,
}

impl LineageStore {
    /// Open (or create) the store at `path`, or an in-memory store when
    /// `path` is `None`, and ensure the schema exists.
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let pool = pool::create_pool(path).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an already-connected pool (used by callers that manage their
    /// own pool lifecycle, e.g. `casparian_test_utils`-style test harnesses).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_creates_schema() {
        let store = LineageStore::open(None).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM solutions")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }
}

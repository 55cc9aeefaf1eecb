//! Pool creation (`spec.md` §6 "Relational store contract").

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Open (creating if necessary) a SQLite-backed store at `path`, or an
/// in-memory store when `path` is `None` (used by tests).
pub async fn create_pool(path: Option<&str>) -> Result<SqlitePool> {
    let url = match path {
        Some(p) => format!("sqlite:{p}?mode=rwc"),
        None => "sqlite::memory:".to_string(),
    };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(if path.is_some() { 5 } else { 1 })
        .connect_with(options)
        .await?;

    apply_pragmas(&pool).await?;
    info!("connected to lineage store at {}", path.unwrap_or(":memory:"));
    Ok(pool)
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(pool)
        .await
        .ok();
    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys=ON")
        .execute(pool)
        .await?;
    Ok(())
}

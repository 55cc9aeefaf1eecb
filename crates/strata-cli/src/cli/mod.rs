//! One module per subcommand, following `spec.md` §6's external interface
//! list: `submit`, `approve`, `cancel`, `get_plan`/`get_active_plan`,
//! `get_job_logs`, `get_audit_history`, plus `worker` to actually drain
//! the queue `submit`/`approve` feed.

pub mod approve;
pub mod audit;
pub mod cancel;
pub mod error;
pub mod logs;
pub mod output;
pub mod plan;
pub mod submit;
pub mod worker;

use strata_db::LineageStore;

/// Every command opens its own store against the same on-disk path; the
/// CLI is a short-lived process per invocation, not a daemon.
pub async fn open_store() -> anyhow::Result<LineageStore> {
    let path = crate::config::db_path();
    let path_str = path.to_string_lossy().into_owned();
    LineageStore::open(Some(&path_str)).await.map_err(Into::into)
}

/// Parse a CLI-supplied ID string, wrapping the parse error with context
/// a user can act on.
pub fn parse_id<T: std::str::FromStr>(label: &str, value: &str) -> anyhow::Result<T> {
    value
        .parse::<T>()
        .map_err(|_| error::HelpfulError::invalid_id(label, value).into())
}

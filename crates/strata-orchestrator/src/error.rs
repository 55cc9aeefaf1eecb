//! Error type for the Orchestrator (`spec.md` §4.H, §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Db(#[from] strata_db::DbError),

    #[error(transparent)]
    Queue(#[from] strata_queue::QueueError),

    #[error(transparent)]
    Fetch(#[from] strata_fetch::FetchError),

    #[error(transparent)]
    Planner(#[from] strata_planner::PlannerError),

    #[error(transparent)]
    Extract(#[from] strata_extract::ExtractError),

    #[error(transparent)]
    Routing(#[from] strata_extract::llm::routing::RoutingError),

    #[error(transparent)]
    Catalog(#[from] strata_catalog::CatalogError),

    #[error(transparent)]
    Audit(#[from] strata_audit::AuditError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl OrchestratorError {
    /// `spec.md` §7 `error_type` string.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Db(_) => "ingest_error",
            Self::Queue(_) => "ingest_error",
            Self::Fetch(_) => "ingest_error",
            Self::Planner(_) => "planner_error",
            Self::Extract(e) => e.error_type(),
            Self::Routing(_) => "action_execution_error",
            Self::Catalog(_) => "ingest_error",
            Self::Audit(_) => "ingest_error",
            Self::Io { .. } => "ingest_error",
        }
    }
}

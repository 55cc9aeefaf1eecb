//! Error type for the Planner (`spec.md` §4.D).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error(transparent)]
    Db(#[from] strata_db::DbError),

    #[error(transparent)]
    Queue(#[from] strata_queue::QueueError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlannerError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Db(_) => "ingest_error",
            Self::Queue(_) => "ingest_error",
            Self::Io { .. } => "ingest_error",
        }
    }
}

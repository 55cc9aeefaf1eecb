//! Error type for the Audit Logger (`spec.md` §4.I).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error(transparent)]
    Db(#[from] strata_db::DbError),

    #[error("no in-flight log for id {0}")]
    UnknownLog(String),
}

impl AuditError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Db(_) => "ingest_error",
            Self::UnknownLog(_) => "validation_error",
        }
    }
}

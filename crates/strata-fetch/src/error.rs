//! Error kinds for the Artifact Fetcher (`spec.md` §6 fetch contract).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("format error: {0}")]
    FormatError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// The `error_type` string this maps to in logs (`spec.md` §7: `ingest_error`).
    pub fn error_type(&self) -> &'static str {
        "ingest_error"
    }
}

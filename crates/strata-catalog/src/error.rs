//! Error type for Catalog Sync (`spec.md` §4.F).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Db(#[from] strata_db::DbError),

    #[error("unrecognized asset type: {0}")]
    UnknownAssetType(String),

    #[error("unrecognized edge type: {0}")]
    UnknownEdgeType(String),
}

impl CatalogError {
    /// `spec.md` §7 `error_type` string.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Db(_) => "ingest_error",
            Self::UnknownAssetType(_) | Self::UnknownEdgeType(_) => "validation_error",
        }
    }
}

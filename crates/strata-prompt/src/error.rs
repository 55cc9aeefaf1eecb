use thiserror::Error;

pub type Result<T> = std::result::Result<T, PromptError>;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error(transparent)]
    Db(#[from] strata_db::DbError),

    #[error("no prompt layers resolved and no fallback file found for action {0}")]
    NotFound(String),

    #[error("IO error reading prompt file: {0}")]
    Io(#[from] std::io::Error),
}

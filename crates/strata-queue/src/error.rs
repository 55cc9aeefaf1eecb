//! Error types for the job queue.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueueError>;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error(transparent)]
    Db(#[from] strata_db::DbError),
}

//! Database error types for the `ResultStore`/`JobQueue` implementations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// `DbError` folds into the engine's own error enum at the trait
/// boundary.
impl From<DbError> for bountyforge_core::Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => bountyforge_core::Error::NotFound(msg),
            other => bountyforge_core::Error::Persistence(other.to_string()),
        }
    }
}

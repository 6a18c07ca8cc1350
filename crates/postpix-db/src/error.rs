use postpix_core::PipelineError;
use thiserror::Error;

/// Persistence stage errors
#[derive(Debug, Error)]
pub enum DbError {
    /// The database or the `posts` table could not be provisioned.
    #[error("Schema provisioning failed: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<DbError> for PipelineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Schema(_) => PipelineError::Fatal(err.to_string()),
            DbError::Connect(_) | DbError::Query(_) => PipelineError::Transient(err.to_string()),
        }
    }
}

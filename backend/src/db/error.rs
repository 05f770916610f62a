use thiserror::Error;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed: {0}")]
    Connection(String),
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: diesel::result::Error,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Internal repository error: {0}")]
    Internal(String),
}

impl RepositoryError {
    pub(crate) fn query(operation: &'static str, source: diesel::result::Error) -> Self {
        RepositoryError::Query { operation, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

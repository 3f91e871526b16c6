//! Query error types

/// Errors surfaced by a query backend
///
/// The analytics layer treats every variant as opaque and hands it back to
/// the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Connection or authentication failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// Query execution failed (syntax errors, quota, permissions)
    #[error("query execution failed: {0}")]
    Execution(String),

    /// Response could not be decoded into rows
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other error raised by the underlying client
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    /// Wrap an arbitrary client error
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        QueryError::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Serialization(err.to_string())
    }
}

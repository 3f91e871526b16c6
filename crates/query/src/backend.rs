//! Query backend trait
//!
//! The backend is the caller's already-authenticated warehouse client. This
//! crate never opens connections, handles credentials, retries or times out;
//! it only defines the seam the analytics layer submits SQL through.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::QueryError;
use crate::result::QueryResult;

/// Query backend trait
///
/// Implement this for whatever BigQuery client the application already uses.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Execute a SQL query and return its rows
    async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<B: QueryBackend + ?Sized> QueryBackend for Arc<B> {
    async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        (**self).execute(sql).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[async_trait]
impl<B: QueryBackend + ?Sized> QueryBackend for Box<B> {
    async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        (**self).execute(sql).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

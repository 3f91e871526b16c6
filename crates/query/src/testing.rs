//! Test utilities
//!
//! A recording stub backend that returns canned results and keeps every SQL
//! string it was asked to run. Use it to assert on generated SQL and on
//! whether a request reached the backend at all.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::QueryBackend;
use crate::error::QueryError;
use crate::result::QueryResult;

/// What the stub answers with
enum Response {
    Rows(QueryResult),
    Error(String),
}

/// Recording stub backend
pub struct StubBackend {
    response: Response,
    submitted: Mutex<Vec<String>>,
}

impl StubBackend {
    /// Stub that answers every query with `result`
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            response: Response::Rows(result),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Stub that answers every query with an empty result
    pub fn empty() -> Self {
        Self::with_result(QueryResult::empty())
    }

    /// Stub that fails every query with `QueryError::Execution(message)`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Response::Error(message.into()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// SQL strings submitted so far, in order
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().clone()
    }

    /// Number of queries submitted so far
    pub fn call_count(&self) -> usize {
        self.submitted.lock().len()
    }

    /// Most recently submitted SQL
    pub fn last_sql(&self) -> Option<String> {
        self.submitted.lock().last().cloned()
    }
}

#[async_trait]
impl QueryBackend for StubBackend {
    async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        self.submitted.lock().push(sql.to_string());
        match &self.response {
            Response::Rows(result) => Ok(result.clone()),
            Response::Error(message) => Err(QueryError::Execution(message.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_stub_records_sql() {
        let stub = StubBackend::empty();

        let result = stub.execute("SELECT 1").await.unwrap();

        assert!(result.is_empty());
        assert_eq!(stub.call_count(), 1);
        assert_eq!(stub.last_sql().as_deref(), Some("SELECT 1"));
    }

    #[tokio::test]
    async fn test_failing_stub() {
        let stub = StubBackend::failing("quota exceeded");

        let err = stub.execute("SELECT 1").await.unwrap_err();

        assert!(matches!(err, QueryError::Execution(ref m) if m == "quota exceeded"));
        assert_eq!(stub.submitted(), vec!["SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_shared_stub_through_arc() {
        let stub = Arc::new(StubBackend::empty());
        let backend: Box<dyn QueryBackend> = Box::new(Arc::clone(&stub));

        backend.execute("SELECT 2").await.unwrap();

        assert_eq!(backend.name(), "stub");
        assert_eq!(stub.call_count(), 1);
    }
}

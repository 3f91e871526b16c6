//! GA4 Query - the execution seam for GA4 BigQuery analytics
//!
//! The analytics layer builds SQL; something else has to run it. This crate
//! defines that boundary:
//!
//! - **QueryBackend**: "submit SQL, get rows back", implemented by the
//!   caller around an already-authenticated BigQuery client
//! - **QueryResult**: rows of named, typed columns
//! - **QueryError**: opaque backend failures, propagated unchanged
//!
//! # Usage
//!
//! ```ignore
//! use ga4_query::{QueryBackend, QueryError, QueryResult};
//!
//! struct MyBigQuery { /* authenticated client */ }
//!
//! #[async_trait::async_trait]
//! impl QueryBackend for MyBigQuery {
//!     async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
//!         let rows = self.run(sql).await.map_err(QueryError::other)?;
//!         Ok(QueryResult::from_json_rows(rows, 0))
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "bigquery"
//!     }
//! }
//! ```

pub mod backend;
pub mod error;
pub mod result;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use backend::QueryBackend;
pub use error::QueryError;
pub use result::{Column, DataType, QueryResult};

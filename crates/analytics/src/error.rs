//! Analytics error types

use chrono::NaiveDate;
use thiserror::Error;

/// Request-shape errors
///
/// Always detected locally, before anything is submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// End date precedes start date
    #[error("end date {end} must be on or after start date {start}")]
    InvalidDateRange {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },

    /// Interval is not one of day, hour, week, month
    #[error("unknown interval '{0}': must be one of day, hour, week, month")]
    UnknownInterval(String),

    /// Unsupported filter operator
    #[error("unsupported operator: {0}")]
    UnknownOperator(String),

    /// Measure is not totals or uniques
    #[error("unknown measure '{0}': must be totals or uniques")]
    UnknownMeasure(String),

    /// Time zone is not a known IANA name
    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// Property path does not match a recognized shape
    #[error("invalid property path: {0}")]
    InvalidProperty(String),

    /// Filter has the wrong number of values for its operator
    #[error("operator {operator} on '{property}' {reason}")]
    InvalidFilterValues {
        /// Property being filtered
        property: String,
        /// Operator as written in SQL
        operator: &'static str,
        /// What was wrong
        reason: &'static str,
    },

    /// No event names given
    #[error("events must contain at least one event name")]
    NoEvents,

    /// Event name is empty
    #[error("event names must not be empty")]
    EmptyEventName,

    /// No funnel steps given
    #[error("steps must contain at least one funnel step")]
    NoSteps,

    /// Custom aggregate expression is blank
    #[error("formula must not be empty")]
    EmptyFormula,

    /// Client configuration is unusable
    #[error("{0}")]
    InvalidConfig(String),

    /// Funnel step window bounds are negative or inverted
    #[error("funnel step {step} ({event}): {reason}")]
    InvalidWindow {
        /// 1-based step number
        step: usize,
        /// Step event name
        event: String,
        /// What was wrong
        reason: &'static str,
    },
}

/// Analytics errors
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Malformed request, raised before any query submission
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Backend failure, propagated unchanged
    #[error("query failed: {0}")]
    Execution(#[from] ga4_query::QueryError),

    /// Backend returned rows the result table cannot be built from
    #[error("malformed result: {0}")]
    MalformedResult(String),
}

impl AnalyticsError {
    /// Whether this error was raised before reaching the backend
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalyticsError::Validation(_))
    }
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

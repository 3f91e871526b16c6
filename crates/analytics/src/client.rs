//! GA4 analytics client
//!
//! Builds SQL for a request, submits it once to the backend and pivots the
//! rows into a [`ResultTable`].

use std::time::Instant;

use tracing::debug;

use crate::config::{ConfigError, Ga4Config};
use crate::error::Result;
use crate::events::{EVENT_NAME_COLUMN, EventsRequest, events_query};
use crate::funnel::{FunnelRequest, funnel_query};
use crate::table::{Pivot, ResultTable};
use ga4_query::QueryBackend;

/// Client for events and funnel queries against a GA4 export table
pub struct Ga4Client {
    backend: Box<dyn QueryBackend>,
    config: Ga4Config,
}

impl Ga4Client {
    /// Create a client over an already-authenticated backend
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(
        backend: Box<dyn QueryBackend>,
        config: Ga4Config,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Ga4Config {
        &self.config
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// SQL for an events request, without executing it
    pub fn events_sql(&self, request: &EventsRequest) -> Result<String> {
        let (sql, _) = events_query(&self.config, request)?;
        Ok(sql)
    }

    /// SQL for a funnel request, without executing it
    pub fn funnel_sql(&self, request: &FunnelRequest) -> Result<String> {
        let (sql, _) = funnel_query(&self.config, request)?;
        Ok(sql)
    }

    /// Time series of event counts or uniques
    ///
    /// Columns are the grouping values, plus the event name when more than
    /// one event is requested. With neither, the single column is `value`.
    pub async fn request_events(&self, request: &EventsRequest) -> Result<ResultTable> {
        let (sql, scope) = events_query(&self.config, request)?;

        let mut group_columns = scope.group_aliases();
        if request.events.len() > 1 {
            group_columns.push(EVENT_NAME_COLUMN.to_string());
        }

        debug!(
            events = request.events.len(),
            interval = %scope.interval,
            groups = scope.group_by.len(),
            sql = %sql,
            "requesting events"
        );

        let pivot = Pivot::events(
            scope.interval.alias(),
            scope.range.buckets(scope.interval),
            group_columns,
        );
        self.run(&sql, &pivot).await
    }

    /// Funnel conversion counts per bucket of the first step
    ///
    /// Columns are step numbers `1..=n`, followed by the grouping values.
    pub async fn request_funnel(&self, request: &FunnelRequest) -> Result<ResultTable> {
        let (sql, scope) = funnel_query(&self.config, request)?;

        debug!(
            steps = request.steps.len(),
            interval = %scope.interval,
            groups = scope.group_by.len(),
            sql = %sql,
            "requesting funnel"
        );

        let pivot = Pivot::funnel(
            scope.interval.alias(),
            scope.range.buckets(scope.interval),
            scope.group_aliases(),
            request.steps.len(),
        );
        self.run(&sql, &pivot).await
    }

    async fn run(&self, sql: &str, pivot: &Pivot) -> Result<ResultTable> {
        let started = Instant::now();
        let result = self.backend.execute(sql).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            backend = self.backend.name(),
            rows = result.row_count,
            columns = result.columns.len(),
            elapsed_ms,
            "query complete"
        );

        pivot.apply(&result)
    }
}

//! Events queries
//!
//! Event counts (or distinct users) per time bucket, optionally grouped by
//! one or more properties.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::builder::QueryBuilder;
use crate::config::Ga4Config;
use crate::error::ValidationError;
use crate::filter::{Condition, Interval, Measure, conditions_to_sql};
use crate::property::{Property, parse_group_by};
use crate::sql::{literal_list, quote_table};
use crate::timerange::{DateRange, parse_time_zone};

/// Output column holding the metric
pub const VALUE_COLUMN: &str = "value";

/// Output column holding the event name
pub const EVENT_NAME_COLUMN: &str = "event_name";

fn default_interval() -> String {
    Interval::default().as_str().to_string()
}

/// An events query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsRequest {
    /// Event names to count
    pub events: Vec<String>,
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
    /// IANA time zone; the client's configured zone when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// What to count
    #[serde(default)]
    pub measure: Measure,
    /// Aggregate expression replacing the measure
    ///
    /// Embedded in the SQL exactly as given. Never pass untrusted input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Filter conditions (AND-joined)
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Property paths to group by
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Bucket interval: day, hour, week or month
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl EventsRequest {
    /// Create a daily totals request
    pub fn new<S: Into<String>>(
        events: impl IntoIterator<Item = S>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            events: events.into_iter().map(Into::into).collect(),
            start,
            end,
            time_zone: None,
            measure: Measure::default(),
            formula: None,
            conditions: Vec::new(),
            group_by: Vec::new(),
            interval: default_interval(),
        }
    }

    /// Set the time zone
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Set the measure
    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    /// Replace the measure with a custom aggregate expression
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Add a filter condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a grouping property
    pub fn with_group_by(mut self, property: impl Into<String>) -> Self {
        self.group_by.push(property.into());
        self
    }

    /// Set the bucket interval
    pub fn with_interval(mut self, interval: impl AsRef<str>) -> Self {
        self.interval = interval.as_ref().to_string();
        self
    }
}

/// Time zone, range, interval and grouping shared by events and funnels
#[derive(Debug, Clone)]
pub(crate) struct QueryScope {
    pub tz: Tz,
    pub range: DateRange,
    pub interval: Interval,
    pub group_by: Vec<Property>,
}

impl QueryScope {
    /// Validate and resolve the request-independent parts of a query
    ///
    /// The configuration is checked first, since its identity column and
    /// table end up in the SQL.
    ///
    /// `reserved` lists output columns a grouping alias must not shadow; the
    /// bucket alias is always reserved.
    pub fn resolve(
        config: &Ga4Config,
        time_zone: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
        group_by: &[String],
        reserved: &[&str],
    ) -> Result<Self, ValidationError> {
        config
            .validate()
            .map_err(|e| ValidationError::InvalidConfig(e.to_string()))?;

        let tz = parse_time_zone(time_zone.unwrap_or(&config.time_zone))?;
        let range = DateRange::new(start, end, tz)?;
        let interval = Interval::parse(interval)?;

        let mut reserved = reserved.to_vec();
        reserved.push(interval.alias());
        let group_by = parse_group_by(group_by, &reserved)?;

        Ok(Self {
            tz,
            range,
            interval,
            group_by,
        })
    }

    /// Canonical time zone name for SQL
    pub fn tz_name(&self) -> &'static str {
        self.tz.name()
    }

    /// Output aliases of the grouping properties, in order
    pub fn group_aliases(&self) -> Vec<String> {
        self.group_by.iter().map(|p| p.alias().to_string()).collect()
    }
}

/// Build the events SQL for a request
///
/// # Errors
///
/// Returns a [`ValidationError`] for any malformed part of the request.
pub fn build_events_sql(
    config: &Ga4Config,
    request: &EventsRequest,
) -> Result<String, ValidationError> {
    events_query(config, request).map(|(sql, _)| sql)
}

pub(crate) fn events_query(
    config: &Ga4Config,
    request: &EventsRequest,
) -> Result<(String, QueryScope), ValidationError> {
    if request.events.is_empty() {
        return Err(ValidationError::NoEvents);
    }
    if request.events.iter().any(|e| e.trim().is_empty()) {
        return Err(ValidationError::EmptyEventName);
    }

    let scope = QueryScope::resolve(
        config,
        request.time_zone.as_deref(),
        request.start,
        request.end,
        &request.interval,
        &request.group_by,
        &[VALUE_COLUMN, EVENT_NAME_COLUMN],
    )?;
    let conditions = conditions_to_sql(&request.conditions)?;

    let metric = match request.formula.as_deref() {
        Some(formula) if formula.trim().is_empty() => return Err(ValidationError::EmptyFormula),
        Some(formula) => formula.trim().to_string(),
        None => request.measure.expression(&config.user_id_col),
    };

    let mut builder = QueryBuilder::new(quote_table(&config.table_id))
        .with_time_bucket(scope.interval, scope.tz_name())
        .select(EVENT_NAME_COLUMN)
        .select_as(metric, VALUE_COLUMN)
        .group_by(EVENT_NAME_COLUMN);
    for property in &scope.group_by {
        builder = builder.with_breakdown(property);
    }

    let window = scope.range.window();
    builder = builder
        .where_clause(format!(
            "{} IN {}",
            EVENT_NAME_COLUMN,
            literal_list(&request.events)
        ))
        .where_clauses(conditions);
    if config.is_wildcard() {
        builder = builder.where_clause(window.table_suffix_condition());
    }
    let sql = builder.where_clause(window.timestamp_condition()).build();

    Ok((sql, scope))
}

//! Funnel queries
//!
//! Counts the identities that perform each step in order, per time bucket of
//! the first step. Every step after the first is joined to the previous one
//! on the identity column, constrained by the elapsed time between them.

use chrono::{Duration, NaiveDate};

use crate::builder::QueryBuilder;
use crate::config::Ga4Config;
use crate::error::ValidationError;
use crate::events::QueryScope;
use crate::filter::{Condition, Interval, conditions_to_sql};
use crate::sql::{literal, quote_table};
use crate::timerange::ScanWindow;

/// Column level name for step counts in funnel results
pub const STEP_LEVEL: &str = "step";

const EVENT_TIMESTAMP: &str = "event_timestamp";

/// A single funnel step
///
/// Windows are measured from the previous step's event for the same
/// identity and are ignored on the first step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelStep {
    /// Event name for this step
    pub event_name: String,
    /// Minimum time after the previous step; strictly after it when absent
    pub min_window: Option<Duration>,
    /// Maximum time after the previous step; unbounded when absent
    pub max_window: Option<Duration>,
    /// Filter conditions on this step's events
    pub conditions: Vec<Condition>,
}

impl FunnelStep {
    /// Create a step with no window bounds
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            min_window: None,
            max_window: None,
            conditions: Vec::new(),
        }
    }

    /// Set the minimum time after the previous step
    pub fn with_min_window(mut self, window: Duration) -> Self {
        self.min_window = Some(window);
        self
    }

    /// Set the maximum time after the previous step
    pub fn with_max_window(mut self, window: Duration) -> Self {
        self.max_window = Some(window);
        self
    }

    /// Add a filter condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// A funnel query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnelRequest {
    /// Ordered steps
    pub steps: Vec<FunnelStep>,
    /// First day (inclusive) of the first step
    pub start: NaiveDate,
    /// Last day (inclusive) of the first step
    pub end: NaiveDate,
    /// IANA time zone; the client's configured zone when absent
    pub time_zone: Option<String>,
    /// Property paths to group by, taken from the first step
    pub group_by: Vec<String>,
    /// Bucket interval: day, hour, week or month
    pub interval: String,
}

impl FunnelRequest {
    /// Create a daily funnel request
    pub fn new(steps: Vec<FunnelStep>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            steps,
            start,
            end,
            time_zone: None,
            group_by: Vec::new(),
            interval: Interval::default().as_str().to_string(),
        }
    }

    /// Set the time zone
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
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

/// Validated window bounds of one step, in microseconds
#[derive(Debug, Clone, Copy)]
struct StepWindow {
    min_us: Option<i64>,
    max_us: Option<i64>,
}

/// Build the funnel SQL for a request
///
/// # Errors
///
/// Returns a [`ValidationError`] for any malformed part of the request.
pub fn build_funnel_sql(
    config: &Ga4Config,
    request: &FunnelRequest,
) -> Result<String, ValidationError> {
    funnel_query(config, request).map(|(sql, _)| sql)
}

pub(crate) fn funnel_query(
    config: &Ga4Config,
    request: &FunnelRequest,
) -> Result<(String, QueryScope), ValidationError> {
    if request.steps.is_empty() {
        return Err(ValidationError::NoSteps);
    }

    let windows = request
        .steps
        .iter()
        .enumerate()
        .map(|(idx, step)| validate_step(idx + 1, step))
        .collect::<Result<Vec<_>, _>>()?;

    let scope = QueryScope::resolve(
        config,
        request.time_zone.as_deref(),
        request.start,
        request.end,
        &request.interval,
        &request.group_by,
        &[config.user_id_col.as_str(), EVENT_TIMESTAMP],
    )?;

    let table = quote_table(&config.table_id);
    let id = &config.user_id_col;
    let base = scope.range.window();

    let mut builder = QueryBuilder::new("step1");
    let mut lower = Duration::zero();
    let mut upper = Some(Duration::zero());

    for (idx, (step, window)) in request.steps.iter().zip(&windows).enumerate() {
        let n = idx + 1;

        let scan = if n == 1 {
            base.clone()
        } else {
            lower = lower
                .checked_add(&step.min_window.unwrap_or_else(Duration::zero))
                .ok_or_else(|| too_large(n, step))?;
            upper = match (upper, step.max_window) {
                (Some(total), Some(max)) => {
                    Some(total.checked_add(&max).ok_or_else(|| too_large(n, step))?)
                }
                _ => None,
            };
            base.shifted(lower, upper).ok_or_else(|| too_large(n, step))?
        };

        let cte = step_cte(config, &table, &scope, step, &scan, n == 1)?;
        builder = builder.with_cte(format!("step{}", n), cte);

        if n > 1 {
            builder = builder.left_join(&format!("step{}", n), &join_conditions(id, n, window));
        }
    }

    let alias = scope.interval.alias();
    builder = builder
        .select(alias)
        .group_by(alias)
        .order_by(alias)
        .with_breakdown_aliases(&scope.group_by);
    for n in 1..=request.steps.len() {
        builder = builder.select_as(
            format!("COUNT(DISTINCT step{}.{})", n, id),
            format!("`{}`", n),
        );
    }

    Ok((builder.build(), scope))
}

fn validate_step(n: usize, step: &FunnelStep) -> Result<StepWindow, ValidationError> {
    let invalid = |reason| ValidationError::InvalidWindow {
        step: n,
        event: step.event_name.clone(),
        reason,
    };

    if step.event_name.trim().is_empty() {
        return Err(ValidationError::EmptyEventName);
    }
    if n == 1 {
        return Ok(StepWindow {
            min_us: None,
            max_us: None,
        });
    }

    let to_micros = |window: Option<Duration>| -> Result<Option<i64>, ValidationError> {
        match window {
            None => Ok(None),
            Some(d) if d < Duration::zero() => Err(invalid("window bounds must not be negative")),
            Some(d) => d
                .num_microseconds()
                .map(Some)
                .ok_or_else(|| invalid("window is too large")),
        }
    };

    let min_us = to_micros(step.min_window)?;
    let max_us = to_micros(step.max_window)?;
    if let (Some(min), Some(max)) = (min_us, max_us) {
        if min > max {
            return Err(invalid("minimum window exceeds maximum window"));
        }
    }

    Ok(StepWindow { min_us, max_us })
}

fn too_large(n: usize, step: &FunnelStep) -> ValidationError {
    ValidationError::InvalidWindow {
        step: n,
        event: step.event_name.clone(),
        reason: "window is too large",
    }
}

/// The events of one step within its scan window
///
/// The first step also carries the bucket and grouping projections.
fn step_cte(
    config: &Ga4Config,
    table: &str,
    scope: &QueryScope,
    step: &FunnelStep,
    scan: &ScanWindow,
    first: bool,
) -> Result<String, ValidationError> {
    let mut builder = QueryBuilder::new(table)
        .select(config.user_id_col.as_str())
        .select(EVENT_TIMESTAMP);
    if first {
        builder = builder.select(scope.interval.select_expr(scope.tz_name()));
        for property in &scope.group_by {
            builder = builder.select(property.projection());
        }
    }

    builder = builder
        .where_clause(format!("event_name = {}", literal(&step.event_name)))
        .where_clauses(conditions_to_sql(&step.conditions)?);
    if config.is_wildcard() {
        builder = builder.where_clause(scan.table_suffix_condition());
    }

    Ok(builder.where_clause(scan.timestamp_condition()).build())
}

fn join_conditions(id: &str, n: usize, window: &StepWindow) -> Vec<String> {
    let elapsed = format!(
        "step{n}.{ts} - step{prev}.{ts}",
        n = n,
        prev = n - 1,
        ts = EVENT_TIMESTAMP
    );

    let mut on = vec![format!("step{}.{} = step{}.{}", n, id, n - 1, id)];
    match window.min_us {
        Some(min) => on.push(format!("{} >= {}", elapsed, min)),
        None => on.push(format!("{} > 0", elapsed)),
    }
    if let Some(max) = window.max_us {
        on.push(format!("{} <= {}", elapsed, max));
    }
    on
}

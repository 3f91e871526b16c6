//! GA4 Analytics
//!
//! Events and funnel analytics over Google Analytics 4 BigQuery exports.
//!
//! # Overview
//!
//! This crate builds BigQuery Standard SQL for GA4 export tables and shapes
//! the rows into bucketed result tables. Queries run through any
//! `ga4-query` backend the caller provides. It includes:
//!
//! - **Requests**: Events (totals, uniques, custom formula) and funnels
//! - **Filters**: Conditions on columns, event parameters and user properties
//! - **Time**: Date ranges in any IANA time zone, hour/day/week/month buckets
//! - **Result tables**: Zero-filled, pivoted by grouping values
//!
//! # Usage
//!
//! ```ignore
//! use ga4_analytics::{Condition, EventsRequest, Ga4Client, Ga4Config, properties};
//!
//! let config = Ga4Config::new("my-project.analytics_123456.events_*");
//! let client = Ga4Client::new(backend, config)?;
//!
//! let request = EventsRequest::new(["page_view"], start, end)
//!     .with_group_by(properties::PLATFORM)
//!     .with_condition(Condition::eq(properties::geo::COUNTRY, "Norway"));
//!
//! let table = client.request_events(&request).await?;
//! ```
//!
//! # Funnels
//!
//! ```ignore
//! let request = FunnelRequest::new(
//!     vec![
//!         FunnelStep::new("session_start"),
//!         FunnelStep::new("add_to_cart").with_max_window(Duration::hours(1)),
//!         FunnelStep::new("purchase").with_max_window(Duration::days(1)),
//!     ],
//!     start,
//!     end,
//! );
//!
//! let table = client.request_funnel(&request).await?;
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod funnel;
pub mod properties;
pub mod property;
pub mod sql;
pub mod table;
pub mod timerange;

#[cfg(test)]
mod events_test;
#[cfg(test)]
mod timerange_test;

// Re-exports for convenience
pub use builder::QueryBuilder;
pub use client::Ga4Client;
pub use config::{ConfigError, Ga4Config};
pub use error::{AnalyticsError, Result, ValidationError};
pub use events::{EventsRequest, build_events_sql};
pub use filter::{Condition, Interval, Measure, Operator};
pub use funnel::{FunnelRequest, FunnelStep, build_funnel_sql};
pub use property::Property;
pub use table::ResultTable;
pub use timerange::{DateRange, ScanWindow};

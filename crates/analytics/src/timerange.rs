//! Date ranges, scan windows and time buckets
//!
//! Requests name inclusive calendar dates in a time zone. Those become
//! absolute instants for the timestamp predicate, UTC dates for sharded table
//! pruning, and the full list of bucket labels for zero filling.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::ValidationError;
use crate::filter::Interval;
use crate::sql::literal;

/// Steps tried when a local time falls into a DST gap (15 minutes each)
const GAP_SEARCH_STEPS: i64 = 4 * 24;

/// An inclusive calendar date range in a time zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
    tz: Tz,
}

impl DateRange {
    /// Create a new date range
    pub fn new(start: NaiveDate, end: NaiveDate, tz: Tz) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end, tz })
    }

    /// First calendar day
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar day (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        self.end
    }

    /// Time zone the dates are interpreted in
    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Start of the first day, local time
    pub fn start_ts(&self) -> DateTime<Tz> {
        localize(&self.tz, self.start, NaiveTime::default(), Edge::Start)
    }

    /// Last microsecond of the last day, local time
    pub fn end_ts(&self) -> DateTime<Tz> {
        let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or_default();
        localize(&self.tz, self.end, last, Edge::End)
    }

    /// The instants this range covers
    pub fn window(&self) -> ScanWindow {
        ScanWindow {
            start: self.start_ts(),
            end: Some(self.end_ts()),
        }
    }

    /// Every bucket label the range spans at `interval`, in order
    ///
    /// Labels use the same formats as the bucket expressions in generated SQL.
    pub fn buckets(&self, interval: Interval) -> Vec<String> {
        match interval {
            Interval::Day => days_between(self.start, self.end)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect(),
            Interval::Week => {
                let monday =
                    self.start - Duration::days(self.start.weekday().num_days_from_monday() as i64);
                days_between(monday, self.end)
                    .step_by(7)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect()
            }
            Interval::Month => {
                let mut labels: Vec<String> = Vec::new();
                for day in days_between(self.start, self.end) {
                    let label = day.format("%Y-%m").to_string();
                    if labels.last() != Some(&label) {
                        labels.push(label);
                    }
                }
                labels
            }
            Interval::Hour => {
                let end = self.end_ts().with_timezone(&Utc);
                let mut current = self.start_ts().with_timezone(&Utc);
                let mut labels: Vec<String> = Vec::new();
                while current <= end {
                    let label = current
                        .with_timezone(&self.tz)
                        .format("%Y-%m-%d %H:00:00")
                        .to_string();
                    // Repeated local hours at a DST fall-back share one label
                    if labels.last() != Some(&label) {
                        labels.push(label);
                    }
                    current += Duration::hours(1);
                }
                labels
            }
        }
    }
}

/// A span of absolute time to scan, possibly open-ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWindow {
    /// Inclusive lower bound
    pub start: DateTime<Tz>,
    /// Inclusive upper bound, `None` when unbounded
    pub end: Option<DateTime<Tz>>,
}

impl ScanWindow {
    /// Shift the window: lower edge by `lower`, upper edge by `upper`
    ///
    /// An absent `upper` opens the window on that side. Returns `None` when
    /// either edge leaves the representable range.
    pub fn shifted(&self, lower: Duration, upper: Option<Duration>) -> Option<Self> {
        let start = self.start.checked_add_signed(lower)?;
        let end = match (self.end, upper) {
            (Some(end), Some(delta)) => Some(end.checked_add_signed(delta)?),
            _ => None,
        };
        Some(Self { start, end })
    }

    /// Predicate on the event timestamp
    pub fn timestamp_condition(&self) -> String {
        let start = literal(&rfc3339(&self.start));
        match &self.end {
            Some(end) => format!(
                "TIMESTAMP_MICROS(event_timestamp) BETWEEN TIMESTAMP({}) AND TIMESTAMP({})",
                start,
                literal(&rfc3339(end))
            ),
            None => format!("TIMESTAMP_MICROS(event_timestamp) >= TIMESTAMP({})", start),
        }
    }

    /// `_TABLE_SUFFIX` predicate for wildcard (date-sharded) tables
    ///
    /// Shards are named by UTC date, so the bounds are the UTC dates of the
    /// window's edges. The trailing digits of the suffix are compared so that
    /// `intraday_YYYYMMDD` shards match as well.
    pub fn table_suffix_condition(&self) -> String {
        let lo = shard_date(&self.start);
        match &self.end {
            Some(end) => format!(
                "REGEXP_EXTRACT(_TABLE_SUFFIX, r'(\\d+)$') BETWEEN {} AND {}",
                literal(&lo),
                literal(&shard_date(end))
            ),
            None => format!("REGEXP_EXTRACT(_TABLE_SUFFIX, r'(\\d+)$') >= {}", literal(&lo)),
        }
    }
}

/// Parse an IANA time zone name
pub fn parse_time_zone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::UnknownTimeZone(name.to_string()))
}

#[derive(Clone, Copy)]
enum Edge {
    Start,
    End,
}

/// Resolve a local date and time to an instant
///
/// Ambiguous times resolve outward (earliest for a start, latest for an end).
/// Times inside a DST gap move outward until they exist.
fn localize(tz: &Tz, date: NaiveDate, time: NaiveTime, edge: Edge) -> DateTime<Tz> {
    let naive = date.and_time(time);
    let step = match edge {
        Edge::Start => Duration::minutes(15),
        Edge::End => Duration::minutes(-15),
    };

    let mut candidate = naive;
    for _ in 0..GAP_SEARCH_STEPS {
        match (tz.from_local_datetime(&candidate), edge) {
            (LocalResult::Single(dt), _) => return dt,
            (LocalResult::Ambiguous(earliest, _), Edge::Start) => return earliest,
            (LocalResult::Ambiguous(_, latest), Edge::End) => return latest,
            (LocalResult::None, _) => candidate += step,
        }
    }

    tz.from_utc_datetime(&naive)
}

fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

fn rfc3339(ts: &DateTime<Tz>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string()
}

fn shard_date(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Utc).format("%Y%m%d").to_string()
}

//! Tests for date ranges, scan windows and buckets

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;

use crate::error::ValidationError;
use crate::filter::Interval;
use crate::timerange::{DateRange, parse_time_zone};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_new_rejects_inverted_range() {
    let err = DateRange::new(date(2020, 11, 2), date(2020, 11, 1), Tz::UTC).unwrap_err();
    assert_eq!(
        err,
        ValidationError::InvalidDateRange {
            start: date(2020, 11, 2),
            end: date(2020, 11, 1),
        }
    );
}

#[test]
fn test_single_day_range() {
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 1), Tz::UTC).unwrap();
    assert_eq!(range.start_date(), range.end_date());
    assert_eq!(range.buckets(Interval::Day), vec!["2020-11-01"]);
}

#[test]
fn test_parse_time_zone() {
    assert_eq!(parse_time_zone("Europe/Oslo").unwrap(), Tz::Europe__Oslo);
    assert_eq!(
        parse_time_zone("Mars/Base"),
        Err(ValidationError::UnknownTimeZone("Mars/Base".to_string()))
    );
}

#[test]
fn test_utc_window_conditions() {
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 2), Tz::UTC).unwrap();
    let window = range.window();

    assert_eq!(
        window.timestamp_condition(),
        "TIMESTAMP_MICROS(event_timestamp) BETWEEN TIMESTAMP('2020-11-01T00:00:00+00:00') AND TIMESTAMP('2020-11-02T23:59:59.999999+00:00')"
    );
    assert_eq!(
        window.table_suffix_condition(),
        r"REGEXP_EXTRACT(_TABLE_SUFFIX, r'(\d+)$') BETWEEN '20201101' AND '20201102'"
    );
}

#[test]
fn test_local_window_uses_utc_shards() {
    let tz = parse_time_zone("America/Los_Angeles").unwrap();
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 2), tz).unwrap();
    let window = range.window();

    // PDT at the start, PST at the end
    assert!(window.timestamp_condition().contains("TIMESTAMP('2020-11-01T00:00:00-07:00')"));
    assert!(window.timestamp_condition().contains("TIMESTAMP('2020-11-02T23:59:59.999999-08:00')"));
    assert!(window.table_suffix_condition().ends_with("BETWEEN '20201101' AND '20201103'"));
}

#[test]
fn test_start_inside_dst_gap() {
    // Clocks jumped from 00:00 to 01:00
    let tz = parse_time_zone("America/Sao_Paulo").unwrap();
    let range = DateRange::new(date(2018, 11, 4), date(2018, 11, 4), tz).unwrap();

    assert!(range
        .window()
        .timestamp_condition()
        .contains("TIMESTAMP('2018-11-04T01:00:00-02:00')"));
}

#[test]
fn test_shifted_window() {
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 2), Tz::UTC).unwrap();
    let window = range.window();

    let shifted = window
        .shifted(Duration::hours(1), Some(Duration::days(1)))
        .unwrap();
    assert!(shifted.timestamp_condition().contains("TIMESTAMP('2020-11-01T01:00:00+00:00')"));
    assert!(shifted.timestamp_condition().contains("TIMESTAMP('2020-11-03T23:59:59.999999+00:00')"));
    assert!(shifted.table_suffix_condition().ends_with("BETWEEN '20201101' AND '20201103'"));

    let open = window.shifted(Duration::zero(), None).unwrap();
    assert_eq!(open.end, None);
    assert_eq!(
        open.timestamp_condition(),
        "TIMESTAMP_MICROS(event_timestamp) >= TIMESTAMP('2020-11-01T00:00:00+00:00')"
    );
    assert_eq!(
        open.table_suffix_condition(),
        r"REGEXP_EXTRACT(_TABLE_SUFFIX, r'(\d+)$') >= '20201101'"
    );
}

#[test]
fn test_day_buckets() {
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 3), Tz::UTC).unwrap();
    assert_eq!(
        range.buckets(Interval::Day),
        vec!["2020-11-01", "2020-11-02", "2020-11-03"]
    );
}

#[test]
fn test_week_buckets_start_monday() {
    let range = DateRange::new(date(2020, 11, 4), date(2020, 11, 17), Tz::UTC).unwrap();
    assert_eq!(
        range.buckets(Interval::Week),
        vec!["2020-11-02", "2020-11-09", "2020-11-16"]
    );
}

#[test]
fn test_month_buckets() {
    let range = DateRange::new(date(2020, 11, 20), date(2021, 1, 5), Tz::UTC).unwrap();
    assert_eq!(
        range.buckets(Interval::Month),
        vec!["2020-11", "2020-12", "2021-01"]
    );
}

#[test]
fn test_hour_buckets() {
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 1), Tz::UTC).unwrap();
    let buckets = range.buckets(Interval::Hour);

    assert_eq!(buckets.len(), 24);
    assert_eq!(buckets[0], "2020-11-01 00:00:00");
    assert_eq!(buckets[23], "2020-11-01 23:00:00");
}

#[test]
fn test_hour_buckets_across_dst() {
    let tz = parse_time_zone("America/Los_Angeles").unwrap();

    // Fall back: 01:00 happens twice but is one bucket
    let range = DateRange::new(date(2020, 11, 1), date(2020, 11, 1), tz).unwrap();
    let buckets = range.buckets(Interval::Hour);
    assert_eq!(buckets.len(), 24);
    assert_eq!(buckets[1], "2020-11-01 01:00:00");
    assert_eq!(buckets[2], "2020-11-01 02:00:00");

    // Spring forward: 02:00 never happens
    let range = DateRange::new(date(2021, 3, 14), date(2021, 3, 14), tz).unwrap();
    let buckets = range.buckets(Interval::Hour);
    assert_eq!(buckets.len(), 23);
    assert_eq!(buckets[2], "2021-03-14 03:00:00");
}

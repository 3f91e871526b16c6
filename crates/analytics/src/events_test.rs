//! Tests for events SQL generation

use chrono::NaiveDate;

use crate::config::Ga4Config;
use crate::error::ValidationError;
use crate::events::{EventsRequest, build_events_sql};
use crate::filter::{Condition, Measure};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config() -> Ga4Config {
    Ga4Config::new("proj.analytics_1.events_*")
}

fn page_views() -> EventsRequest {
    EventsRequest::new(["page_view"], date(2020, 11, 1), date(2020, 11, 2))
}

#[test]
fn test_full_sql() {
    let request = page_views().with_group_by("platform");
    let sql = build_events_sql(&config(), &request).unwrap();

    assert_eq!(
        sql,
        "SELECT FORMAT_DATE('%Y-%m-%d', DATE(TIMESTAMP_MICROS(event_timestamp), 'UTC')) AS event_date, \
         event_name, COUNT(*) AS value, platform AS `platform` \
         FROM `proj.analytics_1.events_*` \
         WHERE (event_name IN ('page_view')) \
         AND (REGEXP_EXTRACT(_TABLE_SUFFIX, r'(\\d+)$') BETWEEN '20201101' AND '20201102') \
         AND (TIMESTAMP_MICROS(event_timestamp) BETWEEN TIMESTAMP('2020-11-01T00:00:00+00:00') AND TIMESTAMP('2020-11-02T23:59:59.999999+00:00')) \
         GROUP BY event_date, event_name, `platform` \
         ORDER BY event_date ASC"
    );
}

#[test]
fn test_measures_and_formula() {
    let sql = build_events_sql(&config(), &page_views()).unwrap();
    assert!(sql.contains("COUNT(*) AS value"));

    let request = page_views().with_measure(Measure::Uniques);
    let sql = build_events_sql(&config(), &request).unwrap();
    assert!(sql.contains("COUNT(DISTINCT user_pseudo_id) AS value"));

    let config = config().with_user_id_col("user_id");
    let sql = build_events_sql(&config, &request).unwrap();
    assert!(sql.contains("COUNT(DISTINCT user_id) AS value"));

    let request = request.with_formula("SUM(ecommerce.purchase_revenue)");
    let sql = build_events_sql(&config, &request).unwrap();
    assert!(sql.contains("SUM(ecommerce.purchase_revenue) AS value"));
    assert!(!sql.contains("COUNT("));
}

#[test]
fn test_blank_formula_rejected() {
    for formula in ["", "   "] {
        let request = page_views().with_formula(formula);
        assert_eq!(
            build_events_sql(&config(), &request),
            Err(ValidationError::EmptyFormula)
        );
    }
}

#[test]
fn test_unusable_config_rejected() {
    let request = page_views().with_measure(Measure::Uniques);

    let config = Ga4Config::new("p.d.events_*").with_user_id_col("x) FROM t; DROP TABLE y; --");
    let err = build_events_sql(&config, &request).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidConfig(_)));
    assert!(err.to_string().contains("user_id_col"));

    let config = Ga4Config::new("  ");
    assert!(matches!(
        build_events_sql(&config, &request),
        Err(ValidationError::InvalidConfig(_))
    ));

    let config = Ga4Config::new("p.d.events_*").with_time_zone("Nowhere/Land");
    assert!(matches!(
        build_events_sql(&config, &request),
        Err(ValidationError::InvalidConfig(_))
    ));
}

#[test]
fn test_reserved_word_group_alias_quoted() {
    let request = page_views().with_group_by("event_params.order");
    let sql = build_events_sql(&config(), &request).unwrap();

    assert!(sql.contains("props.key = 'order') AS `order`"));
    assert!(sql.contains("GROUP BY event_date, event_name, `order`"));
}

#[test]
fn test_multiple_events_and_conditions() {
    let request = EventsRequest::new(["sign_up", "purchase"], date(2021, 1, 1), date(2021, 1, 31))
        .with_condition(Condition::is_in("platform", ["IOS", "ANDROID"]))
        .with_condition(Condition::eq("event_params.currency", "NOK"));
    let sql = build_events_sql(&config(), &request).unwrap();

    assert!(sql.contains(
        "WHERE (event_name IN ('sign_up', 'purchase')) AND (platform IN ('IOS', 'ANDROID')) \
         AND (EXISTS (SELECT * FROM UNNEST(event_params) WHERE key = 'currency' AND value.string_value = 'NOK'))"
    ));
}

#[test]
fn test_event_names_escaped() {
    let request = EventsRequest::new(["it's"], date(2021, 1, 1), date(2021, 1, 1));
    let sql = build_events_sql(&config(), &request).unwrap();
    assert!(sql.contains("event_name IN ('it\\'s')"));
}

#[test]
fn test_non_wildcard_table_has_no_suffix_filter() {
    let config = Ga4Config::new("proj.analytics_1.events_20201101");
    let sql = build_events_sql(&config, &page_views()).unwrap();

    assert!(!sql.contains("_TABLE_SUFFIX"));
    assert!(sql.contains("FROM `proj.analytics_1.events_20201101`"));
    assert!(sql.contains("TIMESTAMP_MICROS(event_timestamp) BETWEEN"));
}

#[test]
fn test_request_time_zone_overrides_config() {
    let config = config().with_time_zone("Europe/Oslo");

    let sql = build_events_sql(&config, &page_views()).unwrap();
    assert!(sql.contains("DATE(TIMESTAMP_MICROS(event_timestamp), 'Europe/Oslo')"));
    assert!(sql.contains("TIMESTAMP('2020-11-01T00:00:00+01:00')"));
    assert!(sql.contains("BETWEEN '20201031' AND '20201102'"));

    let request = page_views().with_time_zone("Asia/Tokyo");
    let sql = build_events_sql(&config, &request).unwrap();
    assert!(sql.contains("DATE(TIMESTAMP_MICROS(event_timestamp), 'Asia/Tokyo')"));
}

#[test]
fn test_nested_group_by() {
    let request = page_views()
        .with_interval("week")
        .with_group_by("geo.country")
        .with_group_by("user_properties.plan");
    let sql = build_events_sql(&config(), &request).unwrap();

    assert!(sql.contains("AS event_week, event_name, COUNT(*) AS value, geo.country AS `country`, (SELECT props.value.string_value FROM UNNEST(user_properties) props WHERE props.key = 'plan') AS `plan` FROM"));
    assert!(sql.contains("GROUP BY event_week, event_name, `country`, `plan`"));
    assert!(sql.ends_with("ORDER BY event_week ASC"));
}

#[test]
fn test_date_interval_alias() {
    let request = page_views().with_interval("date");
    let sql = build_events_sql(&config(), &request).unwrap();
    assert!(sql.contains("AS event_date"));
}

#[test]
fn test_validation_errors() {
    let cfg = config();

    let empty = EventsRequest::new(Vec::<String>::new(), date(2020, 11, 1), date(2020, 11, 2));
    assert_eq!(build_events_sql(&cfg, &empty), Err(ValidationError::NoEvents));

    let blank = EventsRequest::new([" "], date(2020, 11, 1), date(2020, 11, 2));
    assert_eq!(build_events_sql(&cfg, &blank), Err(ValidationError::EmptyEventName));

    let inverted = EventsRequest::new(["a"], date(2020, 11, 2), date(2020, 11, 1));
    assert!(matches!(
        build_events_sql(&cfg, &inverted),
        Err(ValidationError::InvalidDateRange { .. })
    ));

    let interval = page_views().with_interval("fortnight");
    assert_eq!(
        build_events_sql(&cfg, &interval),
        Err(ValidationError::UnknownInterval("fortnight".to_string()))
    );

    let tz = page_views().with_time_zone("Nowhere/City");
    assert!(matches!(
        build_events_sql(&cfg, &tz),
        Err(ValidationError::UnknownTimeZone(_))
    ));

    let group = page_views().with_group_by("event_params.a.b");
    assert!(matches!(
        build_events_sql(&cfg, &group),
        Err(ValidationError::InvalidProperty(_))
    ));

    let reserved = page_views().with_group_by("event_params.value");
    assert!(build_events_sql(&cfg, &reserved).is_err());

    let filter = page_views().with_condition(Condition::is_in("platform", Vec::<String>::new()));
    assert!(matches!(
        build_events_sql(&cfg, &filter),
        Err(ValidationError::InvalidFilterValues { .. })
    ));
}

#[test]
fn test_request_deserialize_defaults() {
    let json = r#"{
        "events": ["page_view"],
        "start": "2020-11-01",
        "end": "2020-11-02",
        "conditions": [{"prop": "platform", "op": "=", "values": ["WEB"]}]
    }"#;
    let request: EventsRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.interval, "day");
    assert_eq!(request.measure, Measure::Totals);
    assert!(request.group_by.is_empty());
    assert_eq!(request.conditions, vec![Condition::eq("platform", "WEB")]);
}

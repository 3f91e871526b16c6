//! Filter conditions, measures and bucket intervals
//!
//! The pieces of a request that decide what rows count and how they are
//! aggregated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::property::Property;
use crate::sql::literal;

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Property path to filter on (`platform`, `event_params.currency`, ...)
    #[serde(alias = "prop")]
    pub property: String,
    /// Comparison operator
    #[serde(alias = "op")]
    pub operator: Operator,
    /// Value(s) to compare against
    pub values: Vec<String>,
}

impl Condition {
    /// Create a condition
    pub fn new(property: impl Into<String>, operator: Operator, values: Vec<String>) -> Self {
        Self {
            property: property.into(),
            operator,
            values,
        }
    }

    /// Create a condition from an operator string
    pub fn parse(
        property: impl Into<String>,
        operator: &str,
        values: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(property, Operator::parse(operator)?, values))
    }

    /// Create an IN condition
    pub fn is_in<S: Into<String>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            property,
            Operator::In,
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Create a NOT IN condition
    pub fn not_in<S: Into<String>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            property,
            Operator::NotIn,
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Create an equality condition
    pub fn eq(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(property, Operator::Eq, vec![value.into()])
    }

    /// Create a not-equal condition
    pub fn ne(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(property, Operator::Ne, vec![value.into()])
    }

    /// Render as a WHERE predicate
    ///
    /// Flat columns compare directly. Nested keys become an `EXISTS` over the
    /// unnested record; when every value looks numeric the record's string
    /// value is cast to `NUMERIC` and compared against bare numbers.
    pub fn to_sql(&self) -> Result<String, ValidationError> {
        let property = Property::parse(&self.property)?;
        let op = self.operator.as_sql();

        let sql = match property.namespace() {
            None => format!("{} {} {}", property, op, self.values_sql(false)?),
            Some(namespace) => {
                let numeric = self.values.iter().all(|v| NUMERIC.is_match(v));
                let value_expr = if numeric {
                    "CAST(value.string_value AS NUMERIC)"
                } else {
                    "value.string_value"
                };
                format!(
                    "EXISTS (SELECT * FROM UNNEST({}) WHERE key = {} AND {} {} {})",
                    namespace,
                    literal(property.alias()),
                    value_expr,
                    op,
                    self.values_sql(numeric)?
                )
            }
        };

        Ok(sql)
    }

    /// Values as SQL: quoted literals, or bare numbers when `numeric`
    fn values_sql(&self, numeric: bool) -> Result<String, ValidationError> {
        let invalid = |reason| ValidationError::InvalidFilterValues {
            property: self.property.clone(),
            operator: self.operator.as_sql(),
            reason,
        };
        let render = |value: &String| {
            if numeric {
                value.clone()
            } else {
                literal(value)
            }
        };

        if self.operator.is_list() {
            if self.values.is_empty() {
                return Err(invalid("requires at least one value"));
            }
            let items: Vec<String> = self.values.iter().map(render).collect();
            Ok(format!("({})", items.join(", ")))
        } else {
            match self.values.as_slice() {
                [value] => Ok(render(value)),
                _ => Err(invalid("requires exactly one value")),
            }
        }
    }
}

/// Render all conditions, failing on the first invalid one
pub(crate) fn conditions_to_sql(conditions: &[Condition]) -> Result<Vec<String>, ValidationError> {
    conditions.iter().map(Condition::to_sql).collect()
}

/// Filter operators
///
/// Deserializes from any spelling [`Operator::parse`] accepts and serializes
/// as the SQL spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    /// In list
    In,
    /// Not in list
    NotIn,
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Greater than
    Gt,
    /// Less than
    Lt,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
}

impl Operator {
    /// Parse operator from string
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "in" => Ok(Self::In),
            "not in" | "not_in" => Ok(Self::NotIn),
            "=" | "==" | "eq" => Ok(Self::Eq),
            "!=" | "<>" | "ne" => Ok(Self::Ne),
            ">" | "gt" => Ok(Self::Gt),
            "<" | "lt" => Ok(Self::Lt),
            ">=" | "gte" => Ok(Self::Gte),
            "<=" | "lte" => Ok(Self::Lte),
            _ => Err(ValidationError::UnknownOperator(s.to_string())),
        }
    }

    /// SQL spelling
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }

    /// Whether the operator takes a value list
    pub fn is_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl TryFrom<String> for Operator {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_sql().to_string()
    }
}

/// What an events query counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Measure {
    /// Every matching event
    #[default]
    Totals,
    /// Distinct identities with a matching event
    Uniques,
}

impl Measure {
    /// Parse measure from string
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "totals" | "total" | "count" => Ok(Self::Totals),
            "uniques" | "unique" | "distinct" => Ok(Self::Uniques),
            _ => Err(ValidationError::UnknownMeasure(s.to_string())),
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Totals => "totals",
            Self::Uniques => "uniques",
        }
    }

    /// Metric expression over the given identity column
    pub fn expression(&self, user_id_col: &str) -> String {
        match self {
            Self::Totals => "COUNT(*)".to_string(),
            Self::Uniques => format!("COUNT(DISTINCT {})", user_id_col),
        }
    }
}

impl TryFrom<String> for Measure {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Measure> for String {
    fn from(measure: Measure) -> Self {
        measure.as_str().to_string()
    }
}

/// Time bucket for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// Per local hour
    Hour,
    /// Per local calendar day
    #[default]
    Day,
    /// Per Monday-start week
    Week,
    /// Per calendar month
    Month,
}

impl Interval {
    /// Parse interval from string
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hourly" | "1h" => Ok(Self::Hour),
            "day" | "daily" | "date" | "1d" => Ok(Self::Day),
            "week" | "weekly" | "1w" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            _ => Err(ValidationError::UnknownInterval(s.to_string())),
        }
    }

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Output column alias for the bucket
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Hour => "event_hour",
            Self::Day => "event_date",
            Self::Week => "event_week",
            Self::Month => "event_month",
        }
    }

    /// Bucket expression evaluated in `tz`, aliased
    pub fn select_expr(&self, tz: &str) -> String {
        let tz = literal(tz);
        let expr = match self {
            Self::Hour => format!(
                "FORMAT_TIMESTAMP('%Y-%m-%d %H:00:00', TIMESTAMP_TRUNC(TIMESTAMP_MICROS(event_timestamp), HOUR, {tz}), {tz})"
            ),
            Self::Day => format!(
                "FORMAT_DATE('%Y-%m-%d', DATE(TIMESTAMP_MICROS(event_timestamp), {tz}))"
            ),
            Self::Week => format!(
                "FORMAT_DATE('%Y-%m-%d', DATE_TRUNC(DATE(TIMESTAMP_MICROS(event_timestamp), {tz}), WEEK(MONDAY)))"
            ),
            Self::Month => format!(
                "FORMAT_DATE('%Y-%m', DATE_TRUNC(DATE(TIMESTAMP_MICROS(event_timestamp), {tz}), MONTH))"
            ),
        };
        format!("{} AS {}", expr, self.alias())
    }
}

impl AsRef<str> for Interval {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

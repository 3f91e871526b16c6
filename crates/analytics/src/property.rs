//! Property paths
//!
//! GA4 export rows have flat and nested-record columns (`platform`,
//! `geo.country`) plus two repeated key/value records, `event_params` and
//! `user_properties`. A property path names one of those and knows how to
//! project it, filter on it and alias it.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::sql::{literal, quote_identifier};

/// Namespace prefix for event parameters
pub const EVENT_PARAMS: &str = "event_params";

/// Namespace prefix for user properties
pub const USER_PROPERTIES: &str = "user_properties";

static SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Whether `name` is a plain, unquoted identifier
pub(crate) fn is_identifier(name: &str) -> bool {
    SEGMENT.is_match(name)
}

/// A parsed property path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Property {
    /// Flat or nested-record column, e.g. `platform`, `geo.country`
    Column(String),
    /// Key under `event_params`
    EventParam(String),
    /// Key under `user_properties`
    UserProperty(String),
}

impl Property {
    /// Parse a dotted property path
    ///
    /// `event_params.<key>` and `user_properties.<key>` take exactly one key
    /// segment. Anything else is a column path of one or more identifier
    /// segments.
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        let path = path.trim();
        let segments: Vec<&str> = path.split('.').collect();

        if path.is_empty() || !segments.iter().all(|s| SEGMENT.is_match(s)) {
            return Err(ValidationError::InvalidProperty(path.to_string()));
        }

        match segments.as_slice() {
            [EVENT_PARAMS, key] => Ok(Self::EventParam((*key).to_string())),
            [USER_PROPERTIES, key] => Ok(Self::UserProperty((*key).to_string())),
            [EVENT_PARAMS | USER_PROPERTIES, ..] => {
                Err(ValidationError::InvalidProperty(path.to_string()))
            }
            _ => Ok(Self::Column(path.to_string())),
        }
    }

    /// Output column alias (the last path segment)
    pub fn alias(&self) -> &str {
        match self {
            Self::Column(path) => path.rsplit('.').next().unwrap_or(path),
            Self::EventParam(key) | Self::UserProperty(key) => key,
        }
    }

    /// Repeated record holding this key, if nested
    pub fn namespace(&self) -> Option<&'static str> {
        match self {
            Self::Column(_) => None,
            Self::EventParam(_) => Some(EVENT_PARAMS),
            Self::UserProperty(_) => Some(USER_PROPERTIES),
        }
    }

    /// Output column alias, backtick-quoted for use in SQL
    pub fn quoted_alias(&self) -> String {
        quote_identifier(self.alias())
    }

    /// SELECT projection, aliased
    pub fn projection(&self) -> String {
        match self {
            Self::Column(path) => format!("{} AS {}", path, self.quoted_alias()),
            Self::EventParam(key) => nested_projection(EVENT_PARAMS, key),
            Self::UserProperty(key) => nested_projection(USER_PROPERTIES, key),
        }
    }
}

fn nested_projection(namespace: &str, key: &str) -> String {
    format!(
        "(SELECT props.value.string_value FROM UNNEST({}) props WHERE props.key = {}) AS {}",
        namespace,
        literal(key),
        quote_identifier(key)
    )
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(path) => write!(f, "{}", path),
            Self::EventParam(key) => write!(f, "{}.{}", EVENT_PARAMS, key),
            Self::UserProperty(key) => write!(f, "{}.{}", USER_PROPERTIES, key),
        }
    }
}

impl std::str::FromStr for Property {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse grouping paths, rejecting duplicate or reserved aliases
///
/// `reserved` holds output column names the query already uses.
pub(crate) fn parse_group_by(
    paths: &[String],
    reserved: &[&str],
) -> Result<Vec<Property>, ValidationError> {
    let mut parsed: Vec<Property> = Vec::with_capacity(paths.len());

    for path in paths {
        let property = Property::parse(path)?;
        let alias = property.alias();
        if reserved.contains(&alias) || parsed.iter().any(|p| p.alias() == alias) {
            return Err(ValidationError::InvalidProperty(format!(
                "{} (alias '{}' is already used)",
                path, alias
            )));
        }
        parsed.push(property);
    }

    Ok(parsed)
}

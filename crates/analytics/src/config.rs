//! Client configuration
//!
//! Which export table to query, which time zone dates are read in, and which
//! column identifies a user. Loadable from TOML with defaults for everything
//! but the table.
//!
//! ```toml
//! table_id = "my-project.analytics_123456.events_*"
//! time_zone = "America/Los_Angeles"
//! user_id_col = "user_pseudo_id"
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::property::is_identifier;
use crate::timerange::parse_time_zone;

/// Default time zone for requests that do not name one
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Default identity column in the GA4 export schema
pub const DEFAULT_USER_ID_COL: &str = "user_pseudo_id";

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field has an unusable value
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What was wrong
        message: String,
    },
}

/// GA4 export table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ga4Config {
    /// Fully-qualified table, e.g. `project.dataset.events_*`
    ///
    /// A trailing `*` marks a date-sharded wildcard table; queries against it
    /// are pruned with a `_TABLE_SUFFIX` predicate.
    pub table_id: String,

    /// IANA time zone used when a request does not name one
    /// Default: "UTC"
    pub time_zone: String,

    /// Column identifying a user for uniques and funnels
    /// Default: "user_pseudo_id"
    pub user_id_col: String,
}

impl Default for Ga4Config {
    fn default() -> Self {
        Self {
            table_id: String::new(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            user_id_col: DEFAULT_USER_ID_COL.to_string(),
        }
    }
}

impl Ga4Config {
    /// Create config for a table with default time zone and identity column
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Default::default()
        }
    }

    /// Set the default time zone
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Set the identity column
    pub fn with_user_id_col(mut self, user_id_col: impl Into<String>) -> Self {
        self.user_id_col = user_id_col.into();
        self
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        contents.parse()
    }

    /// Whether the table is a date-sharded wildcard table
    pub fn is_wildcard(&self) -> bool {
        self.table_id.ends_with('*')
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "table_id",
                message: "must not be empty".to_string(),
            });
        }

        parse_time_zone(&self.time_zone).map_err(|e| ConfigError::Invalid {
            field: "time_zone",
            message: e.to_string(),
        })?;

        if !is_identifier(&self.user_id_col) {
            return Err(ConfigError::Invalid {
                field: "user_id_col",
                message: format!("'{}' is not a column name", self.user_id_col),
            });
        }

        Ok(())
    }
}

impl FromStr for Ga4Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Ga4Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

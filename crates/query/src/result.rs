//! Query result types
//!
//! Rows of named, typed columns as returned by a backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of a single query submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column definitions
    pub columns: Vec<Column>,

    /// Row data as JSON values, in column order
    pub rows: Vec<Vec<Value>>,

    /// Total row count
    pub row_count: usize,

    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>, execution_time_ms: u64) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time_ms,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result from JSON objects keyed by column name
    ///
    /// Column order and types are taken from the first row. Keys missing from
    /// later rows become `null`.
    pub fn from_json_rows(json_rows: Vec<Map<String, Value>>, execution_time_ms: u64) -> Self {
        let Some(first_row) = json_rows.first() else {
            return Self::new(Vec::new(), Vec::new(), execution_time_ms);
        };

        let columns: Vec<Column> = first_row
            .iter()
            .map(|(name, value)| Column::new(name.clone(), DataType::infer(value), true))
            .collect();

        let rows = json_rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| row.get(&col.name).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self::new(columns, rows, execution_time_ms)
    }

    /// Check if result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Data type
    pub data_type: DataType,

    /// Whether the column is nullable
    pub nullable: bool,
}

impl Column {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Data types supported in query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Signed 64-bit integer
    Int64,
    /// 64-bit floating point
    Float64,
    /// Exact decimal (NUMERIC / BIGNUMERIC)
    Numeric,
    /// UTF-8 string
    String,
    /// Binary data
    Bytes,
    /// Boolean
    Boolean,
    /// Calendar date
    Date,
    /// Timestamp or datetime
    Timestamp,
    /// Nested record or repeated field
    Json,
    /// Unknown/other type
    Unknown,
}

impl DataType {
    /// Convert a BigQuery schema field type name
    ///
    /// Accepts both legacy (`INTEGER`, `FLOAT`, `RECORD`) and standard SQL
    /// (`INT64`, `FLOAT64`, `STRUCT`) spellings.
    pub fn from_bigquery(type_name: &str) -> Self {
        match type_name.trim().to_uppercase().as_str() {
            "INTEGER" | "INT64" => DataType::Int64,
            "FLOAT" | "FLOAT64" => DataType::Float64,
            "NUMERIC" | "BIGNUMERIC" | "DECIMAL" | "BIGDECIMAL" => DataType::Numeric,
            "STRING" => DataType::String,
            "BYTES" => DataType::Bytes,
            "BOOLEAN" | "BOOL" => DataType::Boolean,
            "DATE" => DataType::Date,
            "TIMESTAMP" | "DATETIME" | "TIME" => DataType::Timestamp,
            "RECORD" | "STRUCT" | "JSON" => DataType::Json,
            _ => DataType::Unknown,
        }
    }

    /// Infer a data type from a JSON value
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => DataType::Unknown,
            Value::Bool(_) => DataType::Boolean,
            Value::Number(n) => {
                if n.is_f64() {
                    DataType::Float64
                } else {
                    DataType::Int64
                }
            }
            Value::String(_) => DataType::String,
            Value::Array(_) | Value::Object(_) => DataType::Json,
        }
    }
}

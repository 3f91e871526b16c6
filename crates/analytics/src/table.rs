//! Result tables
//!
//! Query rows pivoted into a dense table: one row per time bucket, one column
//! per combination of grouping values. Every bucket of the requested range is
//! present; missing cells are zero.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{AnalyticsError, Result};
use ga4_query::QueryResult;

/// Label used for null grouping values
pub const NULL_LABEL: &str = "(null)";

/// Dense, bucket-indexed result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    /// Name of the index (`event_date`, `event_hour`, ...)
    pub index_name: String,
    /// Bucket labels, ascending
    pub index: Vec<String>,
    /// Names of the column key levels
    ///
    /// Empty for an ungrouped single-event table, which has the one column
    /// `["value"]`.
    pub column_levels: Vec<String>,
    /// Column keys
    pub columns: Vec<Vec<String>>,
    /// Cell values, `values[row][column]`
    pub values: Vec<Vec<f64>>,
}

impl ResultTable {
    /// Number of buckets
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the table has no buckets
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Position of a column key
    pub fn column_position(&self, key: &[&str]) -> Option<usize> {
        self.columns.iter().position(|column| {
            column.len() == key.len() && column.iter().zip(key).all(|(a, b)| a == b)
        })
    }

    /// Cell value for a bucket and column key
    pub fn value(&self, bucket: &str, key: &[&str]) -> Option<f64> {
        let row = self.index.iter().position(|b| b == bucket)?;
        let col = self.column_position(key)?;
        Some(self.values[row][col])
    }

    /// All values of one column, in index order
    pub fn column(&self, key: &[&str]) -> Option<Vec<f64>> {
        let col = self.column_position(key)?;
        Some(self.values.iter().map(|row| row[col]).collect())
    }

    /// All values of one bucket, in column order
    pub fn row(&self, bucket: &str) -> Option<&[f64]> {
        let row = self.index.iter().position(|b| b == bucket)?;
        Some(&self.values[row])
    }

    /// Per-column sums over all buckets
    pub fn totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.columns.len()];
        for row in &self.values {
            for (total, value) in totals.iter_mut().zip(row) {
                *total += value;
            }
        }
        totals
    }
}

/// How to pivot query rows into a [`ResultTable`]
pub(crate) struct Pivot {
    /// Bucket column, also the index name
    pub index_name: String,
    /// Every bucket the requested range spans
    pub buckets: Vec<String>,
    /// Columns whose values form the grouping part of a column key
    pub group_columns: Vec<String>,
    /// Columns holding values
    pub value_columns: Vec<String>,
    /// When set, the value column name is the first key level, under this name
    pub value_level: Option<String>,
}

type Cells = HashMap<(String, Vec<String>), Vec<f64>>;

impl Pivot {
    /// Pivot an events result: a single `value` column
    pub fn events(index_name: &str, buckets: Vec<String>, group_columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.to_string(),
            buckets,
            group_columns,
            value_columns: vec![crate::events::VALUE_COLUMN.to_string()],
            value_level: None,
        }
    }

    /// Pivot a funnel result: one value column per step
    pub fn funnel(
        index_name: &str,
        buckets: Vec<String>,
        group_columns: Vec<String>,
        steps: usize,
    ) -> Self {
        Self {
            index_name: index_name.to_string(),
            buckets,
            group_columns,
            value_columns: (1..=steps).map(|n| n.to_string()).collect(),
            value_level: Some(crate::funnel::STEP_LEVEL.to_string()),
        }
    }

    /// Build the table
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::MalformedResult`] when rows lack an expected
    /// column or hold a non-numeric value.
    pub fn apply(&self, result: &QueryResult) -> Result<ResultTable> {
        let (labels, groups, cells) = if result.rows.is_empty() {
            (BTreeSet::new(), BTreeSet::new(), HashMap::new())
        } else {
            self.collect(result)?
        };

        let mut index: BTreeSet<String> = self.buckets.iter().cloned().collect();
        index.extend(labels);
        let index: Vec<String> = index.into_iter().collect();

        let groups: Vec<Vec<String>> = if self.group_columns.is_empty() {
            vec![Vec::new()]
        } else {
            groups.into_iter().collect()
        };

        // (value column position, group key) per output column
        let mut layout: Vec<(usize, &Vec<String>)> = Vec::new();
        let mut columns: Vec<Vec<String>> = Vec::new();
        for (v, value_column) in self.value_columns.iter().enumerate() {
            for group in &groups {
                let key = match (&self.value_level, group.is_empty()) {
                    (Some(_), _) | (None, true) => {
                        let mut key = vec![value_column.clone()];
                        key.extend(group.iter().cloned());
                        key
                    }
                    (None, false) => group.clone(),
                };
                layout.push((v, group));
                columns.push(key);
            }
        }

        let values = index
            .iter()
            .map(|bucket| {
                layout
                    .iter()
                    .map(|(v, group)| {
                        cells
                            .get(&(bucket.clone(), (*group).clone()))
                            .map(|sums| sums[*v])
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        let mut column_levels: Vec<String> = self.value_level.iter().cloned().collect();
        column_levels.extend(self.group_columns.iter().cloned());

        Ok(ResultTable {
            index_name: self.index_name.clone(),
            index,
            column_levels,
            columns,
            values,
        })
    }

    /// Read every row into (bucket, group) cells
    fn collect(
        &self,
        result: &QueryResult,
    ) -> Result<(BTreeSet<String>, BTreeSet<Vec<String>>, Cells)> {
        let find = |name: &str| {
            result.column_index(name).ok_or_else(|| {
                AnalyticsError::MalformedResult(format!("result has no '{}' column", name))
            })
        };

        let bucket_idx = find(self.index_name.as_str())?;
        let group_idx = self
            .group_columns
            .iter()
            .map(|c| find(c.as_str()))
            .collect::<Result<Vec<_>>>()?;
        let value_idx = self
            .value_columns
            .iter()
            .map(|c| find(c.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let mut labels = BTreeSet::new();
        let mut groups = BTreeSet::new();
        let mut cells: Cells = HashMap::new();

        for (n, row) in result.rows.iter().enumerate() {
            let Some(bucket) = row.get(bucket_idx).and_then(bucket_label) else {
                warn!(row = n, column = %self.index_name, "skipping row without a bucket label");
                continue;
            };

            let group: Vec<String> = group_idx
                .iter()
                .map(|&i| group_label(row.get(i).unwrap_or(&Value::Null)))
                .collect();

            let sums = cells
                .entry((bucket.clone(), group.clone()))
                .or_insert_with(|| vec![0.0; value_idx.len()]);
            for ((sum, &i), column) in sums.iter_mut().zip(&value_idx).zip(&self.value_columns) {
                *sum += number(row.get(i).unwrap_or(&Value::Null), column)?;
            }

            labels.insert(bucket);
            groups.insert(group);
        }

        Ok((labels, groups, cells))
    }
}

fn bucket_label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn group_label(value: &Value) -> String {
    match value {
        Value::Null => NULL_LABEL.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric cell value; BigQuery JSON encodes INT64 as strings
fn number(value: &Value, column: &str) -> Result<f64> {
    let parsed = match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };

    parsed.ok_or_else(|| {
        AnalyticsError::MalformedResult(format!("non-numeric value {} in '{}'", value, column))
    })
}

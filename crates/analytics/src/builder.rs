//! Query builder for generating BigQuery SQL
//!
//! A small clause accumulator shared by the events and funnel queries:
//! - `WITH` common table expressions
//! - Time bucket and grouping projections
//! - `LEFT JOIN` chains
//! - Parenthesized, AND-joined WHERE predicates

use crate::filter::Interval;
use crate::property::Property;

/// Query builder for analytics SQL
pub struct QueryBuilder {
    ctes: Vec<(String, String)>,
    from: String,
    select: Vec<String>,
    joins: Vec<String>,
    where_clauses: Vec<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
}

impl QueryBuilder {
    /// Create a new query builder selecting from `from`
    ///
    /// `from` is inserted as written: a quoted table or a CTE name.
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            ctes: Vec::new(),
            from: from.into(),
            select: Vec::new(),
            joins: Vec::new(),
            where_clauses: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Add a named common table expression
    pub fn with_cte(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.ctes.push((name.into(), sql.into()));
        self
    }

    /// Add a SELECT column
    pub fn select(mut self, column: impl Into<String>) -> Self {
        self.select.push(column.into());
        self
    }

    /// Add a SELECT column with alias
    pub fn select_as(mut self, expr: impl Into<String>, alias: impl Into<String>) -> Self {
        self.select.push(format!("{} AS {}", expr.into(), alias.into()));
        self
    }

    /// Add a WHERE clause
    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clauses.push(clause.into());
        self
    }

    /// Add several WHERE clauses
    pub fn where_clauses(mut self, clauses: impl IntoIterator<Item = String>) -> Self {
        self.where_clauses.extend(clauses);
        self
    }

    /// Add a LEFT JOIN with AND-joined ON conditions
    pub fn left_join(mut self, table: &str, on: &[String]) -> Self {
        self.joins
            .push(format!("LEFT JOIN {} ON {}", table, on.join(" AND ")));
        self
    }

    /// Add a GROUP BY column
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    /// Add an ORDER BY column (ascending)
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(format!("{} ASC", column.into()));
        self
    }

    /// Project the time bucket, group and order by it
    ///
    /// The bucket always comes first in SELECT, GROUP BY and ORDER BY.
    pub fn with_time_bucket(mut self, interval: Interval, tz: &str) -> Self {
        self.select.insert(0, interval.select_expr(tz));
        self.group_by.insert(0, interval.alias().to_string());
        self.order_by.insert(0, format!("{} ASC", interval.alias()));
        self
    }

    /// Add a grouping dimension: projected and grouped by alias
    pub fn with_breakdown(mut self, property: &Property) -> Self {
        self.select.push(property.projection());
        self.group_by.push(property.quoted_alias());
        self
    }

    /// Add grouping dimensions by alias only (already projected upstream)
    pub fn with_breakdown_aliases(mut self, properties: &[Property]) -> Self {
        for property in properties {
            self.select.push(property.quoted_alias());
            self.group_by.push(property.quoted_alias());
        }
        self
    }

    /// Build the final SQL query
    pub fn build(self) -> String {
        let mut sql = String::new();

        // WITH
        if !self.ctes.is_empty() {
            let ctes: Vec<String> = self
                .ctes
                .iter()
                .map(|(name, body)| format!("{} AS ({})", name, body))
                .collect();
            sql.push_str("WITH ");
            sql.push_str(&ctes.join(", "));
            sql.push(' ');
        }

        // SELECT
        sql.push_str("SELECT ");
        if self.select.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select.join(", "));
        }

        // FROM
        sql.push_str(" FROM ");
        sql.push_str(&self.from);

        // JOIN
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        // WHERE
        if !self.where_clauses.is_empty() {
            let wrapped: Vec<String> = self
                .where_clauses
                .iter()
                .map(|clause| format!("({})", clause))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&wrapped.join(" AND "));
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        // ORDER BY
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        sql
    }
}

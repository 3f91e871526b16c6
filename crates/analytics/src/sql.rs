//! SQL literal formatting
//!
//! Every string that ends up quoted in generated SQL goes through here.

/// Escape a string for use inside a single-quoted BigQuery literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Format a value as a quoted SQL literal
pub fn literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

/// Format values as a parenthesized literal list for `IN` expressions
pub fn literal_list<S: AsRef<str>>(values: &[S]) -> String {
    let items: Vec<String> = values.iter().map(|v| literal(v.as_ref())).collect();
    format!("({})", items.join(", "))
}

/// Quote a column alias with backticks
///
/// Keeps aliases that collide with reserved words (`order`, `group`, ...)
/// usable in SELECT and GROUP BY.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', ""))
}

/// Quote a table reference with backticks
pub fn quote_table(table_id: &str) -> String {
    format!("`{}`", table_id.replace('`', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        assert_eq!(literal("page_view"), "'page_view'");
        assert_eq!(literal("O'Brien"), "'O\\'Brien'");
        assert_eq!(literal("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_literal_list() {
        assert_eq!(literal_list(&["USD", "EUR"]), "('USD', 'EUR')");
        assert_eq!(literal_list(&["one"]), "('one')");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("order"), "`order`");
        assert_eq!(quote_identifier("a`b"), "`ab`");
    }

    #[test]
    fn test_quote_table() {
        assert_eq!(
            quote_table("proj.dataset.events_*"),
            "`proj.dataset.events_*`"
        );
        assert_eq!(quote_table("a`b"), "`ab`");
    }
}

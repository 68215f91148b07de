//! Centralized SELECT construction for lookup queries.
//!
//! The lookup processor builds exactly two query shapes: an unfiltered bulk
//! select used for cache preload, and a filtered select used on a lazy cache
//! miss. Both come from one reusable [`SelectTemplate`] so column order is
//! fixed at construction and every embedded literal passes through the
//! datasource's quoting.

use crate::rowflow::datasource::traits::DataSource;
use crate::rowflow::row::FieldValue;

/// Reusable SELECT builder over a fixed column list and table.
///
/// The column list covers the lookup's output columns plus its match
/// columns, in that order, so result rows always project deterministically.
#[derive(Debug, Clone)]
pub struct SelectTemplate {
    columns: Vec<String>,
    table: String,
}

impl SelectTemplate {
    /// Create a template over the given select-list columns and table.
    pub fn new<I, S>(columns: I, table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            table: table.into(),
        }
    }

    /// The select-list columns, in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The table the template selects from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Render the unfiltered bulk query used for cache preload.
    pub fn select_all(&self) -> String {
        format!("SELECT {} FROM {}", self.columns.join(", "), self.table)
    }

    /// Render the filtered query for one lookup.
    ///
    /// Each condition compares a match column against a row value, escaped
    /// through the datasource's [`DataSource::quote`]. Null values compare
    /// with `IS NULL` so blank match fields still participate in the lookup
    /// instead of short-circuiting.
    pub fn select_where(
        &self,
        conditions: &[(String, FieldValue)],
        source: &dyn DataSource,
    ) -> String {
        let clauses: Vec<String> = conditions
            .iter()
            .map(|(column, value)| match value {
                FieldValue::Null => format!("{} IS NULL", column),
                other => format!("{} = {}", column, source.quote(other)),
            })
            .collect();
        format!("{} WHERE {}", self.select_all(), clauses.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowflow::error::Result;
    use crate::rowflow::row::Row;
    use async_trait::async_trait;

    struct QuoteOnly;

    #[async_trait]
    impl DataSource for QuoteOnly {
        async fn execute_query(&self, _sql: &str) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_select_all() {
        let template = SelectTemplate::new(["name", "id"], "customers");
        assert_eq!(template.select_all(), "SELECT name, id FROM customers");
    }

    #[test]
    fn test_select_where_quotes_and_nulls() {
        let template = SelectTemplate::new(["name", "id"], "customers");
        let sql = template.select_where(
            &[
                ("id".to_string(), FieldValue::Integer(7)),
                ("region".to_string(), FieldValue::String("EMEA".to_string())),
                ("deleted_at".to_string(), FieldValue::Null),
            ],
            &QuoteOnly,
        );
        assert_eq!(
            sql,
            "SELECT name, id FROM customers WHERE id = 7 AND region = 'EMEA' AND deleted_at IS NULL"
        );
    }
}

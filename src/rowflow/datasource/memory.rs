//! In-memory datasource backed by plain row tables.
//!
//! Understands exactly the query shapes [`SelectTemplate`] generates: an
//! unfiltered select and a select filtered by `AND`-joined equality or
//! `IS NULL` conditions. That is enough to stand in for a SQL driver in
//! tests and embedded use without pulling a database into the picture.
//!
//! [`SelectTemplate`]: crate::rowflow::datasource::SelectTemplate

use crate::rowflow::datasource::traits::DataSource;
use crate::rowflow::error::{PipelineError, Result};
use crate::rowflow::row::{FieldValue, Row};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::RwLock;

lazy_static! {
    /// Pre-compiled pattern for the SELECT ... FROM ... [WHERE ...] shape
    static ref SELECT_REGEX: Regex =
        Regex::new(r"^SELECT\s+(?P<cols>.+?)\s+FROM\s+(?P<table>\S+)(?:\s+WHERE\s+(?P<filter>.+))?$")
            .expect("invalid select regex");

    /// Pre-compiled pattern for `column IS NULL` conditions
    static ref IS_NULL_REGEX: Regex =
        Regex::new(r"^(?P<col>\S+)\s+IS\s+NULL$").expect("invalid is-null regex");

    /// Pre-compiled pattern for `column = literal` conditions
    static ref EQUALITY_REGEX: Regex =
        Regex::new(r"^(?P<col>\S+)\s*=\s*(?P<lit>.+)$").expect("invalid equality regex");

    /// Pre-compiled pattern for single-quoted string literals
    static ref QUOTED_STRING_REGEX: Regex =
        Regex::new(r"^'(?P<body>(?:[^']|'')*)'$").expect("invalid quoted string regex");
}

/// Datasource over in-process tables of rows.
///
/// Tables are named row vectors behind interior locking, so one instance
/// can be shared through the registry by several processors.
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::datasource::{DataSource, MemoryDataSource};
/// use rowflow::rowflow::row::{FieldValue, Row};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MemoryDataSource::new();
/// source.insert(
///     "customers",
///     Row::from_pairs([
///         ("id", FieldValue::Integer(7)),
///         ("name", FieldValue::String("Acme".to_string())),
///     ]),
/// );
///
/// let rows = source
///     .execute_query("SELECT name, id FROM customers WHERE id = 7")
///     .await?;
/// assert_eq!(rows[0].get("name"), Some(&FieldValue::String("Acme".to_string())));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryDataSource {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

/// One parsed WHERE condition.
enum Condition {
    Equals(String, FieldValue),
    IsNull(String),
}

impl MemoryDataSource {
    /// Create an empty datasource with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to a table, creating the table on first insert.
    pub fn insert(&self, table: impl Into<String>, row: Row) {
        self.tables
            .write()
            .expect("memory datasource lock poisoned")
            .entry(table.into())
            .or_default()
            .push(row);
    }

    /// Append several rows to a table.
    pub fn insert_all<I>(&self, table: impl Into<String>, rows: I)
    where
        I: IntoIterator<Item = Row>,
    {
        let table = table.into();
        let mut tables = self
            .tables
            .write()
            .expect("memory datasource lock poisoned");
        tables.entry(table).or_default().extend(rows);
    }

    /// Number of rows currently stored in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .expect("memory datasource lock poisoned")
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    fn parse_conditions(filter: &str, sql: &str) -> Result<Vec<Condition>> {
        filter
            .split(" AND ")
            .map(|clause| {
                let clause = clause.trim();
                if let Some(caps) = IS_NULL_REGEX.captures(clause) {
                    return Ok(Condition::IsNull(caps["col"].to_string()));
                }
                if let Some(caps) = EQUALITY_REGEX.captures(clause) {
                    let literal = Self::parse_literal(caps["lit"].trim(), sql)?;
                    return Ok(Condition::Equals(caps["col"].to_string(), literal));
                }
                Err(PipelineError::query(
                    sql,
                    format!("unsupported WHERE clause '{}'", clause),
                ))
            })
            .collect()
    }

    fn parse_literal(text: &str, sql: &str) -> Result<FieldValue> {
        if let Some(caps) = QUOTED_STRING_REGEX.captures(text) {
            return Ok(FieldValue::String(caps["body"].replace("''", "'")));
        }
        match text {
            "true" => return Ok(FieldValue::Boolean(true)),
            "false" => return Ok(FieldValue::Boolean(false)),
            "NULL" => return Ok(FieldValue::Null),
            _ => {}
        }
        if let Ok(i) = text.parse::<i64>() {
            return Ok(FieldValue::Integer(i));
        }
        if let Ok(f) = text.parse::<f64>() {
            return Ok(FieldValue::Float(f));
        }
        Err(PipelineError::query(
            sql,
            format!("unsupported literal '{}'", text),
        ))
    }

    fn matches(row: &Row, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| match condition {
            Condition::IsNull(column) => {
                matches!(row.get(column), None | Some(FieldValue::Null))
            }
            Condition::Equals(column, literal) => match row.get(column) {
                // Canonical-string comparison keeps 7, 7.0 and "7" equal,
                // matching how lookup keys are normalized.
                Some(value) => value.canonical_string() == literal.canonical_string(),
                None => false,
            },
        })
    }

    fn project(row: &Row, columns: &[&str]) -> Row {
        let mut projected = Row::new();
        for column in columns {
            let value = row.get(column).cloned().unwrap_or(FieldValue::Null);
            projected.set(*column, value);
        }
        projected
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>> {
        let caps = SELECT_REGEX.captures(sql.trim()).ok_or_else(|| {
            PipelineError::query(sql, "unsupported query shape for memory datasource")
        })?;

        let columns: Vec<&str> = caps["cols"].split(',').map(str::trim).collect();
        let table = caps["table"].to_string();
        let conditions = match caps.name("filter") {
            Some(filter) => Self::parse_conditions(filter.as_str(), sql)?,
            None => Vec::new(),
        };

        let tables = self
            .tables
            .read()
            .expect("memory datasource lock poisoned");
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or(&[]);

        Ok(rows
            .iter()
            .filter(|row| Self::matches(row, &conditions))
            .map(|row| Self::project(row, &columns))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers() -> MemoryDataSource {
        let source = MemoryDataSource::new();
        source.insert_all(
            "customers",
            vec![
                Row::from_pairs([
                    ("id", FieldValue::Integer(7)),
                    ("name", FieldValue::String("Acme".to_string())),
                    ("region", FieldValue::String("EMEA".to_string())),
                ]),
                Row::from_pairs([
                    ("id", FieldValue::Integer(8)),
                    ("name", FieldValue::String("Globex".to_string())),
                    ("region", FieldValue::Null),
                ]),
            ],
        );
        source
    }

    #[tokio::test]
    async fn test_select_all_projects_in_order() {
        let source = customers();
        let rows = source
            .execute_query("SELECT name, id FROM customers")
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        let names: Vec<&str> = rows[0].field_names().collect();
        assert_eq!(names, vec!["name", "id"]);
    }

    #[tokio::test]
    async fn test_where_equality() {
        let source = customers();
        let rows = source
            .execute_query("SELECT name FROM customers WHERE id = 7")
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("name"),
            Some(&FieldValue::String("Acme".to_string()))
        );
    }

    #[tokio::test]
    async fn test_where_is_null() {
        let source = customers();
        let rows = source
            .execute_query("SELECT id FROM customers WHERE region IS NULL")
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&FieldValue::Integer(8)));
    }

    #[tokio::test]
    async fn test_quoted_literal_with_escape() {
        let source = MemoryDataSource::new();
        source.insert(
            "t",
            Row::from_pairs([("name", FieldValue::String("O'Brien".to_string()))]),
        );

        let rows = source
            .execute_query("SELECT name FROM t WHERE name = 'O''Brien'")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_table_is_empty() {
        let source = MemoryDataSource::new();
        let rows = source.execute_query("SELECT a FROM nothing").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_sql_is_query_error() {
        let source = MemoryDataSource::new();
        let err = source
            .execute_query("DELETE FROM customers")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Query { .. }));
    }
}

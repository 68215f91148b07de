//! The datasource query contract.

use crate::rowflow::error::Result;
use crate::rowflow::row::{FieldValue, Row};
use async_trait::async_trait;

/// Narrow query interface over a reference-data store.
///
/// Implementations can wrap a SQL driver, an HTTP service, or an in-memory
/// table. The pipeline core only relies on two operations: execute a query
/// string and get an ordered sequence of rows back, and escape a value for
/// embedding in generated query text.
///
/// Column order in returned rows must match the query's select list, so
/// callers can rely on deterministic projections.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Execute a query and return the matching rows in result order.
    ///
    /// Every call is a blocking I/O point for the row being processed; the
    /// pipeline awaits the result before the row makes further progress.
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Escape a value as a literal suitable for embedding in a WHERE clause.
    ///
    /// The default implementation follows standard SQL conventions: strings
    /// and timestamps are single-quoted with embedded quotes doubled,
    /// numbers and booleans render bare, and null renders as `NULL`.
    /// Drivers with dialect-specific escaping rules should override this.
    fn quote(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            FieldValue::Timestamp(ts) => {
                format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.f"))
            }
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Null => "NULL".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSource;

    #[async_trait]
    impl DataSource for NullSource {
        async fn execute_query(&self, _sql: &str) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_default_quoting() {
        let source = NullSource;
        assert_eq!(
            source.quote(&FieldValue::String("O'Brien".to_string())),
            "'O''Brien'"
        );
        assert_eq!(source.quote(&FieldValue::Integer(7)), "7");
        assert_eq!(source.quote(&FieldValue::Boolean(true)), "true");
        assert_eq!(source.quote(&FieldValue::Null), "NULL");
    }
}

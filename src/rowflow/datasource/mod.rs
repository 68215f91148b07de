//! Narrow datasource abstraction consumed by the lookup machinery.
//!
//! The pipeline core never owns a database driver. It consumes reference
//! data through [`DataSource`]: execute a query string, get ordered rows
//! back, and escape values for safe embedding in generated SQL. Query
//! *construction* is centralized in [`SelectTemplate`] so that quoting is
//! auditable in one place instead of scattered string concatenation.
//!
//! Targets are resolved through an explicit [`DataSourceRegistry`] handed to
//! each component at construction. There is no ambient global connection.
//!
//! ## Examples
//!
//! ```rust
//! use rowflow::rowflow::datasource::{DataSource, DataSourceRegistry, MemoryDataSource};
//! use rowflow::rowflow::row::{FieldValue, Row};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = MemoryDataSource::new();
//! source.insert(
//!     "customers",
//!     Row::from_pairs([
//!         ("id", FieldValue::Integer(7)),
//!         ("name", FieldValue::String("Acme".to_string())),
//!     ]),
//! );
//!
//! let rows = source.execute_query("SELECT name FROM customers WHERE id = 7").await?;
//! assert_eq!(rows.len(), 1);
//!
//! let registry = DataSourceRegistry::new();
//! registry.register("default", Arc::new(source));
//! assert!(registry.resolve("default").is_ok());
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod query;
pub mod registry;
pub mod traits;

pub use memory::MemoryDataSource;
pub use query::SelectTemplate;
pub use registry::DataSourceRegistry;
pub use traits::DataSource;

//! # rowflow
//!
//! A row-processing ETL engine for Rust. Rows are ingested from a source,
//! run through a configurable chain of field transforms and row processors
//! (including database-backed lookup enrichment with caching), validated by
//! screens, and accumulated into bounded batches for bulk write.
//!
//! ## Features
//!
//! - **Dynamic row model**: ordered field maps over a scalar [`FieldValue`]
//!   type system (integers, floats, strings, booleans, timestamps, null)
//! - **Field transforms**: pure per-field conversions applied before any
//!   row-level work, e.g. string-to-timestamp parsing
//! - **Lookup enrichment**: fill or overwrite row fields from a reference
//!   table, with preloaded or lazily populated key caches and explicit
//!   ambiguity policies
//! - **Screening**: per-row accept/reject/fatal validation with run-abort
//!   semantics
//! - **Batched output**: capacity-bounded accumulation flushed to pluggable
//!   sinks
//! - **Asynchronous I/O**: datasource queries and sink writes are async,
//!   built on `tokio`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowflow::{FieldValue, MemorySink, Pipeline, Row};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pipeline = Pipeline::new(Box::new(MemorySink::new()), 100);
//!
//!     let mut row = Row::new();
//!     row.set("customer_id", FieldValue::Integer(7));
//!
//!     let report = pipeline.run(vec![row]).await?;
//!     println!("processed {} rows", report.rows_processed);
//!     Ok(())
//! }
//! ```

pub mod rowflow;

// Re-export the main public types at the crate root
pub use rowflow::batch::{Batch, BatchSink, MemorySink};
pub use rowflow::config::FillConfig;
pub use rowflow::datasource::{DataSource, DataSourceRegistry, MemoryDataSource, SelectTemplate};
pub use rowflow::engine::{Pipeline, RunReport};
pub use rowflow::error::{PipelineError, Result};
pub use rowflow::processor::{
    CallbackProcessor, LookupFillProcessor, Processor, ProcessorChain, RowProcessor,
};
pub use rowflow::row::{FieldValue, Row};
pub use rowflow::screen::{
    CallbackScreen, RequiredFieldsScreen, RowState, Screen, ScreenChain, ScreenOutcome, Severity,
};
pub use rowflow::transform::{StringToTimestampTransform, Transform, TransformChain};

//! Row-level and run-lifecycle processors.
//!
//! Two kinds of work unit run between transforms and screens:
//!
//! - [`RowProcessor`]: invoked once per row; may mutate the row, add
//!   fields, or perform side effects such as datasource lookups
//! - [`Processor`]: invoked once per run-lifecycle event, before the first
//!   row (pre) or after the last (post)
//!
//! Concrete processors are polymorphic over this capability set and the
//! pipeline dispatches by variant. The shipped row processors are the
//! [`CallbackProcessor`] and the cache-backed [`LookupFillProcessor`].

pub mod cache;
pub mod callback;
pub mod fill;

pub use cache::{CacheKey, LookupCache};
pub use callback::{CallbackLifecycleProcessor, CallbackProcessor};
pub use fill::LookupFillProcessor;

use crate::rowflow::error::Result;
use crate::rowflow::row::Row;
use async_trait::async_trait;

/// Unit of per-row work.
///
/// Processing consumes the row and returns it (possibly mutated), so a
/// processor can enrich, rewrite, or replace fields without the pipeline
/// inspecting what changed. Lookups make this an async call: a datasource
/// query stalls the current row until the result returns.
#[async_trait]
pub trait RowProcessor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Process one row.
    async fn process(&mut self, row: Row) -> Result<Row>;
}

/// Unit of run-lifecycle work, invoked once before processing starts or
/// once after it ends depending on where it is registered.
pub trait Processor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Perform the lifecycle work.
    fn process(&mut self) -> Result<()>;
}

/// Ordered chain of row processors.
pub struct ProcessorChain {
    processors: Vec<Box<dyn RowProcessor>>,
}

impl ProcessorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Append a processor to the chain.
    pub fn add(&mut self, processor: Box<dyn RowProcessor>) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Number of processors in the chain.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether the chain has no processors.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run the row through every processor in order.
    pub async fn process(&mut self, mut row: Row) -> Result<Row> {
        for processor in &mut self.processors {
            row = processor.process(row).await?;
        }
        Ok(row)
    }
}

impl Default for ProcessorChain {
    fn default() -> Self {
        Self::new()
    }
}

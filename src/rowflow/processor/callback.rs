//! Callback-backed processors.
//!
//! The row variant wraps an externally supplied function plus an optional
//! static configuration value. The two call shapes are distinct enum
//! variants chosen when the processor is configured: a row-only callback
//! receives just the row, a contextual callback also receives the
//! configuration value. Dispatch is resolved once at construction, never
//! per call.

use crate::rowflow::error::Result;
use crate::rowflow::processor::{Processor, RowProcessor};
use crate::rowflow::row::Row;
use async_trait::async_trait;

type RowFn = Box<dyn Fn(Row) -> Result<Row> + Send + Sync>;
type RowContextFn = Box<dyn Fn(Row, &serde_json::Value) -> Result<Row> + Send + Sync>;

/// Row processor wrapping an externally supplied callback.
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::processor::{CallbackProcessor, RowProcessor};
/// use rowflow::rowflow::row::{FieldValue, Row};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut tag = CallbackProcessor::with_context(
///     |mut row, config| {
///         row.set("source", FieldValue::String(config["source"].as_str().unwrap().into()));
///         Ok(row)
///     },
///     serde_json::json!({"source": "crm"}),
/// );
///
/// let row = tag.process(Row::new()).await?;
/// assert_eq!(row.get("source"), Some(&FieldValue::String("crm".to_string())));
/// # Ok(())
/// # }
/// ```
pub enum CallbackProcessor {
    /// Callback invoked with the row alone
    RowOnly(RowFn),
    /// Callback invoked with the row and a static configuration value
    RowWithContext {
        /// The wrapped callback
        callback: RowContextFn,
        /// Configuration value handed to every invocation
        context: serde_json::Value,
    },
}

impl CallbackProcessor {
    /// Wrap a row-only callback.
    pub fn row_only<F>(callback: F) -> Self
    where
        F: Fn(Row) -> Result<Row> + Send + Sync + 'static,
    {
        CallbackProcessor::RowOnly(Box::new(callback))
    }

    /// Wrap a callback that also receives a static configuration value.
    pub fn with_context<F>(callback: F, context: serde_json::Value) -> Self
    where
        F: Fn(Row, &serde_json::Value) -> Result<Row> + Send + Sync + 'static,
    {
        CallbackProcessor::RowWithContext {
            callback: Box::new(callback),
            context,
        }
    }
}

#[async_trait]
impl RowProcessor for CallbackProcessor {
    fn name(&self) -> &str {
        "callback"
    }

    async fn process(&mut self, row: Row) -> Result<Row> {
        match self {
            CallbackProcessor::RowOnly(callback) => callback(row),
            CallbackProcessor::RowWithContext { callback, context } => callback(row, context),
        }
    }
}

/// Lifecycle processor wrapping a callback, for pre- or post-run work.
pub struct CallbackLifecycleProcessor {
    name: String,
    callback: Box<dyn FnMut() -> Result<()> + Send + Sync>,
}

impl CallbackLifecycleProcessor {
    /// Wrap a lifecycle callback under a name for logs.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(callback),
        }
    }
}

impl Processor for CallbackLifecycleProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self) -> Result<()> {
        (self.callback)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowflow::row::FieldValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_row_only_callback() {
        let mut processor = CallbackProcessor::row_only(|mut row| {
            row.set("touched", FieldValue::Boolean(true));
            Ok(row)
        });

        let row = processor.process(Row::new()).await.unwrap();
        assert_eq!(row.get("touched"), Some(&FieldValue::Boolean(true)));
    }

    #[tokio::test]
    async fn test_context_callback_sees_config() {
        let mut processor = CallbackProcessor::with_context(
            |mut row, config| {
                row.set("limit", FieldValue::Integer(config["limit"].as_i64().unwrap()));
                Ok(row)
            },
            serde_json::json!({"limit": 42}),
        );

        let row = processor.process(Row::new()).await.unwrap();
        assert_eq!(row.get("limit"), Some(&FieldValue::Integer(42)));
    }

    #[test]
    fn test_lifecycle_callback_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut processor = CallbackLifecycleProcessor::new("warmup", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        processor.process().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

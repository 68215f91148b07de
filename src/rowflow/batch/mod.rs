//! Bounded batch accumulation and bulk write.
//!
//! Accepted rows accumulate in a [`Batch`] until its capacity is reached,
//! at which point the whole batch is handed to the [`BatchSink`] and the
//! accumulator is cleared. At run end any partially filled batch is flushed
//! exactly once. The accumulator drains itself before the sink write
//! starts, so no row can be appended to a batch that is mid-flush and no
//! batch content is ever flushed twice.

use crate::rowflow::error::Result;
use crate::rowflow::row::Row;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Destination for flushed batches.
///
/// Implementations wrap bulk loaders, file writers, or in-memory buffers.
/// A failed write terminates the run; partial output already written by
/// earlier flushes is not rolled back.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Write one flushed batch of rows.
    async fn write_batch(&mut self, rows: Vec<Row>) -> Result<()>;
}

/// Capacity-bounded accumulator of accepted rows.
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::batch::{Batch, MemorySink};
/// use rowflow::rowflow::row::{FieldValue, Row};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = MemorySink::new();
/// let mut batch = Batch::new(Box::new(sink.clone()), 2);
///
/// for i in 0..3 {
///     batch.append(Row::from_pairs([("n", FieldValue::Integer(i))])).await?;
/// }
/// batch.finish().await?;
///
/// let flushed = sink.batches();
/// assert_eq!(flushed.len(), 2);
/// assert_eq!(flushed[0].len(), 2);
/// assert_eq!(flushed[1].len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Batch {
    rows: Vec<Row>,
    capacity: usize,
    sink: Box<dyn BatchSink>,
    flushes: usize,
}

impl Batch {
    /// Create an accumulator over a sink with the given capacity.
    ///
    /// A capacity of zero is treated as one: every accepted row flushes
    /// immediately.
    pub fn new(sink: Box<dyn BatchSink>, capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            sink,
            flushes: 0,
        }
    }

    /// Append an accepted row, flushing when capacity is reached.
    ///
    /// The accumulator never holds more than `capacity` rows between
    /// flushes.
    pub async fn append(&mut self, row: Row) -> Result<()> {
        self.rows.push(row);
        if self.rows.len() >= self.capacity {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush whatever is buffered, if anything.
    ///
    /// The buffer is drained before the sink write begins, making the
    /// flush atomic with respect to the accumulator.
    pub async fn flush(&mut self) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.rows);
        log::debug!("flushing batch of {} rows", rows.len());
        self.sink.write_batch(rows).await?;
        self.flushes += 1;
        Ok(())
    }

    /// Flush the remainder at run end.
    pub async fn finish(&mut self) -> Result<()> {
        self.flush().await
    }

    /// Rows currently buffered.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Configured capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of completed flushes so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

/// Sink that retains flushed batches in memory.
///
/// Clones share storage, so a test can keep one clone and hand another to
/// the pipeline, then inspect the flushed groups afterwards.
#[derive(Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<Vec<Row>>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the flushed batches, in flush order.
    pub fn batches(&self) -> Vec<Vec<Row>> {
        self.batches
            .lock()
            .expect("memory sink lock poisoned")
            .clone()
    }

    /// Total rows across all flushed batches.
    pub fn total_rows(&self) -> usize {
        self.batches
            .lock()
            .expect("memory sink lock poisoned")
            .iter()
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    async fn write_batch(&mut self, rows: Vec<Row>) -> Result<()> {
        self.batches
            .lock()
            .expect("memory sink lock poisoned")
            .push(rows);
        Ok(())
    }
}

//! The pipeline driver.
//!
//! [`Pipeline`] owns the ordered stage list and drives each row through
//! TransformChain → ProcessorChain → ScreenChain → Batch. Rows are
//! processed strictly one at a time: a row fully settles (transformed,
//! processed, screened, and maybe batched) before the next row begins, so
//! the lookup caches and the batch accumulator need no internal locking.
//!
//! Screen rejections are absorbed per row. Every other failure aborts the
//! run at a row boundary; the partially filled batch is flushed once before
//! the error surfaces, so rows accepted before the fatal point reach the
//! sink. Output already flushed is never rolled back.

use crate::rowflow::batch::{Batch, BatchSink};
use crate::rowflow::error::{PipelineError, Result};
use crate::rowflow::processor::{Processor, ProcessorChain, RowProcessor};
use crate::rowflow::row::Row;
use crate::rowflow::screen::{RowState, Screen, ScreenChain};
use crate::rowflow::transform::{Transform, TransformChain};
use std::fmt;
use std::time::{Duration, Instant};

/// Counters describing one completed run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Rows ingested from the source
    pub rows_read: usize,
    /// Rows accepted by every screen and handed to the batch
    pub rows_processed: usize,
    /// Rows dropped by a screen
    pub rows_rejected: usize,
    /// Completed batch flushes, the final partial flush included
    pub batches_flushed: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {} rows, processed {}, rejected {}, flushed {} batches in {:?}",
            self.rows_read,
            self.rows_processed,
            self.rows_rejected,
            self.batches_flushed,
            self.elapsed
        )
    }
}

/// Row-processing pipeline.
///
/// Assembled by the control layer: transforms, processors, and screens are
/// registered in execution order, then [`run`](Pipeline::run) drives a
/// source's rows through the stages and reports counters.
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::batch::MemorySink;
/// use rowflow::rowflow::engine::Pipeline;
/// use rowflow::rowflow::row::{FieldValue, Row};
/// use rowflow::rowflow::screen::{RequiredFieldsScreen, Severity};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = MemorySink::new();
/// let mut pipeline = Pipeline::new(Box::new(sink.clone()), 2);
/// pipeline.add_screen(Box::new(RequiredFieldsScreen::new(["name"], Severity::Reject)));
///
/// let rows = vec![
///     Row::from_pairs([("name", FieldValue::String("Acme".to_string()))]),
///     Row::from_pairs([("name", FieldValue::Null)]),
/// ];
/// let report = pipeline.run(rows).await?;
///
/// assert_eq!(report.rows_processed, 1);
/// assert_eq!(report.rows_rejected, 1);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    transforms: TransformChain,
    pre_processors: Vec<Box<dyn Processor>>,
    processors: ProcessorChain,
    post_processors: Vec<Box<dyn Processor>>,
    screens: ScreenChain,
    batch: Batch,
}

impl Pipeline {
    /// Create a pipeline writing accepted rows to a sink in batches of the
    /// given capacity.
    pub fn new(sink: Box<dyn BatchSink>, batch_capacity: usize) -> Self {
        Self {
            transforms: TransformChain::new(),
            pre_processors: Vec::new(),
            processors: ProcessorChain::new(),
            post_processors: Vec::new(),
            screens: ScreenChain::new(),
            batch: Batch::new(sink, batch_capacity),
        }
    }

    /// Register a transform for a declared field.
    pub fn add_transform(
        &mut self,
        field: impl Into<String>,
        transform: Box<dyn Transform>,
    ) -> &mut Self {
        self.transforms.add(field, transform);
        self
    }

    /// Register a lifecycle processor invoked before the first row.
    pub fn add_pre_processor(&mut self, processor: Box<dyn Processor>) -> &mut Self {
        self.pre_processors.push(processor);
        self
    }

    /// Register a row processor.
    pub fn add_processor(&mut self, processor: Box<dyn RowProcessor>) -> &mut Self {
        self.processors.add(processor);
        self
    }

    /// Register a lifecycle processor invoked after the last row.
    pub fn add_post_processor(&mut self, processor: Box<dyn Processor>) -> &mut Self {
        self.post_processors.push(processor);
        self
    }

    /// Register a screen.
    pub fn add_screen(&mut self, screen: Box<dyn Screen>) -> &mut Self {
        self.screens.add(screen);
        self
    }

    /// Drive every source row through the pipeline.
    ///
    /// Returns the run counters on completion. On a fatal condition the
    /// partially filled batch is flushed once and the error is returned;
    /// rows already flushed stay flushed.
    pub async fn run<I>(&mut self, rows: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = Row>,
    {
        let started = Instant::now();
        let mut report = RunReport::default();

        for processor in &mut self.pre_processors {
            log::debug!("running pre-processor '{}'", processor.name());
            processor.process()?;
        }

        for row in rows {
            report.rows_read += 1;

            let mut row = row;
            if let Err(err) = self.transforms.apply(&mut row) {
                return self.abort(err).await;
            }

            let row = match self.processors.process(row).await {
                Ok(row) => row,
                Err(err) => return self.abort(err).await,
            };

            match self.screens.evaluate(&row) {
                RowState::Accepted => {
                    self.batch.append(row).await?;
                    report.rows_processed += 1;
                }
                RowState::Rejected { screen, message } => {
                    log::warn!(
                        "row rejected by screen '{}': {} (row: {})",
                        screen,
                        message,
                        row
                    );
                    report.rows_rejected += 1;
                }
                RowState::FatalAborted { screen, message } => {
                    let snapshot = row.snapshot();
                    return self
                        .abort(PipelineError::FatalScreen {
                            screen,
                            message,
                            row: Some(snapshot),
                        })
                        .await;
                }
                RowState::Pending => {
                    unreachable!("screen chain returned a non-terminal state")
                }
            }
        }

        self.batch.finish().await?;

        for processor in &mut self.post_processors {
            log::debug!("running post-processor '{}'", processor.name());
            processor.process()?;
        }

        report.batches_flushed = self.batch.flush_count();
        report.elapsed = started.elapsed();
        log::info!("pipeline run complete: {}", report);
        Ok(report)
    }

    /// Flush in-flight work and surface the fatal error.
    ///
    /// The flush failure, if any, is logged rather than masking the
    /// original error.
    async fn abort(&mut self, err: PipelineError) -> Result<RunReport> {
        if let Err(flush_err) = self.batch.finish().await {
            log::error!(
                "failed to flush partial batch while aborting: {}",
                flush_err
            );
        }
        Err(err)
    }
}

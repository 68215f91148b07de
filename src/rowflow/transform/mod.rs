//! Per-field value transforms.
//!
//! Transforms run before any row-level processor. Each one converts a single
//! declared field, with read-only access to the rest of the row for
//! cross-field context. Transform failures are not recoverable at the row
//! level: malformed data this early is treated as a fatal defect, and the
//! error propagates up and terminates the run.

pub mod string_to_timestamp;

pub use string_to_timestamp::StringToTimestampTransform;

use crate::rowflow::error::Result;
use crate::rowflow::row::{FieldValue, Row};

/// Pure per-field value converter.
///
/// `transform` receives the field name, the field's current value, and the
/// full row for cross-field context, and returns the replacement value.
/// Implementations are pure with respect to other fields unless explicitly
/// reading them.
pub trait Transform: Send + Sync {
    /// Convert one field value, or propagate a fatal failure.
    fn transform(&self, name: &str, value: FieldValue, row: &Row) -> Result<FieldValue>;
}

/// Ordered list of `(field, transform)` pairs applied to each row.
///
/// A transform only runs when its declared field is present on the row;
/// absent fields are skipped, not invented.
#[derive(Default)]
pub struct TransformChain {
    transforms: Vec<(String, Box<dyn Transform>)>,
}

impl TransformChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform for a declared field.
    pub fn add(&mut self, field: impl Into<String>, transform: Box<dyn Transform>) -> &mut Self {
        self.transforms.push((field.into(), transform));
        self
    }

    /// Number of transforms in the chain.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the chain has no transforms.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Apply every transform in order, mutating the row in place.
    pub fn apply(&self, row: &mut Row) -> Result<()> {
        for (field, transform) in &self.transforms {
            let Some(value) = row.get(field).cloned() else {
                continue;
            };
            let replacement = transform.transform(field, value, row)?;
            row.set(field.clone(), replacement);
        }
        Ok(())
    }
}

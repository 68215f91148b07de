//! Datasource target registry.
//!
//! Maps the `target` identifiers that appear in processor configuration to
//! live [`DataSource`] handles. The registry is an explicit value handed to
//! each component at construction; resolution failures surface as
//! [`PipelineError::Resolver`] before any row is processed.

use crate::rowflow::datasource::traits::DataSource;
use crate::rowflow::error::{PipelineError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry mapping target identifiers to shared datasource handles.
///
/// Handles are `Arc`-shared so several processors can resolve the same
/// target without duplicating connections. Interior locking makes the
/// registry shareable by reference during pipeline assembly.
#[derive(Default)]
pub struct DataSourceRegistry {
    sources: RwLock<HashMap<String, Arc<dyn DataSource>>>,
}

impl DataSourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a datasource under a target identifier.
    ///
    /// Re-registering a name replaces the previous handle.
    pub fn register(&self, target: impl Into<String>, source: Arc<dyn DataSource>) {
        self.sources
            .write()
            .expect("datasource registry lock poisoned")
            .insert(target.into(), source);
    }

    /// Resolve a target identifier to its datasource handle.
    pub fn resolve(&self, target: &str) -> Result<Arc<dyn DataSource>> {
        self.sources
            .read()
            .expect("datasource registry lock poisoned")
            .get(target)
            .cloned()
            .ok_or_else(|| {
                PipelineError::resolver(
                    target,
                    format!(
                        "no datasource registered for target (known targets: {:?})",
                        self.targets()
                    ),
                )
            })
    }

    /// Registered target identifiers, unordered.
    pub fn targets(&self) -> Vec<String> {
        self.sources
            .read()
            .expect("datasource registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Whether a target identifier is registered.
    pub fn contains(&self, target: &str) -> bool {
        self.sources
            .read()
            .expect("datasource registry lock poisoned")
            .contains_key(target)
    }
}

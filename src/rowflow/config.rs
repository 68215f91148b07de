//! Configuration surface for pipeline processors.
//!
//! Options deserialize from YAML or JSON documents produced by whatever
//! control layer assembles the pipeline. Defaults follow the documented
//! option table; validation runs at construction time so a bad document
//! fails before any row is processed.

use crate::rowflow::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Options for the lookup-and-fill processor.
///
/// | Option | Default | Effect |
/// |---|---|---|
/// | `values` | required | output columns to fetch, as field → column |
/// | `match` | required | row fields forming the lookup key, as field → column |
/// | `target` | required | datasource identifier |
/// | `table` | required | reference table identifier |
/// | `overwrite` | `true` | overwrite vs fill-blank-only policy |
/// | `use_first` | `false` | tolerate ambiguous matches by taking the first |
/// | `use_cache` | `true` | enable per-key memoization |
/// | `preload_cache` | `true` | bulk-fetch all reference rows up front |
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::config::FillConfig;
///
/// let config = FillConfig::from_yaml_str(r#"
/// values:
///   customer_name: name
/// match:
///   customer_id: id
/// target: default
/// table: customers
/// overwrite: false
/// "#).unwrap();
///
/// assert!(!config.overwrite);
/// assert!(config.use_cache);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    /// Output mapping: row field to set → source column to fetch
    #[serde(default)]
    pub values: HashMap<String, String>,

    /// Key mapping: row field to read → source column to compare
    #[serde(default, rename = "match")]
    pub match_on: HashMap<String, String>,

    /// Datasource identifier resolved through the registry
    #[serde(default)]
    pub target: String,

    /// Reference table to select from
    #[serde(default)]
    pub table: String,

    /// Overwrite existing non-blank row values with looked-up values
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Take the first row when a lookup matches more than one
    #[serde(default)]
    pub use_first: bool,

    /// Memoize lookups per key
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Fetch the whole reference table into the cache before the run
    #[serde(default = "default_true")]
    pub preload_cache: bool,
}

impl FillConfig {
    /// Start a config for the given target and table with default policies
    /// and empty mappings.
    pub fn new(target: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            values: HashMap::new(),
            match_on: HashMap::new(),
            target: target.into(),
            table: table.into(),
            overwrite: true,
            use_first: false,
            use_cache: true,
            preload_cache: true,
        }
    }

    /// Add an output mapping entry (row field ← source column).
    pub fn value(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.values.insert(field.into(), column.into());
        self
    }

    /// Add a key mapping entry (row field = source column).
    pub fn match_field(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.match_on.insert(field.into(), column.into());
        self
    }

    /// Set the overwrite policy.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the ambiguity policy.
    pub fn use_first(mut self, use_first: bool) -> Self {
        self.use_first = use_first;
        self
    }

    /// Enable or disable memoization.
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Enable or disable cache preload.
    pub fn preload_cache(mut self, preload_cache: bool) -> Self {
        self.preload_cache = preload_cache;
        self
    }

    /// Check that every required option is present and non-empty.
    ///
    /// Raised at construction, never deferred to the first row.
    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(PipelineError::configuration(
                "fill processor requires a non-empty 'values' mapping",
            ));
        }
        if self.match_on.is_empty() {
            return Err(PipelineError::configuration(
                "fill processor requires a non-empty 'match' mapping",
            ));
        }
        if self.target.is_empty() {
            return Err(PipelineError::configuration(
                "fill processor requires a 'target' datasource identifier",
            ));
        }
        if self.table.is_empty() {
            return Err(PipelineError::configuration(
                "fill processor requires a 'table' identifier",
            ));
        }
        Ok(())
    }

    /// Parse a config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

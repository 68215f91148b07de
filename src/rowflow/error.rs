//! Error types for the processing pipeline.
//!
//! Only screen *rejections* are recoverable, and they are not errors at all:
//! the engine drops the row, logs it, and moves on. Everything that reaches
//! [`PipelineError`] terminates the run.
//!
//! ## Error Categories
//!
//! - **Configuration**: missing or empty required options, raised at
//!   construction before any row is processed
//! - **Resolver**: a datasource target that cannot be resolved
//! - **TooManyResults**: an ambiguous lookup without `use_first`, raised at
//!   preload or at the offending row
//! - **Transform**: an unparsable value at the transform stage
//! - **Query**: a datasource failure while executing generated SQL
//! - **FatalScreen**: a domain-level validation abort, carrying the row
//!   snapshot that triggered it

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that terminate a pipeline run.
///
/// Each variant carries the context a caller needs to report which stage
/// failed and why: the offending query or field, and the row snapshot where
/// one exists (per-row fatal conditions have one, pre-run configuration
/// errors do not).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required option is missing or empty. Raised at construction time,
    /// never deferred to the first row.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the missing or invalid option
        message: String,
    },

    /// A datasource target identifier could not be resolved.
    #[error("Cannot resolve datasource target '{target}': {message}")]
    Resolver {
        /// The target identifier that failed to resolve
        target: String,
        /// Description of the resolution failure
        message: String,
    },

    /// A lookup matched more than one reference row and `use_first` was not
    /// set. Fatal whether it surfaces during cache preload or at a row.
    #[error("Too many results found (and use_first not set) using the following query: {query}")]
    TooManyResults {
        /// The SQL text, or the colliding preload key, that was ambiguous
        query: String,
    },

    /// A transform could not convert a field value. Malformed data at the
    /// transform stage is a fatal defect, not a skippable anomaly.
    #[error("Transform failed for field '{field}' with value '{value}': {message}")]
    Transform {
        /// Field the transform was applied to
        field: String,
        /// The offending input value
        value: String,
        /// Description of the conversion failure
        message: String,
    },

    /// A datasource failed while executing a query.
    #[error("Query execution failed for '{query}': {message}")]
    Query {
        /// The SQL text that was being executed
        query: String,
        /// Description of the failure
        message: String,
    },

    /// A sink failed while writing a flushed batch.
    #[error("Batch write of {rows} rows failed: {message}")]
    Load {
        /// Number of rows in the failed batch
        rows: usize,
        /// Description of the failure
        message: String,
    },

    /// A screen returned a fatal outcome. Distinct from configuration and
    /// ambiguity errors in origin (domain-level validation) but identical in
    /// effect: the run stops at this row.
    #[error("Screen '{screen}' aborted the run: {message}")]
    FatalScreen {
        /// Name of the screen that aborted
        screen: String,
        /// The screen's diagnostic message
        message: String,
        /// JSON snapshot of the row under evaluation
        row: Option<String>,
    },

    /// Failed to read a configuration file.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a YAML configuration document.
    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        PipelineError::Configuration {
            message: message.into(),
        }
    }

    /// Create a resolver error for a datasource target.
    pub fn resolver(target: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Resolver {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an ambiguity error naming the offending query.
    pub fn too_many_results(query: impl Into<String>) -> Self {
        PipelineError::TooManyResults {
            query: query.into(),
        }
    }

    /// Create a query execution error.
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Query {
            query: query.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_results_names_query() {
        let err = PipelineError::too_many_results("SELECT name FROM customers WHERE id = 7");
        let text = format!("{}", err);
        assert!(text.contains("use_first not set"));
        assert!(text.contains("SELECT name FROM customers WHERE id = 7"));
    }

    #[test]
    fn test_configuration_error_display() {
        let err = PipelineError::configuration("fill processor requires 'values'");
        assert_eq!(
            format!("{}", err),
            "Configuration error: fill processor requires 'values'"
        );
    }
}

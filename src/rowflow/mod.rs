//! Core modules of the rowflow engine.
//!
//! The pipeline drives each row through the stages in order:
//!
//! ```text
//! source row -> TransformChain -> ProcessorChain -> ScreenChain -> Batch
//! ```
//!
//! - [`row`]: the dynamic value type system and the row field map
//! - [`error`]: the error taxonomy shared by every stage
//! - [`datasource`]: the narrow query interface consumed by lookups
//! - [`transform`]: pure per-field value conversions
//! - [`processor`]: row-level and run-lifecycle work units, including the
//!   cache-backed lookup-and-fill processor
//! - [`screen`]: accept/reject/fatal row validation
//! - [`batch`]: bounded accumulation and bulk write
//! - [`engine`]: the pipeline driver
//! - [`config`]: serde-based configuration surface

pub mod batch;
pub mod config;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod processor;
pub mod row;
pub mod screen;
pub mod transform;

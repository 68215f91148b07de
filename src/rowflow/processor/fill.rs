//! The cache-backed lookup-and-fill row processor.
//!
//! Populates or overwrites row fields from a reference table keyed on other
//! row fields. A preloaded or lazily populated [`LookupCache`] avoids
//! repeated queries; ambiguity and overwrite policies come from
//! [`FillConfig`].
//!
//! ## Algorithm
//!
//! At construction the processor validates its configuration, resolves the
//! target datasource, and builds one reusable select template over the
//! output and match columns. With preload enabled it then fetches the whole
//! reference table and keys it by the match columns, so the cache is fully
//! populated before the first row arrives.
//!
//! Per row it derives the cache key from the row's match fields, consults
//! the cache (querying on a lazy miss), and applies the overwrite policy to
//! each output field. A missing reference row is a recoverable non-event:
//! the row passes through unmodified.

use crate::rowflow::config::FillConfig;
use crate::rowflow::datasource::{DataSource, DataSourceRegistry, SelectTemplate};
use crate::rowflow::error::{PipelineError, Result};
use crate::rowflow::processor::cache::{CacheKey, LookupCache};
use crate::rowflow::processor::RowProcessor;
use crate::rowflow::row::{FieldValue, Row};
use async_trait::async_trait;
use std::sync::Arc;

/// Row processor that fills fields from a reference-table lookup.
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::config::FillConfig;
/// use rowflow::rowflow::datasource::{DataSourceRegistry, MemoryDataSource};
/// use rowflow::rowflow::processor::{LookupFillProcessor, RowProcessor};
/// use rowflow::rowflow::row::{FieldValue, Row};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = MemoryDataSource::new();
/// source.insert(
///     "customers",
///     Row::from_pairs([
///         ("id", FieldValue::Integer(7)),
///         ("name", FieldValue::String("Acme".to_string())),
///     ]),
/// );
/// let registry = DataSourceRegistry::new();
/// registry.register("default", Arc::new(source));
///
/// let config = FillConfig::new("default", "customers")
///     .value("customer_name", "name")
///     .match_field("customer_id", "id");
/// let mut fill = LookupFillProcessor::from_config(config, &registry).await?;
///
/// let row = Row::from_pairs([("customer_id", FieldValue::Integer(7))]);
/// let row = fill.process(row).await?;
/// assert_eq!(row.get("customer_name"), Some(&FieldValue::String("Acme".to_string())));
/// # Ok(())
/// # }
/// ```
pub struct LookupFillProcessor {
    /// Output pairs (row field, source column), sorted by field name
    values: Vec<(String, String)>,
    /// Match pairs (row field, source column), sorted by field name so the
    /// row-side and table-side key projections agree on order
    match_on: Vec<(String, String)>,
    table: String,
    overwrite: bool,
    use_first: bool,
    use_cache: bool,
    source: Arc<dyn DataSource>,
    template: SelectTemplate,
    cache: LookupCache,
}

impl std::fmt::Debug for LookupFillProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupFillProcessor")
            .field("values", &self.values)
            .field("match_on", &self.match_on)
            .field("table", &self.table)
            .field("overwrite", &self.overwrite)
            .field("use_first", &self.use_first)
            .field("use_cache", &self.use_cache)
            .finish_non_exhaustive()
    }
}

impl LookupFillProcessor {
    /// Build the processor from its configuration.
    ///
    /// Validates required options, resolves the datasource target, and
    /// runs the cache preload when configured. Every failure here is fatal
    /// and happens before the first row is processed.
    pub async fn from_config(
        config: FillConfig,
        registry: &DataSourceRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let source = registry.resolve(&config.target)?;

        let mut values: Vec<(String, String)> = config.values.into_iter().collect();
        values.sort();
        let mut match_on: Vec<(String, String)> = config.match_on.into_iter().collect();
        match_on.sort();

        // Select list covers output columns then match columns, deduped
        let mut columns: Vec<String> = Vec::new();
        for (_, column) in values.iter().chain(match_on.iter()) {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        let template = SelectTemplate::new(columns, config.table.clone());

        let mut processor = Self {
            values,
            match_on,
            table: config.table,
            overwrite: config.overwrite,
            use_first: config.use_first,
            use_cache: config.use_cache,
            source,
            template,
            cache: LookupCache::new(),
        };

        // Preload only makes sense with the cache enabled
        if processor.use_cache && config.preload_cache {
            processor.preload().await?;
        }
        Ok(processor)
    }

    /// Fetch the whole reference table and key it by the match columns.
    ///
    /// Ambiguity is caught here, not deferred per-row: a duplicate key
    /// without `use_first` aborts immediately.
    async fn preload(&mut self) -> Result<()> {
        let sql = self.template.select_all();
        let rows = self.source.execute_query(&sql).await?;
        let fetched = rows.len();

        for row in rows {
            let key = self.table_side_key(&row);
            if self.cache.contains(&key) {
                if !self.use_first {
                    return Err(PipelineError::too_many_results(sql.as_str()));
                }
                log::debug!(
                    "discarding duplicate reference row for key {} in table {} (use_first set)",
                    key,
                    self.table
                );
                continue;
            }
            self.cache.insert(key, Some(row));
        }

        self.cache.mark_preloaded();
        log::info!(
            "preloaded {} reference rows ({} distinct keys) from table {}",
            fetched,
            self.cache.len(),
            self.table
        );
        Ok(())
    }

    /// Key a pipeline row by its match fields. A missing field keys as
    /// null; blank values participate like any other value.
    fn row_side_key(&self, row: &Row) -> CacheKey {
        let values: Vec<FieldValue> = self
            .match_on
            .iter()
            .map(|(field, _)| row.get(field).cloned().unwrap_or(FieldValue::Null))
            .collect();
        CacheKey::from_values(values.iter())
    }

    /// Key a reference row by its match columns.
    fn table_side_key(&self, row: &Row) -> CacheKey {
        let values: Vec<FieldValue> = self
            .match_on
            .iter()
            .map(|(_, column)| row.get(column).cloned().unwrap_or(FieldValue::Null))
            .collect();
        CacheKey::from_values(values.iter())
    }

    /// Resolve the reference row for a pipeline row, consulting the cache
    /// and querying on a lazy miss.
    async fn lookup(&mut self, row: &Row) -> Result<Option<Row>> {
        let key = self.row_side_key(row);

        if self.use_cache {
            if let Some(entry) = self.cache.get(&key) {
                return Ok(entry.clone());
            }
            if self.cache.is_preloaded() {
                // Fully populated: an absent key is a definitive no-match
                return Ok(None);
            }
        }

        let conditions: Vec<(String, FieldValue)> = self
            .match_on
            .iter()
            .map(|(field, column)| {
                (
                    column.clone(),
                    row.get(field).cloned().unwrap_or(FieldValue::Null),
                )
            })
            .collect();
        let sql = self.template.select_where(&conditions, self.source.as_ref());
        log::debug!("lookup miss for key {}, executing: {}", key, sql);

        let mut results = self.source.execute_query(&sql).await?;
        if results.len() > 1 && !self.use_first {
            return Err(PipelineError::too_many_results(sql.as_str()));
        }

        let found = if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        };
        if self.use_cache {
            self.cache.insert(key, found.clone());
        }
        Ok(found)
    }

    /// Apply the overwrite policy for every output field.
    fn fill(&self, row: &mut Row, reference: &Row) {
        for (field, column) in &self.values {
            let looked_up = reference.get(column).cloned().unwrap_or(FieldValue::Null);
            if looked_up.is_blank() {
                // Blank values never overwrite, regardless of policy
                continue;
            }
            let current_blank = row.get(field).map(FieldValue::is_blank).unwrap_or(true);
            if self.overwrite || current_blank {
                row.set(field.clone(), looked_up);
            }
        }
    }

    /// Cached entry count, for diagnostics.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl RowProcessor for LookupFillProcessor {
    fn name(&self) -> &str {
        "lookup_fill"
    }

    async fn process(&mut self, mut row: Row) -> Result<Row> {
        match self.lookup(&row).await? {
            Some(reference) => self.fill(&mut row, &reference),
            None => {
                log::info!(
                    "no reference row in table {} for key {}; row left unmodified",
                    self.table,
                    self.row_side_key(&row)
                );
            }
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rowflow::datasource::MemoryDataSource;

    fn reference_row(id: i64, name: &str) -> Row {
        Row::from_pairs([
            ("id", FieldValue::Integer(id)),
            ("name", FieldValue::String(name.to_string())),
        ])
    }

    fn registry_with(rows: Vec<Row>) -> DataSourceRegistry {
        let source = MemoryDataSource::new();
        source.insert_all("customers", rows);
        let registry = DataSourceRegistry::new();
        registry.register("default", Arc::new(source));
        registry
    }

    fn base_config() -> FillConfig {
        FillConfig::new("default", "customers")
            .value("customer_name", "name")
            .match_field("customer_id", "id")
    }

    #[tokio::test]
    async fn test_basic_fill() {
        let registry = registry_with(vec![reference_row(7, "Acme")]);
        let mut fill = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap();

        let row = Row::from_pairs([("customer_id", FieldValue::Integer(7))]);
        let row = fill.process(row).await.unwrap();

        assert_eq!(row.get("customer_id"), Some(&FieldValue::Integer(7)));
        assert_eq!(
            row.get("customer_name"),
            Some(&FieldValue::String("Acme".to_string()))
        );
    }

    #[tokio::test]
    async fn test_overwrite_false_preserves_existing() {
        let registry = registry_with(vec![reference_row(7, "Acme")]);
        let mut fill =
            LookupFillProcessor::from_config(base_config().overwrite(false), &registry)
                .await
                .unwrap();

        let row = Row::from_pairs([
            ("customer_id", FieldValue::Integer(7)),
            ("customer_name", FieldValue::String("Existing".to_string())),
        ]);
        let row = fill.process(row).await.unwrap();

        assert_eq!(
            row.get("customer_name"),
            Some(&FieldValue::String("Existing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_overwrite_true_replaces_existing() {
        let registry = registry_with(vec![reference_row(7, "Acme")]);
        let mut fill = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap();

        let row = Row::from_pairs([
            ("customer_id", FieldValue::Integer(7)),
            ("customer_name", FieldValue::String("Existing".to_string())),
        ]);
        let row = fill.process(row).await.unwrap();

        assert_eq!(
            row.get("customer_name"),
            Some(&FieldValue::String("Acme".to_string()))
        );
    }

    #[tokio::test]
    async fn test_blank_result_never_overwrites() {
        let registry = registry_with(vec![reference_row(7, "")]);
        let mut fill = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap();

        let row = Row::from_pairs([
            ("customer_id", FieldValue::Integer(7)),
            ("customer_name", FieldValue::String("Existing".to_string())),
        ]);
        let row = fill.process(row).await.unwrap();

        assert_eq!(
            row.get("customer_name"),
            Some(&FieldValue::String("Existing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_preload_ambiguity_fails_fast() {
        let registry =
            registry_with(vec![reference_row(7, "Acme"), reference_row(7, "Globex")]);
        let err = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap_err();

        match err {
            PipelineError::TooManyResults { query } => {
                assert!(query.contains("customers"));
            }
            other => panic!("expected too-many-results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_preload_use_first_keeps_first() {
        let registry =
            registry_with(vec![reference_row(7, "Acme"), reference_row(7, "Globex")]);
        let mut fill =
            LookupFillProcessor::from_config(base_config().use_first(true), &registry)
                .await
                .unwrap();

        let row = Row::from_pairs([("customer_id", FieldValue::Integer(7))]);
        let row = fill.process(row).await.unwrap();

        assert_eq!(
            row.get("customer_name"),
            Some(&FieldValue::String("Acme".to_string()))
        );
    }

    #[tokio::test]
    async fn test_lazy_ambiguity_names_query() {
        let registry =
            registry_with(vec![reference_row(7, "Acme"), reference_row(7, "Globex")]);
        let mut fill = LookupFillProcessor::from_config(
            base_config().preload_cache(false),
            &registry,
        )
        .await
        .unwrap();

        let row = Row::from_pairs([("customer_id", FieldValue::Integer(7))]);
        let err = fill.process(row).await.unwrap_err();

        match err {
            PipelineError::TooManyResults { query } => {
                assert!(query.contains("WHERE id = 7"));
            }
            other => panic!("expected too-many-results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_match_leaves_row_unmodified() {
        let registry = registry_with(vec![reference_row(7, "Acme")]);
        let mut fill = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap();

        let row = Row::from_pairs([("customer_id", FieldValue::Integer(99))]);
        let processed = fill.process(row.clone()).await.unwrap();

        assert_eq!(processed, row);
    }

    #[tokio::test]
    async fn test_lazy_mode_memoizes_misses() {
        let registry = registry_with(vec![reference_row(7, "Acme")]);
        let mut fill = LookupFillProcessor::from_config(
            base_config().preload_cache(false),
            &registry,
        )
        .await
        .unwrap();

        assert_eq!(fill.cache_len(), 0);
        let row = Row::from_pairs([("customer_id", FieldValue::Integer(99))]);
        fill.process(row.clone()).await.unwrap();
        // The no-match sentinel is cached too
        assert_eq!(fill.cache_len(), 1);
        fill.process(row).await.unwrap();
        assert_eq!(fill.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_cache_key_equivalence_between_sides() {
        // Reference table stores the id as a string; the row carries an
        // integer. The normalized keys must still collide.
        let registry = registry_with(vec![Row::from_pairs([
            ("id", FieldValue::String("7".to_string())),
            ("name", FieldValue::String("Acme".to_string())),
        ])]);
        let mut fill = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap();

        let row = Row::from_pairs([("customer_id", FieldValue::Integer(7))]);
        let row = fill.process(row).await.unwrap();

        assert_eq!(
            row.get("customer_name"),
            Some(&FieldValue::String("Acme".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_configuration_fails_before_rows() {
        let registry = registry_with(vec![]);
        let config = FillConfig::new("default", "customers");
        let err = LookupFillProcessor::from_config(config, &registry)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_unresolvable_target_fails_before_rows() {
        let registry = DataSourceRegistry::new();
        let err = LookupFillProcessor::from_config(base_config(), &registry)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Resolver { .. }));
    }
}

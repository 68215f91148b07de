//! Key normalization and the lookup memoization cache.

use crate::rowflow::row::{FieldValue, Row};
use std::collections::HashMap;
use std::fmt;

/// Deterministic key derived from an ordered list of match-field values.
///
/// Values are normalized to their canonical string form before joining, so
/// the same logical values produce the same key regardless of native
/// representation: a row carrying `customer_id = Integer(7)` and a
/// reference row carrying `id = String("7")` project to identical keys.
///
/// The components join on an ASCII unit separator, which cannot collide
/// with anything the canonical forms produce in practice and keeps keys
/// readable in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    const SEPARATOR: char = '\u{1F}';

    /// Build a key from match-field values in their configured order.
    ///
    /// Blank and null values participate like any other value; there is no
    /// short-circuit for empty match fields.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldValue>,
    {
        let parts: Vec<String> = values
            .into_iter()
            .map(FieldValue::canonical_string)
            .collect();
        CacheKey(parts.join(&Self::SEPARATOR.to_string()))
    }

    /// The normalized key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render the separator visibly for logs
        write!(f, "{}", self.0.replace(Self::SEPARATOR, "|"))
    }
}

/// Memoization cache over reference-table lookups.
///
/// An entry maps a key to the fetched reference row, or to a no-match
/// sentinel (`None`) so repeated misses do not re-query. In preload mode
/// the cache is fully populated before the first row is processed and
/// never grows afterwards; in lazy mode it grows monotonically during the
/// run. The cache is unbounded and never evicts, matching the memoization
/// contract: very long lazy-mode runs trade memory for queries.
#[derive(Default)]
pub struct LookupCache {
    entries: HashMap<CacheKey, Option<Row>>,
    preloaded: bool,
}

impl LookupCache {
    /// Create an empty cache in lazy mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry. `None` means the key was never cached;
    /// `Some(None)` is a cached no-match.
    pub fn get(&self, key: &CacheKey) -> Option<&Option<Row>> {
        self.entries.get(key)
    }

    /// Whether the key has an entry (match or no-match sentinel).
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, key: CacheKey, entry: Option<Row>) {
        self.entries.insert(key, entry);
    }

    /// Mark the cache as fully populated by a preload pass.
    ///
    /// After this, an absent key means "no match", not "not yet fetched".
    pub fn mark_preloaded(&mut self) {
        self.preloaded = true;
    }

    /// Whether the cache was populated by a preload pass.
    pub fn is_preloaded(&self) -> bool {
        self.preloaded
    }

    /// Number of cached entries, no-match sentinels included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equal_across_representations() {
        let row_side = CacheKey::from_values([&FieldValue::Integer(7)]);
        let table_side = CacheKey::from_values([&FieldValue::String("7".to_string())]);
        let float_side = CacheKey::from_values([&FieldValue::Float(7.0)]);

        assert_eq!(row_side, table_side);
        assert_eq!(row_side, float_side);
    }

    #[test]
    fn test_key_is_order_sensitive() {
        let a = FieldValue::String("a".to_string());
        let b = FieldValue::String("b".to_string());
        assert_ne!(
            CacheKey::from_values([&a, &b]),
            CacheKey::from_values([&b, &a])
        );
    }

    #[test]
    fn test_blank_values_participate() {
        let with_null = CacheKey::from_values([&FieldValue::Null, &FieldValue::Integer(1)]);
        let with_empty = CacheKey::from_values([
            &FieldValue::String(String::new()),
            &FieldValue::Integer(1),
        ]);
        // Null and empty string normalize identically; both form valid keys
        assert_eq!(with_null, with_empty);
    }

    #[test]
    fn test_no_match_sentinel() {
        let mut cache = LookupCache::new();
        let key = CacheKey::from_values([&FieldValue::Integer(9)]);

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), None);
        assert_eq!(cache.get(&key), Some(&None));
    }

    #[test]
    fn test_preload_flag() {
        let mut cache = LookupCache::new();
        assert!(!cache.is_preloaded());
        cache.mark_preloaded();
        assert!(cache.is_preloaded());
    }
}

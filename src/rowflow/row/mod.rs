//! Row and value types for the processing pipeline.
//!
//! This module contains the fundamental data types that flow through every
//! pipeline stage:
//! - [`FieldValue`] - the scalar value type system
//! - [`Row`] - the ordered, uniquely-keyed field map
//!
//! Rows are created by the source reader, mutated in place by transforms and
//! processors, and released once written to a batch or dropped by a screen.

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A scalar value held by a row field.
///
/// This enum represents all value kinds the pipeline understands. Source
/// readers produce them, transforms replace them, and the lookup processor
/// compares and copies them between reference tables and in-flight rows.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Timestamp without timezone (YYYY-MM-DD HH:MM:SS[.nnn])
    Timestamp(NaiveDateTime),
    /// Absent / unknown value
    Null,
}

impl FieldValue {
    /// Whether this value is blank for the purposes of the overwrite policy.
    ///
    /// Blank means `Null` or a string that is empty or all whitespace. A
    /// blank looked-up value never overwrites an existing row value, and
    /// `overwrite = false` only fills fields whose current value is blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Canonical string form used for cache keying.
    ///
    /// Equivalent logical values must produce identical output regardless of
    /// their native representation: `Integer(7)`, `Float(7.0)` and
    /// `String("7")` all normalize to `"7"`. Reference-table results and
    /// in-memory rows may carry the same column in different types, so the
    /// key derivation on both sides goes through this single function.
    pub fn canonical_string(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => {
                // Fraction-free floats render as integers so 7.0 keys as "7"
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{}", *f as i64)
                } else {
                    format!("{}", f)
                }
            }
            FieldValue::String(s) => s.clone(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            FieldValue::Null => String::new(),
        }
    }

    /// Human-oriented type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "Integer",
            FieldValue::Float(_) => "Float",
            FieldValue::String(_) => "String",
            FieldValue::Boolean(_) => "Boolean",
            FieldValue::Timestamp(_) => "Timestamp",
            FieldValue::Null => "Null",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Timestamp(t) => write!(f, "{}", t),
        }
    }
}

/// Serialize as the natural JSON scalar; timestamps as formatted strings.
impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Timestamp(t) => {
                serializer.serialize_str(&t.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            }
            FieldValue::Null => serializer.serialize_none(),
        }
    }
}

/// One unit of data flowing through the pipeline.
///
/// A row is a mutable mapping from canonical field name to [`FieldValue`].
/// Field names are unique within a row and insertion order is preserved, so
/// a sink sees columns in the order the source (and any enriching
/// processors) produced them.
///
/// Processors may add fields or overwrite existing values; they never
/// silently drop unrelated fields.
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::row::{FieldValue, Row};
///
/// let mut row = Row::new();
/// row.set("customer_id", FieldValue::Integer(7));
/// row.set("customer_name", FieldValue::String("Acme".to_string()));
///
/// assert_eq!(row.get("customer_id"), Some(&FieldValue::Integer(7)));
/// assert_eq!(row.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    // Vec-backed so field order survives the trip through the pipeline.
    // Rows are narrow (tens of fields), linear probing is fine.
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create a row from an ordered list of field/value pairs.
    ///
    /// Later duplicates overwrite earlier ones, keeping the original
    /// position, so uniqueness of field names holds by construction.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let mut row = Row::new();
        for (name, value) in pairs {
            row.set(name, value);
        }
        row
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Set a field value, overwriting any existing value for the name.
    ///
    /// New fields append at the end; existing fields keep their position.
    pub fn set<K: Into<String>>(&mut self, name: K, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Whether the row has a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Render the row as a JSON object string for diagnostics and error
    /// snapshots. Field order is preserved.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_set_preserves_order_and_uniqueness() {
        let mut row = Row::new();
        row.set("a", FieldValue::Integer(1));
        row.set("b", FieldValue::Integer(2));
        row.set("a", FieldValue::Integer(3));

        assert_eq!(row.len(), 2);
        let names: Vec<&str> = row.field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&FieldValue::Integer(3)));
    }

    #[test]
    fn test_is_blank() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::String("".to_string()).is_blank());
        assert!(FieldValue::String("   ".to_string()).is_blank());
        assert!(!FieldValue::String("x".to_string()).is_blank());
        assert!(!FieldValue::Integer(0).is_blank());
        assert!(!FieldValue::Boolean(false).is_blank());
    }

    #[test]
    fn test_canonical_string_across_representations() {
        assert_eq!(FieldValue::Integer(7).canonical_string(), "7");
        assert_eq!(FieldValue::Float(7.0).canonical_string(), "7");
        assert_eq!(
            FieldValue::String("7".to_string()).canonical_string(),
            "7"
        );
        assert_eq!(FieldValue::Float(7.5).canonical_string(), "7.5");
        assert_eq!(FieldValue::Null.canonical_string(), "");
    }

    #[test]
    fn test_snapshot_is_json() {
        let mut row = Row::new();
        row.set("id", FieldValue::Integer(7));
        row.set("name", FieldValue::String("Acme".to_string()));
        row.set(
            "seen_at",
            FieldValue::Timestamp(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(12, 30, 0)
                    .unwrap(),
            ),
        );
        row.set("missing", FieldValue::Null);

        let json: serde_json::Value = serde_json::from_str(&row.snapshot()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Acme");
        assert!(json["missing"].is_null());
    }
}

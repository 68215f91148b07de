//! String-to-timestamp field transform.

use crate::rowflow::error::{PipelineError, Result};
use crate::rowflow::row::{FieldValue, Row};
use crate::rowflow::transform::Transform;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats tried in order when no explicit format is configured.
const DEFAULT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
];

/// Parses a string field into a [`FieldValue::Timestamp`].
///
/// Null input produces null without invoking the parser. A value that is
/// already a timestamp passes through unchanged. Anything unparsable is
/// logged with the offending value and escalated as a fatal
/// [`PipelineError::Transform`].
///
/// # Examples
///
/// ```rust
/// use rowflow::rowflow::row::{FieldValue, Row};
/// use rowflow::rowflow::transform::{StringToTimestampTransform, Transform};
///
/// let transform = StringToTimestampTransform::new();
/// let row = Row::new();
/// let parsed = transform
///     .transform("seen_at", FieldValue::String("2024-03-01 12:30:00".to_string()), &row)
///     .unwrap();
/// assert!(matches!(parsed, FieldValue::Timestamp(_)));
///
/// // Null passes through untouched
/// let passed = transform.transform("seen_at", FieldValue::Null, &row).unwrap();
/// assert_eq!(passed, FieldValue::Null);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringToTimestampTransform {
    /// Explicit chrono format string; None tries the default format list
    format: Option<String>,
}

impl StringToTimestampTransform {
    /// Create a transform that auto-detects among common formats,
    /// RFC 3339 included.
    pub fn new() -> Self {
        Self { format: None }
    }

    /// Create a transform with an explicit chrono format string.
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
        }
    }

    fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        if let Some(format) = &self.format {
            return Self::parse_with(text, format);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_utc());
        }
        DEFAULT_FORMATS
            .iter()
            .find_map(|format| Self::parse_with(text, format))
    }

    fn parse_with(text: &str, format: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
        // Date-only formats need the midnight expansion
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

impl Transform for StringToTimestampTransform {
    fn transform(&self, name: &str, value: FieldValue, _row: &Row) -> Result<FieldValue> {
        match value {
            FieldValue::Null => Ok(FieldValue::Null),
            FieldValue::Timestamp(ts) => Ok(FieldValue::Timestamp(ts)),
            FieldValue::String(text) => match self.parse(&text) {
                Some(ts) => Ok(FieldValue::Timestamp(ts)),
                None => {
                    log::error!("Invalid time found in field '{}': {}", name, text);
                    Err(PipelineError::Transform {
                        field: name.to_string(),
                        value: text,
                        message: "unparsable timestamp".to_string(),
                    })
                }
            },
            other => {
                log::error!(
                    "Invalid time found in field '{}': non-string value {} ({})",
                    name,
                    other,
                    other.type_name()
                );
                Err(PipelineError::Transform {
                    field: name.to_string(),
                    value: other.to_string(),
                    message: format!("expected string or timestamp, got {}", other.type_name()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parses_common_formats() {
        let transform = StringToTimestampTransform::new();
        let row = Row::new();

        for text in [
            "2024-03-01 12:30:00",
            "2024-03-01T12:30:00",
            "2024-03-01T12:30:00Z",
        ] {
            let value = transform
                .transform("ts", FieldValue::String(text.to_string()), &row)
                .unwrap();
            match value {
                FieldValue::Timestamp(ts) => {
                    assert_eq!(ts.hour(), 12);
                    assert_eq!(ts.minute(), 30);
                }
                other => panic!("expected timestamp for '{}', got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_date_only_expands_to_midnight() {
        let transform = StringToTimestampTransform::new();
        let value = transform
            .transform("ts", FieldValue::String("2024-03-01".to_string()), &Row::new())
            .unwrap();
        match value {
            FieldValue::Timestamp(ts) => {
                assert_eq!(ts.day(), 1);
                assert_eq!(ts.hour(), 0);
            }
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_null_passthrough() {
        let transform = StringToTimestampTransform::new();
        let value = transform
            .transform("ts", FieldValue::Null, &Row::new())
            .unwrap();
        assert_eq!(value, FieldValue::Null);
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let transform = StringToTimestampTransform::new();
        let err = transform
            .transform("ts", FieldValue::String("not a time".to_string()), &Row::new())
            .unwrap_err();
        match err {
            PipelineError::Transform { field, value, .. } => {
                assert_eq!(field, "ts");
                assert_eq!(value, "not a time");
            }
            other => panic!("expected transform error, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_format() {
        let transform = StringToTimestampTransform::with_format("%d.%m.%Y %H:%M");
        let value = transform
            .transform(
                "ts",
                FieldValue::String("01.03.2024 09:15".to_string()),
                &Row::new(),
            )
            .unwrap();
        assert!(matches!(value, FieldValue::Timestamp(_)));
    }
}

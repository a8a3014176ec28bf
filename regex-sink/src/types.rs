use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Closed set of column types the sink knows how to bind.
/// Resolved once from the table catalog when the column plan is built,
/// never looked up again per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Double,
    Text,
    Boolean,
    Timestamp,
    Uuid,
}

/// A value ready to be bound at one positional placeholder.
/// `Null` carries the column type so the store can bind a typed NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null(SqlType),
    Integer(i64),
    Double(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

/// A raw captured string could not be interpreted as the column's type.
/// This is not a skip: by the time we coerce, the event already matched the
/// configured shape, so a bad value aborts the whole batch.
#[derive(Error, Debug, PartialEq)]
#[error("cannot interpret {value:?} as {target}")]
pub struct CoerceError {
    pub value: String,
    pub target: SqlType,
}

impl SqlType {
    /// Map an `information_schema.columns.data_type` name to a supported type.
    pub fn from_catalog(data_type: &str) -> Option<SqlType> {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" => {
                Some(SqlType::Integer)
            }
            "real" | "double precision" | "numeric" | "decimal" | "float4" | "float8" => {
                Some(SqlType::Double)
            }
            "text" | "character varying" | "character" | "varchar" | "char" => Some(SqlType::Text),
            "boolean" | "bool" => Some(SqlType::Boolean),
            "timestamp without time zone" | "timestamp with time zone" | "timestamp"
            | "timestamptz" => Some(SqlType::Timestamp),
            "uuid" => Some(SqlType::Uuid),
            _ => None,
        }
    }

    /// Coerce a raw captured string into a bindable value.
    /// Absent or empty input becomes a typed NULL; anything else must parse
    /// as the target type or the coercion fails.
    pub fn coerce(self, raw: Option<&str>) -> Result<SqlValue, CoerceError> {
        let raw = match raw {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(SqlValue::Null(self)),
        };

        let error = || CoerceError {
            value: raw.to_owned(),
            target: self,
        };

        match self {
            SqlType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| error()),
            SqlType::Double => raw
                .trim()
                .parse::<f64>()
                .map(SqlValue::Double)
                .map_err(|_| error()),
            SqlType::Text => Ok(SqlValue::Text(raw.to_owned())),
            SqlType::Boolean => parse_boolean(raw).map(SqlValue::Boolean).ok_or_else(error),
            SqlType::Timestamp => parse_timestamp(raw)
                .map(SqlValue::Timestamp)
                .ok_or_else(error),
            SqlType::Uuid => Uuid::parse_str(raw.trim())
                .map(SqlValue::Uuid)
                .map_err(|_| error()),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SqlType::Integer => write!(f, "integer"),
            SqlType::Double => write!(f, "double precision"),
            SqlType::Text => write!(f, "text"),
            SqlType::Boolean => write!(f, "boolean"),
            SqlType::Timestamp => write!(f, "timestamp"),
            SqlType::Uuid => write!(f, "uuid"),
        }
    }
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Accept RFC 3339, the plain `YYYY-MM-DD HH:MM:SS[.fff]` form (read as UTC),
/// or epoch milliseconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }

    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_catalog_maps_supported_types() {
        assert_eq!(SqlType::from_catalog("integer"), Some(SqlType::Integer));
        assert_eq!(SqlType::from_catalog("bigint"), Some(SqlType::Integer));
        assert_eq!(
            SqlType::from_catalog("character varying"),
            Some(SqlType::Text)
        );
        assert_eq!(
            SqlType::from_catalog("double precision"),
            Some(SqlType::Double)
        );
        assert_eq!(SqlType::from_catalog("boolean"), Some(SqlType::Boolean));
        assert_eq!(
            SqlType::from_catalog("timestamp with time zone"),
            Some(SqlType::Timestamp)
        );
        assert_eq!(SqlType::from_catalog("uuid"), Some(SqlType::Uuid));
        assert_eq!(SqlType::from_catalog("bytea"), None);
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(
            SqlType::Integer.coerce(Some("42")),
            Ok(SqlValue::Integer(42))
        );
        assert_eq!(
            SqlType::Integer.coerce(Some(" -7 ")),
            Ok(SqlValue::Integer(-7))
        );
        assert!(SqlType::Integer.coerce(Some("notanumber")).is_err());
    }

    #[test]
    fn test_coerce_absent_or_empty_is_null() {
        assert_eq!(
            SqlType::Integer.coerce(None),
            Ok(SqlValue::Null(SqlType::Integer))
        );
        assert_eq!(
            SqlType::Text.coerce(Some("")),
            Ok(SqlValue::Null(SqlType::Text))
        );
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            SqlType::Boolean.coerce(Some("TRUE")),
            Ok(SqlValue::Boolean(true))
        );
        assert_eq!(
            SqlType::Boolean.coerce(Some("0")),
            Ok(SqlValue::Boolean(false))
        );
        assert!(SqlType::Boolean.coerce(Some("yes")).is_err());
    }

    #[test]
    fn test_coerce_timestamp_formats() {
        assert!(matches!(
            SqlType::Timestamp.coerce(Some("2024-01-02T03:04:05Z")),
            Ok(SqlValue::Timestamp(_))
        ));
        assert!(matches!(
            SqlType::Timestamp.coerce(Some("2024-01-02 03:04:05.123")),
            Ok(SqlValue::Timestamp(_))
        ));
        assert!(matches!(
            SqlType::Timestamp.coerce(Some("1704164645000")),
            Ok(SqlValue::Timestamp(_))
        ));
        assert!(SqlType::Timestamp.coerce(Some("yesterday")).is_err());
    }

    #[test]
    fn test_coerce_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(
            SqlType::Uuid.coerce(Some(&id.to_string())),
            Ok(SqlValue::Uuid(id))
        );
        assert!(SqlType::Uuid.coerce(Some("not-a-uuid")).is_err());
    }

    #[test]
    fn test_coerce_error_names_value_and_target() {
        let error = SqlType::Integer.coerce(Some("abc")).unwrap_err();
        assert_eq!(error.to_string(), "cannot interpret \"abc\" as integer");
    }
}

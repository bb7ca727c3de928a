use crate::infra::Database;
use crate::module::error::AppError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed enumeration exchanged as a snake_case string on the wire and in
/// SQLite columns.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::module::common::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err($crate::module::common::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ::rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> ::rusqlite::Result<::rusqlite::types::ToSqlOutput<'_>> {
                Ok(::rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl ::rusqlite::types::FromSql for $name {
            fn column_result(
                value: ::rusqlite::types::ValueRef<'_>,
            ) -> ::rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| ::rusqlite::types::FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// Shared by policies, events and violations.
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityBreakdown {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub critical: i64,
}

impl SeverityBreakdown {
    pub fn add(&mut self, severity: Severity, count: i64) {
        match severity {
            Severity::Low => self.low += count,
            Severity::Medium => self.medium += count,
            Severity::High => self.high += count,
            Severity::Critical => self.critical += count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

pub fn lock_db(db: &Database) -> Result<MutexGuard<'_, Connection>, AppError> {
    db.lock()
        .map_err(|_| AppError::internal("DATABASE_LOCK_POISONED", "database lock poisoned"))
}

/// Table names come from the `infra` constants, never from request input.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, AppError> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

/// Resolves `skip`/`limit` query values into SQL `OFFSET`/`LIMIT`.
pub fn page_bounds(skip: Option<u32>, limit: Option<u32>) -> Result<(i64, i64), AppError> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit > MAX_PAGE_LIMIT {
        return Err(AppError::unprocessable(
            "INVALID_LIMIT",
            format!("limit must be between 0 and {MAX_PAGE_LIMIT}"),
        ));
    }
    Ok((i64::from(skip.unwrap_or(0)), i64::from(limit)))
}

pub fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::unprocessable(
            "MISSING_FIELD",
            format!("{field} is required"),
        ));
    }
    Ok(())
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

pub fn to_db_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_db_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Accepts RFC 3339 and offset-less ISO 8601 (`2024-05-01T10:00:00`), the
/// latter read as UTC.
pub fn parse_wire_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc()))
}

/// `#[serde(deserialize_with)]` adapter for optional timestamps in request bodies.
pub fn deserialize_wire_time_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|v| parse_wire_time(&v).map_err(serde::de::Error::custom))
        .transpose()
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`).
pub fn deserialize_nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn db_time(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_db_time(&raw).map_err(|e| time_conversion_error(row, column, e))
}

pub fn db_time_opt(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|v| parse_db_time(&v).map_err(|e| time_conversion_error(row, column, e)))
        .transpose()
}

pub fn db_json_opt(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|v| {
        serde_json::from_str(&v).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column_index(row, column), Type::Text, Box::new(e))
        })
    })
    .transpose()
}

pub fn json_to_db(value: Option<&serde_json::Value>) -> Result<Option<String>, AppError> {
    value
        .map(|v| {
            serde_json::to_string(v)
                .map_err(|e| AppError::internal("JSON_ENCODE_ERROR", e.to_string()))
        })
        .transpose()
}

fn time_conversion_error(row: &Row<'_>, column: &str, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column_index(row, column), Type::Text, Box::new(err))
}

fn column_index(row: &Row<'_>, column: &str) -> usize {
    row.as_ref().column_index(column).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_round_trips_through_its_wire_value() {
        for severity in Severity::ALL {
            let parsed: Severity = severity.as_str().parse().expect("known value");
            assert_eq!(&parsed, severity);
        }
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn db_time_orders_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert!(to_db_time(&earlier) < to_db_time(&later));
        assert_eq!(parse_db_time(&to_db_time(&later)).expect("parse"), later);
    }

    #[test]
    fn wire_time_reads_offsetless_values_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_wire_time("2024-05-01T10:00:00").expect("naive"), expected);
        assert_eq!(parse_wire_time("2024-05-01 10:00:00").expect("space"), expected);
        assert_eq!(parse_wire_time("2024-05-01T12:00:00+02:00").expect("offset"), expected);
        assert_eq!(
            parse_wire_time("2024-05-01T10:00:00.250000").expect("fraction"),
            expected + chrono::Duration::milliseconds(250)
        );
        assert!(parse_wire_time("yesterday").is_err());
    }

    #[test]
    fn limit_above_maximum_is_rejected() {
        assert!(page_bounds(None, Some(MAX_PAGE_LIMIT + 1)).is_err());
        assert_eq!(page_bounds(Some(10), Some(5)).expect("bounds"), (10, 5));
        assert_eq!(page_bounds(None, None).expect("bounds"), (0, 100));
    }
}

//! Literal formatting for filter values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::sql::quote_string_single;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Format a condition value as a SQL literal.
///
/// Integers pass through unquoted. GUID-shaped and date-parseable strings
/// are single-quoted as-is. Everything else is single-quoted with embedded
/// quotes doubled.
pub fn format_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_integer(trimmed) {
        return trimmed.to_string();
    }
    if looks_like_guid(trimmed) || is_date_like(trimmed) {
        return format!("'{}'", trimmed);
    }
    quote_string_single(raw)
}

/// Quote a LIKE pattern with optional wildcard prefix/suffix.
pub fn format_like(raw: &str, prefix: &str, suffix: &str) -> String {
    quote_string_single(&format!("{}{}{}", prefix, raw, suffix))
}

fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.parse::<i64>().is_ok()
}

/// `8-4-4-4-12` hex, optionally wrapped in braces.
pub fn looks_like_guid(value: &str) -> bool {
    let inner = value
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .unwrap_or(value);
    let b = inner.as_bytes();
    if b.len() != 36 {
        return false;
    }
    b.iter().enumerate().all(|(idx, &c)| {
        if matches!(idx, 8 | 13 | 18 | 23) {
            c == b'-'
        } else {
            c.is_ascii_hexdigit()
        }
    })
}

/// Dates and timestamps in ISO-style layouts.
pub fn is_date_like(value: &str) -> bool {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return true;
    }
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return true;
    }
    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

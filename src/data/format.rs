//! Display formatting for API values
//!
//! Missing values render as `--`. Speeds and averages also render as `--`
//! when they are exactly zero, since the backend reports an empty window as 0.

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Placeholder for values the backend did not provide
pub const PLACEHOLDER: &str = "--";

/// Parses an ISO 8601 timestamp, treating a missing offset as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp in local time, or `--` when absent
///
/// Unparseable values are shown as sent.
pub fn format_date_time(value: Option<&str>) -> String {
    match value {
        None => PLACEHOLDER.to_string(),
        Some(raw) if raw.trim().is_empty() => PLACEHOLDER.to_string(),
        Some(raw) => match parse_timestamp(raw) {
            Some(dt) => dt
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => raw.to_string(),
        },
    }
}

/// Shows a value or `--`
pub fn or_placeholder<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Formats a number with fixed decimals, `--` when missing or zero
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => format!("{:.*}", decimals, v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats a speed as "42.5 km/h", `--` when missing or zero
pub fn format_speed(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => format!("{:.1} km/h", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Formats a 0..1 ratio as a whole percentage, `--` only when missing
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}%", (v * 100.0).round() as i64),
        _ => PLACEHOLDER.to_string(),
    }
}

//! Date and time formatting for list views.

use chrono::{
    DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, TimeZone, Utc,
};

use crate::error::AdminError;

/// Timestamp the backend uses for "no value".
pub const ZERO_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

const NOT_SET: &str = "Not set";

/// Parses a backend timestamp. Empty and zero timestamps yield `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == ZERO_TIMESTAMP {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `Mon D, YYYY` in local time, or "Not set".
pub fn format_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.with_timezone(&Local).format("%b %-d, %Y").to_string(),
        None if is_unset(raw) => NOT_SET.to_string(),
        None => raw.trim().to_string(),
    }
}

/// "Today", "Yesterday" or `Mon D, YYYY`, relative to `now`.
pub fn format_day<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> String {
    let Some(ts) = parse_timestamp(raw) else {
        return if is_unset(raw) {
            NOT_SET.to_string()
        } else {
            raw.trim().to_string()
        };
    };

    let day = ts.with_timezone(&now.timezone()).date_naive();
    let today = now.date_naive();
    if day == today {
        "Today".to_string()
    } else if today.checked_sub_signed(TimeDelta::days(1)) == Some(day) {
        "Yesterday".to_string()
    } else {
        day.format("%b %-d, %Y").to_string()
    }
}

/// `H:MM AM` in the timezone of `now`; empty when unset.
pub fn format_time<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    parse_timestamp(raw)
        .map(|ts| ts.with_timezone(&now.timezone()).format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

/// Returns true if the timestamp falls on the same calendar day as `now`.
pub fn is_same_day<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> bool {
    parse_timestamp(raw)
        .is_some_and(|ts| ts.with_timezone(&now.timezone()).date_naive() == now.date_naive())
}

fn is_unset(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == ZERO_TIMESTAMP
}

/// Parses a user-entered date/time and returns it as an RFC 3339 UTC string.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` (local time) and
/// `YYYY-MM-DD` (local midnight).
///
/// # Errors
/// `Validation` when the input matches none of these forms.
pub fn parse_datetime_input(raw: &str) -> Result<String, AdminError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(to_backend(dt.with_timezone(&Utc)));
    }

    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            AdminError::validation(format!(
                "Invalid date '{raw}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM"
            ))
        })?;

    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| AdminError::validation(format!("Invalid local time '{raw}'")))?;
    Ok(to_backend(local.with_timezone(&Utc)))
}

fn to_backend(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! Relative duration and absolute timestamp parsing for `--since` / `--to`.
//!
//! The relative grammar is an extended Go duration: one or more `<number><unit>` pairs with
//! no separators (`100000s`, `2h30m`, `1.5d`), optionally signed. Units:
//!
//! | unit | size |
//! |---|---|
//! | `ns` | nanosecond |
//! | `us`, `µs`, `μs` | microsecond |
//! | `ms` | millisecond |
//! | `s`, `m`, `h` | second, minute, hour |
//! | `d`, `w` | day, week |
//! | `mm` | month (30 days) |
//! | `y` | year (365 days) |
//!
//! An unsigned or `+` duration means "that long ago"; a `-` duration points ahead of now.
//! When the grammar does not match, `YYYY-MM-DD/HH:MM:SS` is accepted as a local time.

use crate::error::{CwtailError, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

const NANOSECOND: f64 = 1.0;
const MICROSECOND: f64 = 1_000.0 * NANOSECOND;
const MILLISECOND: f64 = 1_000.0 * MICROSECOND;
const SECOND: f64 = 1_000.0 * MILLISECOND;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;
const MONTH: f64 = 30.0 * DAY;
const YEAR: f64 = 365.0 * DAY;

/// Literal format accepted when the duration grammar fails
pub const ABSOLUTE_FORMAT: &str = "%Y-%m-%d/%H:%M:%S";

fn pair_pattern(text: &str) -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"([0-9.]+)([a-zµμ]+)"))
        .as_ref()
        .map_err(|e| CwtailError::invalid_duration(text, format!("duration grammar: {e}")))
}

fn unit_size(unit: &str) -> Option<f64> {
    let size = match unit {
        "ns" => NANOSECOND,
        "us" | "µs" | "μs" => MICROSECOND,
        "ms" => MILLISECOND,
        "s" => SECOND,
        "m" => MINUTE,
        "h" => HOUR,
        "d" => DAY,
        "w" => WEEK,
        "mm" => MONTH,
        "y" => YEAR,
        _ => return None,
    };
    Some(size)
}

/// Parse a signed relative duration. Positive results mean "ago".
pub fn parse_duration(text: &str) -> Result<Duration> {
    if matches!(text, "0" | "+0" | "-0") {
        return Ok(Duration::zero());
    }

    let (sign, body) = match text.as_bytes().first() {
        Some(b'-') => (-1.0, &text[1..]),
        Some(b'+') => (1.0, &text[1..]),
        _ => (1.0, text),
    };

    let mut total_ns = 0.0;
    let mut cursor = 0;
    for caps in pair_pattern(text)?.captures_iter(body) {
        let (Some(whole), Some(value), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        // Pairs must be contiguous: anything between them is not part of the grammar.
        if whole.start() != cursor {
            return Err(CwtailError::invalid_duration(
                text,
                format!("unexpected '{}'", &body[cursor..whole.start()]),
            ));
        }
        cursor = whole.end();

        let size = unit_size(unit.as_str()).ok_or_else(|| {
            CwtailError::invalid_duration(text, format!("unknown unit '{}'", unit.as_str()))
        })?;
        let value: f64 = value.as_str().parse().map_err(|_| {
            CwtailError::invalid_duration(text, format!("invalid value '{}'", value.as_str()))
        })?;
        total_ns += value * size;
    }

    if cursor == 0 {
        return Err(CwtailError::invalid_duration(text, "no duration found"));
    }
    if cursor != body.len() {
        return Err(CwtailError::invalid_duration(
            text,
            format!("unexpected '{}'", &body[cursor..]),
        ));
    }

    let micros = sign * total_ns / MICROSECOND;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(CwtailError::invalid_duration(text, "duration out of range"));
    }
    Ok(Duration::microseconds(micros as i64))
}

/// Parse `YYYY-MM-DD/HH:MM:SS` as a local wall-clock time.
pub fn parse_absolute(text: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, ABSOLUTE_FORMAT)
        .map_err(|e| CwtailError::invalid_duration(text, e.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CwtailError::invalid_duration(text, "local time does not exist"))
}

/// Resolve `text` to an absolute instant relative to `now`, truncated to whole seconds.
pub fn parse_at(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let relative_err = match parse_duration(text) {
        Ok(delta) => {
            let point = now.checked_sub_signed(delta).ok_or_else(|| {
                CwtailError::invalid_duration(text, "resulting time out of range")
            })?;
            return truncate_to_seconds(point, text);
        }
        Err(e) => e,
    };

    match parse_absolute(text) {
        Ok(point) => Ok(point),
        Err(_) => Err(relative_err),
    }
}

/// Resolve `text` against the current UTC instant.
pub fn parse(text: &str) -> Result<DateTime<Utc>> {
    parse_at(text, Utc::now())
}

/// Milliseconds since the epoch, the unit the backend speaks.
pub fn to_epoch_millis(point: DateTime<Utc>) -> i64 {
    point.timestamp_millis()
}

fn truncate_to_seconds(point: DateTime<Utc>, text: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(point.timestamp(), 0)
        .ok_or_else(|| CwtailError::invalid_duration(text, "resulting time out of range"))
}

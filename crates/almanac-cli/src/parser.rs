use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;

/// Parses `YYYY-MM-DD` or an English expression such as "tomorrow" or
/// "next friday", relative to `now`.
pub fn parse_date(input: &str, now: DateTime<Tz>) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(trimmed, now, Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

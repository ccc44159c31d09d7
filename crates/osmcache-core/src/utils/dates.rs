use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};

/// OSM's placeholder for "no date".
const EMPTY_DATE: &str = "0000-00-00";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `YYYY-MM-DD` date. Empty strings and `0000-00-00` are absent;
/// anything else that does not parse is an error.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() || value == EMPTY_DATE {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .with_context(|| format!("Invalid date: {:?}", value))
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp, with the same absence rules as
/// [`parse_date`].
pub fn parse_date_time(value: &str) -> Result<Option<NaiveDateTime>> {
    let value = value.trim();
    if value.is_empty() || value.starts_with(EMPTY_DATE) {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map(Some)
        .with_context(|| format!("Invalid timestamp: {:?}", value))
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

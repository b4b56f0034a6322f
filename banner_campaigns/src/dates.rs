//! Calendar helpers and the text formats used at the storage boundary.
//!
//! What this module provides:
//! - [`format_date`] / [`parse_date`]: `dd.MM.yyyy` (e.g. `"05.01.2024"`).
//! - [`format_datetime`] / [`parse_datetime`]: `dd.MM.yyyy hh:mm` with a
//!   24-hour clock (e.g. `"05.01.2024 17:45"`).
//! - [`today_in`]: the current calendar date in an IANA time zone. Only the
//!   binary calls it; the library takes the reference date as a parameter.
//! - [`days_inclusive`]: every date in a closed range, ascending.
//!
//! Notes:
//! - Seconds are not stored; [`format_datetime`] drops them and
//!   [`truncate_to_minute`] applies the same cut to in-memory values.
//! - Storage text is the only place these formats appear. Everything else
//!   works with [`NaiveDate`] / [`NaiveDateTime`].

use chrono::{NaiveDate, NaiveDateTime, ParseResult, Timelike, Utc};
use chrono_tz::Tz;

/// `dd.MM.yyyy` as a chrono format string.
pub const DATE_FORMAT: &str = "%d.%m.%Y";
/// `dd.MM.yyyy hh:mm` as a chrono format string.
pub const DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Render a date as `dd.MM.yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse `dd.MM.yyyy`.
pub fn parse_date(s: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
}

/// Render a timestamp as `dd.MM.yyyy hh:mm`.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse `dd.MM.yyyy hh:mm`.
pub fn parse_datetime(s: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
}

/// Drop seconds and sub-second parts, the precision kept by storage.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(dt)
}

/// Current calendar date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// `start..=end`, one day at a time. Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

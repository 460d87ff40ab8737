//! Service-day time handling.
//!
//! Trip times are stored as seconds since the service day's midnight. They may
//! exceed 24 hours for trips that run past midnight, so they are not
//! `NaiveTime`s. A `FlexServiceDate` ties a service day to the search's
//! start-of-time instant, converting trip-relative seconds into seconds since
//! start-of-time.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

/// Seconds in one service day.
pub const SECONDS_PER_DAY: i32 = 24 * 60 * 60;

/// Error returned when parsing an invalid service time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse a service time in `H:MM:SS` or `HH:MM:SS` form into seconds since
/// the service day's midnight.
///
/// Hours may be 24 or more for service that runs after midnight.
///
/// # Examples
///
/// ```
/// use flex_router::domain::parse_service_time;
///
/// assert_eq!(parse_service_time("08:30:00").unwrap(), 30_600);
/// assert_eq!(parse_service_time("7:05:09").unwrap(), 25_509);
/// assert_eq!(parse_service_time("25:10:00").unwrap(), 90_600);
///
/// assert!(parse_service_time("08:30").is_err());
/// assert!(parse_service_time("08:60:00").is_err());
/// ```
pub fn parse_service_time(s: &str) -> Result<i32, TimeError> {
    let mut parts = s.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TimeError::new("expected HH:MM:SS format"));
    };

    if h.is_empty() || h.len() > 3 || !h.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::new("invalid hour digits"));
    }
    let hours: i32 = h
        .parse()
        .map_err(|_| TimeError::new("invalid hour digits"))?;

    let minutes =
        parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minutes > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }

    let seconds =
        parse_two_digits(sec.as_bytes()).ok_or_else(|| TimeError::new("invalid second digits"))?;
    if seconds > 59 {
        return Err(TimeError::new("second must be 0-59"));
    }

    Ok(hours * 3600 + minutes as i32 * 60 + seconds as i32)
}

/// Format seconds since service-day midnight as `HH:MM:SS`.
///
/// Negative values are prefixed with `-`.
pub fn format_service_time(seconds: i32) -> String {
    ServiceTime(seconds).to_string()
}

/// Display adapter for service-day seconds.
struct ServiceTime(i32);

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{:02}:{:02}:{:02}",
            abs / 3600,
            (abs / 60) % 60,
            abs % 60
        )
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// A service day as seen from one search.
///
/// The search measures time in seconds since its `start_of_time` instant.
/// A trip running on `service_date` reports times relative to that day's
/// midnight, so `seconds_from_start_of_time` is added to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlexServiceDate {
    service_date: NaiveDate,
    seconds_from_start_of_time: i32,
}

impl FlexServiceDate {
    /// Create a service date for a search starting at `start_of_time`.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_router::domain::FlexServiceDate;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let start = day.and_hms_opt(0, 0, 0).unwrap();
    ///
    /// let today = FlexServiceDate::new(day, start);
    /// assert_eq!(today.seconds_from_start_of_time(), 0);
    ///
    /// let tomorrow = FlexServiceDate::new(day.succ_opt().unwrap(), start);
    /// assert_eq!(tomorrow.seconds_from_start_of_time(), 86_400);
    /// ```
    pub fn new(service_date: NaiveDate, start_of_time: NaiveDateTime) -> Self {
        let midnight = service_date.and_time(chrono::NaiveTime::MIN);
        let seconds = midnight
            .signed_duration_since(start_of_time)
            .num_seconds()
            .clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        Self {
            service_date,
            seconds_from_start_of_time: seconds,
        }
    }

    /// Returns the service date.
    pub fn service_date(&self) -> NaiveDate {
        self.service_date
    }

    /// Returns the offset of this day's midnight from the search's start-of-time.
    pub fn seconds_from_start_of_time(&self) -> i32 {
        self.seconds_from_start_of_time
    }

    /// Convert trip-relative seconds into seconds since start-of-time.
    pub fn to_search_time(&self, trip_seconds: i32) -> i32 {
        trip_seconds.saturating_add(self.seconds_from_start_of_time)
    }
}

/// Returns the instant `seconds` after `start_of_time`.
pub fn instant_at(start_of_time: NaiveDateTime, seconds: i32) -> NaiveDateTime {
    start_of_time + Duration::seconds(seconds as i64)
}

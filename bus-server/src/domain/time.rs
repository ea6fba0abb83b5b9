//! Scheduled-time projection.
//!
//! Timetables carry times as "HH:MM" strings in the operator's local
//! timezone, plus a midnight flag for services that run past 24:00. This
//! module converts those into absolute future timestamps without needing an
//! explicit service-day calendar: anchor to today, roll forward for the
//! midnight flag, and roll forward again if the result is already in the
//! past.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Marker character in status/remark text indicating the last run of the day.
pub const LAST_RUN_MARKER: char = '終';

/// The operator's local timezone (JST, no DST).
pub fn operator_tz() -> FixedOffset {
    // 9 hours is always a valid offset
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Parse a "H:MM" / "HH:MM" time-of-day string.
///
/// Returns `None` for anything else, including out-of-range components;
/// malformed timetable rows are skipped individually rather than failing the
/// batch.
pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let (hh, mm) = s.split_once(':')?;
    if hh.is_empty() || hh.len() > 2 || mm.len() != 2 {
        return None;
    }
    if !hh.bytes().all(|b| b.is_ascii_digit()) || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = hh.parse().ok()?;
    let minute: u32 = mm.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Project a scheduled "HH:MM" time onto an absolute timestamp.
///
/// The time is anchored to `now`'s calendar day; the midnight flag advances
/// one day (a "24:10"-style run published under the previous service day);
/// and a result already in the past advances one more day. The projected
/// timestamp is therefore always `>= now`, modulo the exact-now case.
pub fn project_time(
    time_str: &str,
    is_midnight: bool,
    now: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let time = parse_hhmm(time_str)?;
    let naive = now.date_naive().and_time(time);
    let mut projected = now.timezone().from_local_datetime(&naive).single()?;
    if is_midnight {
        projected = projected + Duration::days(1);
    }
    if projected < now {
        projected = projected + Duration::days(1);
    }
    Some(projected)
}

/// Format a timestamp as "HH:MM" in its own timezone.
pub fn format_hhmm(dt: DateTime<FixedOffset>) -> String {
    dt.format("%H:%M").to_string()
}

/// The service day (operator-local calendar date) an epoch falls on.
///
/// Used to decide "last departure of the day"; independent of the
/// midnight-rollover scheduling convention.
pub fn service_day(epoch_ms: i64) -> Option<NaiveDate> {
    let utc: DateTime<Utc> = DateTime::from_timestamp_millis(epoch_ms)?;
    Some(utc.with_timezone(&operator_tz()).date_naive())
}

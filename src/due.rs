// Due date input parsing and human-friendly display

use crate::error::{Result, TaskError};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse a user-supplied deadline, interpreting local times in `tz`
///
/// A bare date means 23:59 on that day. A local time skipped by a DST jump
/// is rejected; a repeated one resolves to the earlier instant.
pub fn parse_due<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || TaskError::InvalidDue(input.to_string());

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(23, 59, 0))
        })
        .ok_or_else(invalid)?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(invalid()),
    }
}

/// Render a deadline relative to `now`, in `now`'s timezone
///
/// `Today, 09:30 AM`, `Tomorrow, 09:30 AM`, or `Oct 20, 2026, 09:30 AM`.
pub fn format_due<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = due.with_timezone(&now.timezone());
    let time = local.format("%I:%M %p");
    let today = now.date_naive();

    if local.date_naive() == today {
        format!("Today, {}", time)
    } else if Some(local.date_naive()) == today.checked_add_signed(Duration::days(1)) {
        format!("Tomorrow, {}", time)
    } else {
        local.format("%b %-d, %Y, %I:%M %p").to_string()
    }
}

/// Long-form date shown above the task list, e.g. `Thursday, October 15, 2026`
pub fn format_header<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%A, %B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parse_due_formats() {
        assert_eq!(parse_due("2026-10-20T09:30", &Utc).unwrap(), utc(2026, 10, 20, 9, 30));
        assert_eq!(parse_due("2026-10-20 09:30", &Utc).unwrap(), utc(2026, 10, 20, 9, 30));
        assert_eq!(parse_due("2026-10-20T09:30:00", &Utc).unwrap(), utc(2026, 10, 20, 9, 30));
        assert_eq!(parse_due(" 2026-10-20 ", &Utc).unwrap(), utc(2026, 10, 20, 23, 59));
        assert_eq!(parse_due("2026-10-20T09:30:00+02:00", &Utc).unwrap(), utc(2026, 10, 20, 7, 30));
        assert_eq!(parse_due("2026-10-20T09:30:00Z", &Utc).unwrap(), utc(2026, 10, 20, 9, 30));
    }

    #[test]
    fn test_parse_due_uses_timezone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(parse_due("2026-10-20T09:30", &tz).unwrap(), utc(2026, 10, 20, 14, 30));
    }

    #[test]
    fn test_parse_due_invalid() {
        for input in ["", "tomorrow", "2026-13-01", "2026-10-20T25:00", "20/10/2026"] {
            match parse_due(input, &Utc) {
                Err(TaskError::InvalidDue(got)) => assert_eq!(got, input.trim()),
                other => panic!("expected InvalidDue for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_format_due_relative() {
        let now = utc(2026, 10, 15, 8, 0);
        assert_eq!(format_due(&utc(2026, 10, 15, 9, 30), &now), "Today, 09:30 AM");
        assert_eq!(format_due(&utc(2026, 10, 15, 0, 5), &now), "Today, 12:05 AM");
        assert_eq!(format_due(&utc(2026, 10, 16, 17, 45), &now), "Tomorrow, 05:45 PM");
        assert_eq!(format_due(&utc(2026, 10, 20, 9, 30), &now), "Oct 20, 2026, 09:30 AM");
        assert_eq!(format_due(&utc(2026, 10, 14, 21, 0), &now), "Oct 14, 2026, 09:00 PM");
    }

    #[test]
    fn test_format_due_in_local_zone() {
        // 23:30 UTC on the 15th is already the 16th at UTC+2
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = utc(2026, 10, 15, 8, 0).with_timezone(&tz);
        assert_eq!(format_due(&utc(2026, 10, 15, 23, 30), &now), "Tomorrow, 01:30 AM");
    }

    #[test]
    fn test_format_header() {
        assert_eq!(format_header(&utc(2026, 10, 15, 8, 0)), "Thursday, October 15, 2026");
        assert_eq!(format_header(&utc(2026, 1, 1, 0, 0)), "Thursday, January 1, 2026");
    }
}

//! Human-readable track time formatting
//!
//! Two display styles are used for playlist entries:
//! - `format_track_time`: `mm:ss`, switching to `H:mm:ss` once an hour is reached
//! - `format_minutes_seconds`: always `MM:SS`, minutes unbounded

const SECONDS_PER_HOUR: u32 = 3600;
const SECONDS_PER_MINUTE: u32 = 60;

/// Format seconds as `mm:ss`, or `H:mm:ss` for an hour or more.
///
/// # Examples
///
/// ```
/// use amp_common::human_time::format_track_time;
///
/// assert_eq!(format_track_time(0), "00:00");
/// assert_eq!(format_track_time(245), "04:05");
/// assert_eq!(format_track_time(3661), "1:01:01");
/// ```
pub fn format_track_time(seconds: u32) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Format seconds as `MM:SS` without an hour component.
///
/// ```
/// use amp_common::human_time::format_minutes_seconds;
///
/// assert_eq!(format_minutes_seconds(59), "00:59");
/// assert_eq!(format_minutes_seconds(3725), "62:05");
/// ```
pub fn format_minutes_seconds(seconds: u32) -> String {
    let minutes = seconds / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;
    format!("{:02}:{:02}", minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_time_below_an_hour() {
        assert_eq!(format_track_time(5), "00:05");
        assert_eq!(format_track_time(60), "01:00");
        assert_eq!(format_track_time(3599), "59:59");
    }

    #[test]
    fn test_track_time_hours() {
        assert_eq!(format_track_time(3600), "1:00:00");
        assert_eq!(format_track_time(7325), "2:02:05");
    }

    #[test]
    fn test_minutes_seconds_never_shows_hours() {
        assert_eq!(format_minutes_seconds(0), "00:00");
        assert_eq!(format_minutes_seconds(3600), "60:00");
    }
}

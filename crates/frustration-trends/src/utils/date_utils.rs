use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parse a review or release timestamp.
///
/// Accepts RFC 3339 (offsets are converted to UTC and dropped), common
/// `YYYY-MM-DD HH:MM:SS` variants, and plain dates which anchor to midnight.
/// Returns `None` when nothing matches.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Format a timestamp the way checkpoints store it
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// First day of the week containing `date`, for weeks beginning on `week_start`
pub fn week_start_date(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - Duration::days(offset as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_supported_formats() {
        let midnight = ymd(2023, 2, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-02-01"), Some(midnight));
        assert_eq!(parse_timestamp("02/01/2023"), Some(midnight));
        assert_eq!(
            parse_timestamp("2023-02-01 13:45:10"),
            ymd(2023, 2, 1).and_hms_opt(13, 45, 10)
        );
        assert_eq!(
            parse_timestamp("2023-02-01T13:45:10+02:00"),
            ymd(2023, 2, 1).and_hms_opt(11, 45, 10)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2023-13-45"), None);
    }

    #[test]
    fn test_format_round_trips() {
        let ts = ymd(2024, 6, 9).and_hms_opt(8, 0, 5).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)), Some(ts));
    }

    #[test]
    fn test_week_start_monday() {
        // 2023-01-02 is a Monday
        assert_eq!(week_start_date(ymd(2023, 1, 2), Weekday::Mon), ymd(2023, 1, 2));
        assert_eq!(week_start_date(ymd(2023, 1, 8), Weekday::Mon), ymd(2023, 1, 2));
        assert_eq!(week_start_date(ymd(2023, 1, 9), Weekday::Mon), ymd(2023, 1, 9));
    }

    #[test]
    fn test_week_start_sunday() {
        assert_eq!(week_start_date(ymd(2023, 1, 2), Weekday::Sun), ymd(2023, 1, 1));
        assert_eq!(week_start_date(ymd(2023, 1, 7), Weekday::Sun), ymd(2023, 1, 1));
        assert_eq!(week_start_date(ymd(2023, 1, 8), Weekday::Sun), ymd(2023, 1, 8));
    }
}

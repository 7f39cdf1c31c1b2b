//! Parsers for the date-string formats the campus systems emit.
//!
//! Anthology OData timestamps arrive in several shapes: with or without a
//! fractional-seconds block, with or without a UTC offset (both `-0500` and
//! `-05:00` appear), occasionally with more fractional digits than a
//! timestamp can carry, and sometimes without a seconds component at all.
//! These helpers try the variants in order and log unparseable strings
//! instead of failing the surrounding extraction.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Returns the datetime that corresponds to a date string from Anthology.
///
/// Accepted shapes: `%Y-%m-%dT%H:%M:%S%.f%z`, `%Y-%m-%dT%H:%M:%S%z`,
/// `%Y-%m-%dT%H:%M:%S%.f`, `%Y-%m-%dT%H:%M:%S`, or `%Y-%m-%dT%H:%M`.
/// Example of an accepted string: `2022-09-10T12:30:00-0500`.
///
/// Offset-less strings are taken as UTC. Unrecognized input is reported on
/// stderr and yields `None`.
pub fn parse_anthology_datetime(date_string: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_str(date_string, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed);
    }

    // Some records carry more fractional digits than a timestamp can hold;
    // retry with the fraction cut down to nanosecond precision.
    if let Some(repaired) = truncate_long_fraction(date_string) {
        if let Ok(parsed) = DateTime::parse_from_str(&repaired, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(parsed);
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date_string, format) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    eprintln!(
        "ValueError: '{}' format not recognized. Use '%Y-%m-%dT%H:%M:%S%z', '%Y-%m-%dT%H:%M:%S', or '%Y-%m-%dT%H:%M'",
        date_string
    );
    None
}

/// Returns the date component of an Anthology date string, or `None` when
/// the string cannot be parsed.
pub fn parse_anthology_date(date_string: &str) -> Option<NaiveDate> {
    parse_anthology_datetime(date_string).map(|parsed| parsed.date_naive())
}

/// Returns the time component of an Anthology date string, or `None` when
/// the string cannot be parsed.
pub fn parse_anthology_time(date_string: &str) -> Option<NaiveTime> {
    parse_anthology_datetime(date_string).map(|parsed| parsed.time())
}

/// Parses a date string from Slate, e.g. `2023/01/05`.
pub fn parse_slate_date(date_str: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(date_str, "%Y/%m/%d") {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            eprintln!("ValueError: '{}' format not recognized. Use '%Y/%m/%d'", date_str);
            None
        }
    }
}

/// Parses a date string returned by the Anthology API `GET` command, e.g.
/// `2023/01/01 00:00:00`.
pub fn parse_anthology_get_datetime(date_str: &str) -> Option<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(date_str, "%Y/%m/%d %H:%M:%S") {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            eprintln!(
                "ValueError: '{}' format not recognized. Use '%Y/%m/%d %H:%M:%S'",
                date_str
            );
            None
        }
    }
}

/// Cuts a fractional-seconds block longer than nine digits down to nine, so
/// the timestamp parser can accept it. Returns `None` when no repair is
/// needed.
fn truncate_long_fraction(date_string: &str) -> Option<String> {
    let dot = date_string.find('.')?;
    let digits = date_string[dot + 1..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits <= 9 {
        return None;
    }
    Some(format!(
        "{}{}{}",
        &date_string[..dot],
        &date_string[dot..dot + 10],
        &date_string[dot + 1 + digits..]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_offsets_with_and_without_colons() {
        let plain = parse_anthology_datetime("2022-09-10T12:30:00-0500").unwrap();
        let coloned = parse_anthology_datetime("2022-09-10T12:30:00-05:00").unwrap();
        assert_eq!(plain, coloned);
        assert_eq!(plain.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn parses_fractional_seconds() {
        let parsed = parse_anthology_datetime("2022-09-10T12:30:00.123456-0500").unwrap();
        assert_eq!(parsed.nanosecond(), 123_456_000);
    }

    #[test]
    fn repairs_overlong_fractional_seconds() {
        let parsed = parse_anthology_datetime("2022-09-10T12:30:00.1234567891234+0000").unwrap();
        assert_eq!(parsed.nanosecond(), 123_456_789);
    }

    #[test]
    fn offsetless_strings_are_taken_as_utc() {
        let parsed = parse_anthology_datetime("2022-09-10T12:30:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        let minute_only = parse_anthology_datetime("2022-09-10T12:30").unwrap();
        assert_eq!(minute_only.minute(), 30);
    }

    #[test]
    fn unrecognized_strings_yield_none() {
        assert!(parse_anthology_datetime("10/09/2022").is_none());
        assert!(parse_anthology_date("nonsense").is_none());
        assert!(parse_anthology_time("nonsense").is_none());
    }

    #[test]
    fn date_and_time_components_split_out() {
        assert_eq!(
            parse_anthology_date("2022-09-10T12:30:00-0500"),
            NaiveDate::from_ymd_opt(2022, 9, 10)
        );
        assert_eq!(
            parse_anthology_time("2022-09-10T12:30:00-0500"),
            NaiveTime::from_hms_opt(12, 30, 0)
        );
    }

    #[test]
    fn slate_and_get_command_formats_parse() {
        assert_eq!(
            parse_slate_date("2023/01/05"),
            NaiveDate::from_ymd_opt(2023, 1, 5)
        );
        assert!(parse_slate_date("2023-01-05").is_none());
        assert!(parse_anthology_get_datetime("2023/01/01 00:00:00").is_some());
        assert!(parse_anthology_get_datetime("2023-01-01").is_none());
    }
}

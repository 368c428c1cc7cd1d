//! Date and number formats found in vendor payloads and headers.
//!
//! The declared format is authoritative: a value that does not match it is a
//! [`Error::Parse`], never a best-effort guess.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::{Error, Result};

const RFC1123: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Wire format of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// RFC 1123 HTTP date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
    Rfc1123,
    /// ISO 8601 / RFC 3339 with offset, e.g. `2024-03-01T12:00:00.000Z`.
    Iso8601,
    /// Whole seconds since the Unix epoch.
    EpochSeconds,
    /// Milliseconds since the Unix epoch.
    EpochMillis,
}

/// Parse `value` in the declared format.
///
/// # Errors
///
/// Returns [`Error::Parse`] if `value` does not match `format`.
///
/// # Example
///
/// ```
/// use cirrus_core::{DateFormat, parse_date};
///
/// let date = parse_date("Sun, 06 Nov 1994 08:49:37 GMT", DateFormat::Rfc1123).unwrap();
/// assert_eq!(date.timestamp(), 784_111_777);
/// ```
pub fn parse_date(value: &str, format: DateFormat) -> Result<DateTime<Utc>> {
    let value = value.trim();
    let invalid = |detail: String| {
        Error::parse("", format!("`{value}` is not a {format:?} date: {detail}"))
    };
    match format {
        DateFormat::Rfc1123 => NaiveDateTime::parse_from_str(value, RFC1123)
            .map(|date| date.and_utc())
            .map_err(|e| invalid(e.to_string())),
        DateFormat::Iso8601 => DateTime::parse_from_rfc3339(value)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|e| invalid(e.to_string())),
        DateFormat::EpochSeconds => {
            let seconds: i64 = parse_number(value)?;
            Utc.timestamp_opt(seconds, 0)
                .single()
                .ok_or_else(|| invalid("out of range".to_string()))
        }
        DateFormat::EpochMillis => {
            let millis: i64 = parse_number(value)?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| invalid("out of range".to_string()))
        }
    }
}

/// Render `date` in the declared format.
#[must_use]
pub fn format_date(date: &DateTime<Utc>, format: DateFormat) -> String {
    match format {
        DateFormat::Rfc1123 => date.format(RFC1123).to_string(),
        DateFormat::Iso8601 => date.to_rfc3339_opts(SecondsFormat::Millis, true),
        DateFormat::EpochSeconds => date.timestamp().to_string(),
        DateFormat::EpochMillis => date.timestamp_millis().to_string(),
    }
}

/// Parse a decimal number, rejecting surrounding garbage.
///
/// # Errors
///
/// Returns [`Error::Parse`] if `value` is not a valid `T`.
pub fn parse_number<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| Error::parse("", format!("`{value}` is not a number: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37)
            .single()
            .expect("valid date")
    }

    #[test]
    fn rfc1123_round_trip() {
        let text = format_date(&reference(), DateFormat::Rfc1123);
        assert_eq!(text, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_date(&text, DateFormat::Rfc1123).expect("parse"), reference());
    }

    #[test]
    fn rfc1123_rejects_other_mail_date_forms() {
        for text in [
            "06 Nov 1994 08:49:37 GMT",
            "Sun, 06 Nov 1994 08:49:37 +0000",
            "Sun, 06 Nov 1994 08:49:37 EST",
            "Mon, 06 Nov 1994 08:49:37 GMT",
        ] {
            let error = parse_date(text, DateFormat::Rfc1123).expect_err(text);
            assert_eq!(error.kind(), ErrorKind::Parse, "{text}");
        }
    }

    #[test]
    fn iso8601_with_millis_and_offset() {
        assert_eq!(
            format_date(&reference(), DateFormat::Iso8601),
            "1994-11-06T08:49:37.000Z"
        );
        let shifted = parse_date("1994-11-06T09:49:37+01:00", DateFormat::Iso8601).expect("parse");
        assert_eq!(shifted, reference());
    }

    #[test]
    fn epoch_formats() {
        assert_eq!(
            parse_date("784111777", DateFormat::EpochSeconds).expect("seconds"),
            reference()
        );
        assert_eq!(
            parse_date("784111777000", DateFormat::EpochMillis).expect("millis"),
            reference()
        );
    }

    #[test]
    fn declared_format_is_authoritative() {
        let err = parse_date("1994-11-06T08:49:37Z", DateFormat::Rfc1123).expect_err("mismatch");
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_date("Sun, 06 Nov 1994 08:49:37 GMT", DateFormat::Iso8601)
            .expect_err("mismatch");
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_date("yesterday", DateFormat::EpochSeconds).expect_err("not a number");
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number::<u64>(" 1024 ").expect("u64"), 1024);
        assert!((parse_number::<f64>("0.25").expect("f64") - 0.25).abs() < f64::EPSILON);
        let err = parse_number::<u32>("12abc").expect_err("garbage");
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}

//! Date and time handling for the `fromNow` function and the `$fromNow`
//! operator.
//!
//! Timestamps are ISO 8601 in UTC. Durations are one or more
//! `<signed integer><unit>` components, applied to the base time in the
//! order written, so calendar units interact with day clamping the way
//! they are spelled.

use crate::log::{Code, Error};
use chrono::{DateTime, Duration, Months, NaiveDateTime, TimeZone, Utc};

/// A unit within a duration component.
#[derive(Debug, PartialEq, Copy, Clone)]
pub(crate) enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

/// Parse an ISO 8601 timestamp.
///
/// Accepts RFC 3339 text, or a naive `YYYY-MM-DDTHH:MM:SS` form which is
/// read as UTC.
///
/// # Errors
///
/// Returns an [`Error`] when the text is not a recognizable timestamp.
pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(Error::new(
        Code::InvalidDateTime,
        format!("unparseable timestamp `{text}`"),
    ))
}

/// Format a timestamp as ISO 8601 UTC with millisecond precision.
pub(crate) fn format_timestamp(datetime: &DateTime<Utc>) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Offset the given base time by the duration described in `text`.
///
/// # Errors
///
/// Returns an [`Error`] when the duration is malformed, or the result
/// falls outside the representable range.
pub(crate) fn add_duration(base: DateTime<Utc>, text: &str) -> Result<DateTime<Utc>, Error> {
    let mut result = base;

    for (amount, unit) in parse_duration(text)? {
        let shifted = match unit {
            Unit::Months => add_months(result, amount),
            Unit::Years => amount
                .checked_mul(12)
                .and_then(|months| add_months(result, months)),
            _ => fixed_duration(amount, unit).and_then(|delta| result.checked_add_signed(delta)),
        };
        result = shifted.ok_or_else(|| {
            Error::new(Code::InvalidDateTime, "timestamp out of representable range")
        })?;
    }

    Ok(result)
}

/// A fixed length of time, for the units that have one.
fn fixed_duration(amount: i64, unit: Unit) -> Option<Duration> {
    match unit {
        Unit::Seconds => Duration::try_seconds(amount),
        Unit::Minutes => Duration::try_minutes(amount),
        Unit::Hours => Duration::try_hours(amount),
        Unit::Days => Duration::try_days(amount),
        Unit::Weeks => Duration::try_weeks(amount),
        Unit::Months | Unit::Years => None,
    }
}

/// Calendar aware month offset. The day of month clamps, so the last day
/// of January shifted one month lands on the last day of February.
fn add_months(base: DateTime<Utc>, amount: i64) -> Option<DateTime<Utc>> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);

    if amount >= 0 {
        base.checked_add_months(months)
    } else {
        base.checked_sub_months(months)
    }
}

/// Parse a duration into its components.
///
/// The grammar is one or more `<signed integer><unit>` components with
/// optional whitespace between tokens. Units are case-insensitive.
///
/// # Errors
///
/// Returns an [`Error`] when no component can be read, a unit is unknown,
/// or text is left over.
pub(crate) fn parse_duration(text: &str) -> Result<Vec<(i64, Unit)>, Error> {
    let mut components = vec![];
    let mut rest = text.trim();

    while !rest.is_empty() {
        let unsigned = rest.strip_prefix('-').unwrap_or(rest);
        let digits = unsigned
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(unsigned.len());
        if digits == 0 {
            return Err(error_duration(text));
        }

        let number_len = rest.len() - unsigned.len() + digits;
        let (number_text, remainder) = rest.split_at(number_len);
        let amount: i64 = number_text.parse().map_err(|_| error_duration(text))?;

        let remainder = remainder.trim_start();
        let unit_len = remainder
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(remainder.len());
        if unit_len == 0 {
            return Err(error_duration(text));
        }

        let (unit_text, next) = remainder.split_at(unit_len);
        let unit = parse_unit(unit_text).ok_or_else(|| {
            Error::new(
                Code::InvalidDateTime,
                format!("unknown duration unit `{unit_text}`"),
            )
        })?;

        components.push((amount, unit));
        rest = next.trim_start();
    }

    if components.is_empty() {
        return Err(error_duration(text));
    }

    Ok(components)
}

fn parse_unit(text: &str) -> Option<Unit> {
    match text.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(Unit::Seconds),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(Unit::Minutes),
        "h" | "hour" | "hours" => Some(Unit::Hours),
        "d" | "day" | "days" => Some(Unit::Days),
        "w" | "week" | "weeks" => Some(Unit::Weeks),
        "mo" | "month" | "months" => Some(Unit::Months),
        "y" | "year" | "years" => Some(Unit::Years),
        _ => None,
    }
}

fn error_duration(text: &str) -> Error {
    Error::new(Code::InvalidDateTime, format!("invalid duration `{text}`"))
        .with_help("durations look like `2 hours`, `-1d` or `1h 30min`")
}

#[cfg(test)]
mod tests {
    use super::{add_duration, format_timestamp, parse_duration, parse_timestamp, Unit};

    #[test]
    fn test_parse_duration_components() {
        assert_eq!(
            parse_duration("1h 30min").unwrap(),
            vec![(1, Unit::Hours), (30, Unit::Minutes)]
        );
        assert_eq!(parse_duration("-2 WEEKS").unwrap(), vec![(-2, Unit::Weeks)]);
        assert_eq!(parse_duration(" 3mo ").unwrap(), vec![(3, Unit::Months)]);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for source in ["", "soon", "1", "1 parsec", "1h squid", "h1"] {
            assert!(parse_duration(source).is_err(), "`{source}` should fail");
        }
    }

    #[test]
    fn test_add_duration() {
        let base = parse_timestamp("2017-01-19T16:27:20.974Z").unwrap();

        let shifted = add_duration(base, "2 hours").unwrap();
        assert_eq!(format_timestamp(&shifted), "2017-01-19T18:27:20.974Z");

        let shifted = add_duration(base, "-1 day 3s").unwrap();
        assert_eq!(format_timestamp(&shifted), "2017-01-18T16:27:23.974Z");
    }

    #[test]
    fn test_add_months_clamps_day() {
        let base = parse_timestamp("2020-01-31T00:00:00Z").unwrap();

        let shifted = add_duration(base, "1mo").unwrap();
        assert_eq!(format_timestamp(&shifted), "2020-02-29T00:00:00.000Z");

        let shifted = add_duration(base, "1y").unwrap();
        assert_eq!(format_timestamp(&shifted), "2021-01-31T00:00:00.000Z");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2017-01-19T16:27:20Z").is_ok());
        assert!(parse_timestamp("2017-01-19T16:27:20+02:00").is_ok());
        assert!(parse_timestamp("2017-01-19T16:27:20").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }
}

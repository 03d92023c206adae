//! # Interval Parsing
//!
//! Parses rotation interval strings into `std::time::Duration`.
//!
//! Accepted format is a sequence of `<number><unit>` segments, e.g. `"24h"`,
//! `"1h30m"`, `"90s"`, `"1.5h"`, `"500ms"`. Units: `ns`, `us`/`µs`, `ms`,
//! `s`, `m`, `h`, `d`. The result must be strictly positive.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Alternation is leftmost-first, so `ms`/`ns`/`us` win over `m`/`s`.
    Regex::new(r"(?P<number>\d+(?:\.\d+)?)(?P<unit>ns|us|µs|ms|s|m|h|d)")
        .expect("segment regex is a compile-time constant")
});

/// Reasons a rotation interval can be rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("duration string cannot be empty")]
    Empty,
    #[error("invalid duration format '{0}'. Expected <number><unit> segments (e.g. '30m', '24h', '1h30m')")]
    InvalidFormat(String),
    #[error("duration '{0}' overflows")]
    Overflow(String),
    #[error("duration must be greater than 0, got '{0}'")]
    NotPositive(String),
}

/// Parse a rotation interval such as `"24h"` or `"1h30m"`.
///
/// # Errors
/// Returns a [`DurationParseError`] if the string is empty, malformed,
/// overflows, or evaluates to zero.
pub fn parse_interval(interval: &str) -> Result<Duration, DurationParseError> {
    let trimmed = interval.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let lowered = trimmed.to_lowercase();
    let invalid = || DurationParseError::InvalidFormat(trimmed.to_string());
    let overflow = || DurationParseError::Overflow(trimmed.to_string());

    let mut total_nanos: u128 = 0;
    let mut cursor = 0;

    for captures in SEGMENT_REGEX.captures_iter(&lowered) {
        let whole = captures.get(0).ok_or_else(invalid)?;
        // Segments must be contiguous and cover the whole string
        if whole.start() != cursor {
            return Err(invalid());
        }
        cursor = whole.end();

        let number = captures.name("number").ok_or_else(invalid)?.as_str();
        let unit = captures.name("unit").ok_or_else(invalid)?.as_str();

        let segment = segment_nanos(number, unit_nanos(unit).ok_or_else(invalid)?)
            .ok_or_else(overflow)?;
        total_nanos = total_nanos.checked_add(segment).ok_or_else(overflow)?;
    }

    if cursor == 0 || cursor != lowered.len() {
        return Err(invalid());
    }

    if total_nanos == 0 {
        return Err(DurationParseError::NotPositive(trimmed.to_string()));
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000)
        .ok()
        .ok_or_else(overflow)?;
    let nanos = u32::try_from(total_nanos % 1_000_000_000)
        .ok()
        .ok_or_else(overflow)?;
    Ok(Duration::new(secs, nanos))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        "d" => 86_400 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// `number` is `<int>` or `<int>.<frac>`; fractional digits are applied
/// with integer arithmetic and truncated below one nanosecond.
fn segment_nanos(number: &str, unit: u128) -> Option<u128> {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (number, ""),
    };

    let int_value: u128 = int_part.parse().ok()?;
    let mut nanos = int_value.checked_mul(unit)?;

    if !frac_part.is_empty() {
        // Digits past the 30th cannot contribute at nanosecond resolution
        let digits = &frac_part[..frac_part.len().min(30)];
        let frac_value: u128 = digits.parse().ok()?;
        let scale = 10u128.checked_pow(u32::try_from(digits.len()).ok()?)?;
        nanos = nanos.checked_add(frac_value.checked_mul(unit)? / scale)?;
    }

    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_interval("2d").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_interval("10µs").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_interval("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_interval("1m30s500ms").unwrap(), Duration::from_millis(90_500));
        assert_eq!(parse_interval("1.5h").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_interval("0.5s").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_is_whitespace_and_case_tolerant() {
        assert_eq!(parse_interval("  1H ").unwrap(), Duration::from_secs(3_600));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["bogus", "h", "10", "1x", "-1h", "1h 30m", "1h-", "1..5h", ".5h", "1h30"] {
            assert!(
                matches!(parse_interval(bad), Err(DurationParseError::InvalidFormat(_))),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_empty_and_zero() {
        assert_eq!(parse_interval("   "), Err(DurationParseError::Empty));
        assert!(matches!(
            parse_interval("0s"),
            Err(DurationParseError::NotPositive(_))
        ));
        assert!(matches!(
            parse_interval("0h0m"),
            Err(DurationParseError::NotPositive(_))
        ));
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(matches!(
            parse_interval("999999999999999999999999999999999999d"),
            Err(DurationParseError::Overflow(_))
        ));
    }
}

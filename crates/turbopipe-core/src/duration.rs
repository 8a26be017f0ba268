//! Parsing of human-readable duration strings.
//!
//! Configuration files express intervals the way operators write them:
//! `"100ms"`, `"1.5s"`, `"1m30s"`. A bare `"0"` is accepted as zero.
//!
//! Supported units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    /// The input was empty or only whitespace.
    #[error("empty duration string")]
    Empty,

    /// A component did not start with a number.
    #[error("expected a number in `{0}`")]
    InvalidFormat(String),

    /// The numeric part could not be parsed.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    /// A number was not followed by a unit.
    #[error("missing unit after `{0}`")]
    MissingUnit(String),

    /// The unit is not one of the supported ones.
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),

    /// The value does not fit in a `Duration`.
    #[error("duration `{0}` is out of range")]
    Overflow(String),
}

/// Parse a duration string such as `"300ms"` or `"1h15m"`.
///
/// # Examples
///
/// ```rust
/// use turbopipe_core::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationParseError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(DurationParseError::InvalidFormat(s.to_string()));
        }
        let (number, tail) = rest.split_at(number_end);

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let nanos_per_unit: u64 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(DurationParseError::MissingUnit(number.to_string())),
            other => return Err(DurationParseError::UnknownUnit(other.to_string())),
        };

        total = total
            .checked_add(component(number, nanos_per_unit, s)?)
            .ok_or_else(|| DurationParseError::Overflow(s.to_string()))?;
        rest = tail;
    }

    Ok(total)
}

fn component(
    number: &str,
    nanos_per_unit: u64,
    input: &str,
) -> Result<Duration, DurationParseError> {
    // Integers stay in integer arithmetic so "100ms" is exact.
    if !number.contains('.') {
        let value: u64 = number
            .parse()
            .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;
        let nanos = value
            .checked_mul(nanos_per_unit)
            .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;
        return Ok(Duration::from_nanos(nanos));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;
    Duration::try_from_secs_f64(value * nanos_per_unit as f64 / 1e9)
        .map_err(|_| DurationParseError::Overflow(input.to_string()))
}

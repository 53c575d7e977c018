//! Coercion rules turning raw environment strings into typed values.
use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Parse a signed decimal integer with an optional leading `+` or `-`.
/// Surrounding whitespace is not accepted.
pub fn parse_integer(input: &str) -> Result<i64, CoercionError> {
    let digits = input
        .strip_prefix('-')
        .or_else(|| input.strip_prefix('+'))
        .unwrap_or(input);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoercionError::InvalidInteger(input.to_string()));
    }
    input
        .parse()
        .map_err(|_| CoercionError::InvalidInteger(input.to_string()))
}

/// Parse a boolean flag (`1`, `t`, `true`, `0`, `f`, `false` and their
/// capitalized forms).
pub fn parse_flag(input: &str) -> Result<bool, CoercionError> {
    match input.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CoercionError::InvalidFlag(input.to_string())),
    }
}

/// Parse a duration such as `15m`, `1h30m`, `1.5s` or `250ms`.
///
/// The input is a sequence of `<number><unit>` components. Units are `ns`,
/// `us` (or `µs`), `ms`, `s`, `m` and `h`. The bare string `0` is accepted
/// as zero; any other number needs a unit.
pub fn parse_duration(input: &str) -> Result<Duration, CoercionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoercionError::EmptyDuration);
    }
    if trimmed.starts_with('-') {
        return Err(CoercionError::NegativeDuration(input.to_string()));
    }
    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(CoercionError::InvalidNumber(input.to_string()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| CoercionError::MissingUnit(input.to_string()))?;
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let scale = unit_scale(unit).ok_or_else(|| CoercionError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;
        let nanos = component_nanos(number, scale)
            .ok_or_else(|| CoercionError::InvalidNumber(input.to_string()))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| CoercionError::DurationOverflow(input.to_string()))?;
        rest = next;
    }

    let total =
        u64::try_from(total).map_err(|_| CoercionError::DurationOverflow(input.to_string()))?;
    Ok(Duration::from_nanos(total))
}

/// Render a duration in the shortest form `parse_duration` reads back.
///
/// `Duration::from_secs(300)` renders as `5m`, zero renders as `0s`.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let nanos = duration.as_nanos();
    let hours = nanos / NANOS_PER_HOUR;
    let minutes = nanos % NANOS_PER_HOUR / NANOS_PER_MINUTE;
    let seconds = nanos % NANOS_PER_MINUTE / NANOS_PER_SECOND;
    let fraction = nanos % NANOS_PER_SECOND;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    if fraction > 0 {
        if fraction % NANOS_PER_MILLI == 0 {
            out.push_str(&format!("{}ms", fraction / NANOS_PER_MILLI));
        } else if fraction % NANOS_PER_MICRO == 0 {
            out.push_str(&format!("{}us", fraction / NANOS_PER_MICRO));
        } else {
            out.push_str(&format!("{fraction}ns"));
        }
    }
    out
}

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Nanoseconds for one `<number>` in the given unit; fractional digits
/// below one nanosecond are dropped.
fn component_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let mut nanos = whole.checked_mul(scale)?;

    let mut place = scale;
    for digit in fraction.bytes() {
        place /= 10;
        if place == 0 {
            break;
        }
        nanos += u128::from(digit - b'0') * place;
    }
    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_unit_durations() {
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(24 * 3600));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("10µs").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn parses_compound_and_fractional_durations() {
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::from_secs(90 * 60)
        );
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(".5h").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("+2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration(" 3s ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(matches!(parse_duration(""), Err(CoercionError::EmptyDuration)));
        assert!(matches!(
            parse_duration("-5m"),
            Err(CoercionError::NegativeDuration(_))
        ));
        assert!(matches!(
            parse_duration("300"),
            Err(CoercionError::MissingUnit(_))
        ));
        assert!(matches!(
            parse_duration("5 minutes"),
            Err(CoercionError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("5d"),
            Err(CoercionError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("1.2.3s"),
            Err(CoercionError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_duration("h"),
            Err(CoercionError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_duration("99999999999999999999h"),
            Err(CoercionError::DurationOverflow(_))
        ));
    }

    #[test]
    fn formats_in_shortest_form() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_duration(Duration::from_secs(3601)), "1h1s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s500ms");
        assert_eq!(format_duration(Duration::from_micros(3)), "3us");
        assert_eq!(format_duration(Duration::from_nanos(1_000_042)), "1000042ns");
    }

    #[test]
    fn formatted_durations_parse_back() {
        for text in ["5m", "24h", "1h30m", "1s500ms", "0s", "45s", "2h1m3s"] {
            let parsed = parse_duration(text).unwrap();
            assert_eq!(format_duration(parsed), text);
        }
        let odd = Duration::new(7_384, 123_456_789);
        assert_eq!(parse_duration(&format_duration(odd)).unwrap(), odd);
    }

    #[test]
    fn parses_integers() {
        assert_eq!(parse_integer("42").unwrap(), 42);
        assert_eq!(parse_integer("-1").unwrap(), -1);
        assert_eq!(parse_integer("+7").unwrap(), 7);
        assert!(parse_integer("abc").is_err());
        assert!(parse_integer(" 7 ").is_err());
        assert!(parse_integer("-").is_err());
        assert!(parse_integer("1.5").is_err());
        assert!(parse_integer("99999999999999999999").is_err());
    }

    #[test]
    fn parses_flags() {
        for value in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(parse_flag(value).unwrap());
        }
        for value in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!parse_flag(value).unwrap());
        }
        assert!(matches!(parse_flag("yes"), Err(CoercionError::InvalidFlag(_))));
    }
}

#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("invalid integer `{0}`")]
    InvalidInteger(String),
    #[error("invalid boolean `{0}`")]
    InvalidFlag(String),
    #[error("empty duration")]
    EmptyDuration,
    #[error("negative duration `{0}`")]
    NegativeDuration(String),
    #[error("missing unit in duration `{0}`")]
    MissingUnit(String),
    #[error("unknown unit `{unit}` in duration `{input}`")]
    UnknownUnit { unit: String, input: String },
    #[error("invalid number in duration `{0}`")]
    InvalidNumber(String),
    #[error("duration `{0}` is too large")]
    DurationOverflow(String),
}

//! Human-readable sizes and durations
//!
//! Sizes use 1024-based units (`"512B"`, `"16KB"`, `"4MB"`, `"1GB"`).
//! Durations accept a day suffix (`"7d"`, `"90D"`) on top of everything
//! `humantime` understands (`"30s"`, `"5m"`, `"24h"`, `"1h 30m"`).

use crate::error::{Error, Result};
use std::time::Duration;

const DAY: u64 = 24 * 60 * 60;

/// Parse a byte size such as `"16KB"` or `"200 mb"`
pub fn parse_byte_size(input: &str) -> Result<u64> {
    let invalid = || Error::InvalidByteSize(input.to_string());

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1 << 10,
        "M" | "MB" => 1 << 20,
        "G" | "GB" => 1 << 30,
        "T" | "TB" => 1 << 40,
        _ => return Err(invalid()),
    };

    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Parse a duration such as `"30s"`, `"24h"` or `"7d"`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    let invalid = |reason: String| Error::InvalidDuration {
        value: input.to_string(),
        reason,
    };

    if let Some(days) = trimmed
        .strip_suffix('d')
        .or_else(|| trimmed.strip_suffix('D'))
    {
        if !days.is_empty() && days.bytes().all(|b| b.is_ascii_digit()) {
            let days: u64 = days.parse().map_err(|e| invalid(format!("{e}")))?;
            let secs = days
                .checked_mul(DAY)
                .ok_or_else(|| invalid("too large".to_string()))?;
            return Ok(Duration::from_secs(secs));
        }
    }

    humantime::parse_duration(trimmed).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        assert_eq!(parse_byte_size("512B").unwrap(), 512);
        assert_eq!(parse_byte_size("16KB").unwrap(), 16 * 1024);
        assert_eq!(parse_byte_size("4MB").unwrap(), 4 * 1024 * 1024);
        assert_eq!(parse_byte_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_byte_size("200 mb").unwrap(), 200 * 1024 * 1024);
        assert_eq!(parse_byte_size("64").unwrap(), 64);
        assert_eq!(parse_byte_size("2k").unwrap(), 2048);
    }

    #[test]
    fn test_bad_byte_sizes() {
        for input in ["", "MB", "12XB", "-1KB", "1.5MB", "99999999999TB"] {
            assert!(
                matches!(parse_byte_size(input), Err(Error::InvalidByteSize(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_day_suffix() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * DAY));
        assert_eq!(parse_duration("90D").unwrap(), Duration::from_secs(90 * DAY));
    }

    #[test]
    fn test_standard_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(DAY));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn test_bad_durations() {
        for input in ["", "d", "soon", "7x"] {
            assert!(
                matches!(parse_duration(input), Err(Error::InvalidDuration { .. })),
                "{input:?} should be rejected"
            );
        }
    }
}

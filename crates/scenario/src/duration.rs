//! Compact duration grammar for event offsets.
//!
//! Scenario authors write offsets as `10s`, `5m`, `24h` or `30d`. The
//! grammar is deliberately strict: a malformed offset is a parse failure,
//! never a silent zero.

use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * 60;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Parse a compact duration like `"30d"`. Returns `None` unless the input
/// is one or more digits followed by exactly one of `s`, `m`, `h`, `d`.
pub fn parse_compact(s: &str) -> Option<Duration> {
    if !s.is_ascii() {
        return None;
    }
    let (digits, unit) = s.split_at(s.len().checked_sub(1)?);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let secs = match unit {
        "s" => value,
        "m" => value.checked_mul(SECS_PER_MINUTE)?,
        "h" => value.checked_mul(SECS_PER_HOUR)?,
        "d" => value.checked_mul(SECS_PER_DAY)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

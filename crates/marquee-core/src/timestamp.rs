//! Start-time tokens
//!
//! Tokens are colon-separated groups of ASCII digits, read from the right
//! as seconds, minutes and hours: `ss`, `m:ss` or `h:mm:ss`. Groups left
//! of the hours are ignored. Minutes are clamped to 59. Seconds are
//! clamped to 59 only when the clamped minutes are non-zero, so `125` and
//! `0:90` are both plain second counts. Hours are not bounded.
//!
//! ```rust
//! use marquee_core::timestamp;
//!
//! assert_eq!(timestamp::parse("125"), Some(125.0));
//! assert_eq!(timestamp::parse("1:02:03"), Some(3723.0));
//! assert_eq!(timestamp::parse("soon"), None);
//! assert_eq!(timestamp::format(3723.0), "1:02:03");
//! ```

/// Parse a start-time token into an offset in seconds.
///
/// Malformed input yields `None`, which callers read as "no offset".
pub fn parse(token: &str) -> Option<f64> {
    let mut values = Vec::new();
    for group in token.split(':') {
        if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        values.push(group.parse::<u64>().ok()?);
    }

    // seconds first
    values.reverse();
    let hours = values.get(2).copied().unwrap_or(0);
    let minutes = values.get(1).copied().unwrap_or(0).min(59);
    let seconds = if minutes > 0 { values[0].min(59) } else { values[0] };

    hours
        .checked_mul(3600)?
        .checked_add(minutes * 60)?
        .checked_add(seconds)
        .map(|total| total as f64)
}

/// Format an offset as `m:ss` or `h:mm:ss`.
///
/// Fractional seconds are truncated, so whole-second offsets survive a
/// `format` / `parse` round trip unchanged.
pub fn format(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

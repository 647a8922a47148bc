//! Shared formatting helpers for fragments.
//!
//! Pure functions only: ratios with guarded denominators and byte-bounded
//! text cuts that never split a UTF-8 character.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// Returns `part / total * 100`, or `0.0` when `total` is zero.
///
/// The result is clamped to `[0, 100]`.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / total as f64).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Largest index `<= max` that lies on a char boundary of `s`.
pub fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Cuts `s` to at most `max_bytes` bytes without splitting a character.
pub fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    &s[..floor_char_boundary(s, max_bytes)]
}

/// Normalize text for single-line display with space collapsing.
///
/// Newlines and tabs become spaces, carriage returns are dropped and runs of
/// spaces collapse into one. Leading and trailing whitespace is trimmed.
pub fn normalize_for_display(s: &str) -> String {
    let s = s.replace('\n', " ").replace('\r', "").replace('\t', " ");
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.trim().chars() {
        if ch == ' ' {
            if !prev_space {
                result.push(ch);
            }
            prev_space = true;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result
}

/// Format a duration for log lines: `"250ms"`, `"5s"`, `"3m5s"`, `"1h0m"`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}

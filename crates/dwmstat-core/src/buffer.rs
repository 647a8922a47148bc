//! Fixed-capacity text accumulator for one block's fragment.
//!
//! The status bar has a real width limit, so a fragment is bounded by a byte
//! capacity chosen at startup. Writes past the capacity are dropped on a
//! character boundary; nothing ever grows beyond it.

use std::fmt;

use crate::fmt::floor_char_boundary;

/// Default capacity of a single fragment, in bytes.
pub const DEFAULT_CAPACITY: usize = 64;

/// A bounded, append-only fragment buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentBuffer {
    text: String,
    capacity: usize,
    truncated: bool,
}

impl FragmentBuffer {
    /// Creates an empty buffer that will hold at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    /// Clears the content. Capacity is unchanged.
    pub fn reset(&mut self) {
        self.text.clear();
        self.truncated = false;
    }

    /// Appends formatted text, silently dropping whatever does not fit.
    pub fn append(&mut self, args: fmt::Arguments<'_>) {
        // write_str never fails, so neither does write_fmt
        let _ = fmt::Write::write_fmt(self, args);
    }

    /// Appends `marker` (when `alert` holds) followed by the formatted text.
    ///
    /// The marker consumes capacity from the same budget as the content.
    pub fn append_alert(&mut self, alert: bool, marker: &str, args: fmt::Arguments<'_>) {
        if alert {
            self.push_bounded(marker);
        }
        self.append(args);
    }

    /// Replaces this buffer's content with `other`'s, keeping our capacity.
    pub fn replace_with(&mut self, other: &FragmentBuffer) {
        self.reset();
        self.push_bounded(&other.text);
        self.truncated |= other.truncated;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether any write since the last reset was cut short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn push_bounded(&mut self, s: &str) {
        // once cut, later pieces must not slip into the leftover bytes
        if self.truncated {
            return;
        }
        let room = self.capacity.saturating_sub(self.text.len());
        if s.len() <= room {
            self.text.push_str(s);
        } else {
            let cut = floor_char_boundary(s, room);
            self.text.push_str(&s[..cut]);
            self.truncated = true;
        }
    }
}

impl Default for FragmentBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl fmt::Write for FragmentBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_bounded(s);
        Ok(())
    }
}

impl fmt::Display for FragmentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_within_capacity() {
        let mut buf = FragmentBuffer::with_capacity(16);
        buf.append(format_args!("[RAM {:.1}%]", 20.0));
        assert_eq!(buf.as_str(), "[RAM 20.0%]");
        assert!(!buf.is_truncated());
    }

    #[test]
    fn append_truncates_at_capacity() {
        let mut buf = FragmentBuffer::with_capacity(8);
        buf.append(format_args!("[CPU {:04.1}%]", 12.5));
        assert_eq!(buf.as_str(), "[CPU 12.");
        assert_eq!(buf.len(), 8);
        assert!(buf.is_truncated());

        // further writes are dropped entirely
        buf.append(format_args!("more"));
        assert_eq!(buf.as_str(), "[CPU 12.");
    }

    #[test]
    fn truncation_never_splits_a_character() {
        let mut buf = FragmentBuffer::with_capacity(11);
        buf.append(format_args!("[GPU {:.1}ºC]", 45.0));
        // "[GPU 45.0" is 9 bytes, 'º' needs two more
        assert_eq!(buf.as_str(), "[GPU 45.0º");
        let mut buf = FragmentBuffer::with_capacity(10);
        buf.append(format_args!("[GPU {:.1}ºC]", 45.0));
        assert_eq!(buf.as_str(), "[GPU 45.0");
    }

    #[test]
    fn reset_clears_everything() {
        let mut buf = FragmentBuffer::with_capacity(4);
        buf.append(format_args!("overflowing"));
        buf.reset();
        assert!(buf.is_empty());
        assert!(!buf.is_truncated());
        assert_eq!(buf.to_string(), "");
    }

    #[test]
    fn alert_marker_shares_the_budget() {
        let mut buf = FragmentBuffer::with_capacity(10);
        buf.append_alert(true, "!", format_args!("[RAM 95%]"));
        assert_eq!(buf.as_str(), "![RAM 95%]");

        let mut buf = FragmentBuffer::with_capacity(10);
        buf.append_alert(false, "!", format_args!("[RAM 15%]"));
        assert_eq!(buf.as_str(), "[RAM 15%]");

        let mut buf = FragmentBuffer::with_capacity(6);
        buf.append_alert(true, "!!", format_args!("[RAM 95%]"));
        assert_eq!(buf.as_str(), "!![RAM");
    }

    #[test]
    fn replace_with_keeps_own_capacity() {
        let mut scratch = FragmentBuffer::with_capacity(64);
        scratch.append(format_args!("[Clear 25C]"));
        let mut target = FragmentBuffer::with_capacity(6);
        target.append(format_args!("old"));
        target.replace_with(&scratch);
        assert_eq!(target.as_str(), "[Clear");
        assert_eq!(target.capacity(), 6);
    }
}

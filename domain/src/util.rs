//! Shared utility functions.

/// Shorten `s` to at most `max_chars` characters, appending `...` when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Milliseconds of a duration, saturating at `u64::MAX`.
pub fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_short_is_unchanged() {
        assert_eq!(excerpt("hi", 10), "hi");
    }

    #[test]
    fn excerpt_cuts_on_chars() {
        assert_eq!(excerpt("hello world", 8), "hello...");
        assert_eq!(excerpt("日本語テキスト", 5), "日本...");
    }

    #[test]
    fn millis_converts() {
        assert_eq!(millis(std::time::Duration::from_millis(1500)), 1500);
    }
}

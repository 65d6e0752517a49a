//! String utility functions

/// Default maximum length for preview text (in characters)
pub const PREVIEW_MAX_LENGTH: usize = 60;

/// Truncate text to max length with ellipsis
pub fn truncate_preview(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_len {
        format!("{}...", text.chars().take(max_len).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Case-insensitive substring check.
///
/// ASCII inputs are compared without allocating; anything else falls back to
/// Unicode lowercasing.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle.is_ascii() {
        if haystack.len() < needle.len() {
            return false;
        }
        return haystack
            .as_bytes()
            .windows(needle.len())
            .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()));
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Trim a string and drop it entirely when nothing is left
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_preview_short() {
        assert_eq!(truncate_preview("  hello  ", 10), "hello");
    }

    #[test]
    fn test_truncate_preview_long() {
        assert_eq!(truncate_preview("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_truncate_preview_multibyte() {
        assert_eq!(truncate_preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_contains_ignore_case_ascii() {
        assert!(contains_ignore_case("chat.send_message", "SEND"));
        assert!(contains_ignore_case("Provider.Call", "provider.call"));
        assert!(!contains_ignore_case("chat", "chat.send"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("", "x"));
    }

    #[test]
    fn test_contains_ignore_case_unicode() {
        assert!(contains_ignore_case("Überprüfung", "überp"));
        assert!(!contains_ignore_case("Überprüfung", "zz"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  a ")), Some("a"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}

//! Small string helpers for bounded fields.

/// Truncate `value` to at most `max_chars` characters, always on a char boundary.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_value_unchanged() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate_chars("abcde", 5), "abcde");
        assert_eq!(truncate_chars("abcdef", 5), "abcde");
    }

    #[test]
    fn test_truncate_multibyte() {
        let value = "ééééé";
        let truncated = truncate_chars(value, 3);
        assert_eq!(truncated, "ééé");
        assert_eq!(truncated.chars().count(), 3);
    }
}

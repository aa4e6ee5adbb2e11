//! `application/x-www-form-urlencoded` field extraction

/// Split a query string or form body into decoded `(name, value)` pairs, in order.
///
/// Duplicate names are kept; a pair without `=` yields an empty value. Invalid UTF-8
/// after percent-decoding is replaced rather than rejected.
pub fn parse_urlencoded(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let pairs = parse_urlencoded("b=2&a=1&b=3");
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_decodes_percent_and_plus() {
        let pairs = parse_urlencoded("username=admin%27+OR+%271%27%3D%271");
        assert_eq!(pairs[0].1, "admin' OR '1'='1");
    }

    #[test]
    fn test_parse_handles_bare_keys_and_empty_input() {
        assert_eq!(
            parse_urlencoded("?flag&x="),
            vec![
                ("flag".to_string(), String::new()),
                ("x".to_string(), String::new())
            ]
        );
        assert!(parse_urlencoded("").is_empty());
    }

    #[test]
    fn test_parse_invalid_utf8_is_lossy() {
        let pairs = parse_urlencoded("q=%FF%2E%2E%2F");
        assert!(pairs[0].1.ends_with("../"));
    }

    #[test]
    fn test_parse_skips_empty_pairs_and_keeps_bad_escapes() {
        let pairs = parse_urlencoded("a=1&&b=%zz&=x");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "%zz".to_string()),
                (String::new(), "x".to_string()),
            ]
        );
    }
}

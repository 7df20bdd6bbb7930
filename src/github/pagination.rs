// Cursor pagination for list endpoints.
// Extracts the continuation URL from an RFC 5988 `Link` response header.

/// Find the URL tagged `rel="next"` in a `Link` header value.
///
/// `<https://api.github.com/gists/public?page=2>; rel="next", <...>; rel="last"`
/// yields `https://api.github.com/gists/public?page=2`.
pub fn next_cursor(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .find(|segment| segment.contains(r#"rel="next""#))
        .and_then(|segment| {
            let start = segment.find('<')? + 1;
            let end = start + segment[start..].find('>')?;
            Some(segment[start..end].trim().to_string())
        })
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_before_first() {
        let header = r#"<https://api.github.com/gists/public?page=2>; rel="next", <https://api.github.com/gists/public?page=1>; rel="first""#;
        assert_eq!(
            next_cursor(header),
            Some("https://api.github.com/gists/public?page=2".to_string())
        );
    }

    #[test]
    fn test_next_in_middle() {
        let header = r#"<https://api.github.com/gists?page=1>; rel="prev", <https://api.github.com/gists?page=3>; rel="next", <https://api.github.com/gists?page=9>; rel="last""#;
        assert_eq!(
            next_cursor(header),
            Some("https://api.github.com/gists?page=3".to_string())
        );
    }

    #[test]
    fn test_no_next() {
        let header = r#"<https://api.github.com/gists?page=8>; rel="prev", <https://api.github.com/gists?page=1>; rel="first""#;
        assert_eq!(next_cursor(header), None);
        assert_eq!(next_cursor(""), None);
    }

    #[test]
    fn test_next_without_brackets() {
        assert_eq!(next_cursor(r#"https://api.github.com/gists?page=2; rel="next""#), None);
    }
}

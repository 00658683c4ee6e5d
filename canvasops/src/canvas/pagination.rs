use reqwest::header::{HeaderMap, LINK};
use regex::Regex;
use std::sync::OnceLock;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="?([A-Za-z]+)"?"#).expect("link pattern is valid")
    })
}

/// Extract the `rel="next"` target from a `Link` header value
pub fn parse_next_link(header: &str) -> Option<String> {
    link_pattern()
        .captures_iter(header)
        .find(|caps| caps[2].eq_ignore_ascii_case("next"))
        .map(|caps| caps[1].to_string())
}

/// Next page URL from response headers, if Canvas sent one
pub fn next_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(parse_next_link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_next_among_several_rels() {
        let header = r#"<https://c.test/api/v1/courses/1/pages?page=1&per_page=100>; rel="current",<https://c.test/api/v1/courses/1/pages?page=2&per_page=100>; rel="next",<https://c.test/api/v1/courses/1/pages?page=1&per_page=100>; rel="first",<https://c.test/api/v1/courses/1/pages?page=3&per_page=100>; rel="last""#;
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://c.test/api/v1/courses/1/pages?page=2&per_page=100")
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let header = r#"<https://c.test/api/v1/x?page=3>; rel="current", <https://c.test/api/v1/x?page=3>; rel="last""#;
        assert_eq!(parse_next_link(header), None);
    }

    #[test]
    fn test_next_page_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);

        headers.insert(
            LINK,
            HeaderValue::from_static(r#"<http://127.0.0.1/api/v1/a?page=2>; rel="next""#),
        );
        assert_eq!(next_page(&headers).as_deref(), Some("http://127.0.0.1/api/v1/a?page=2"));
    }
}

//! Endpoint URL construction.
//!
//! The service base URL may be configured with or without a trailing slash
//! (`http://localhost:5000/`), and endpoint constants are written without a
//! leading one. Joining goes through here so neither form produces `//`.

/// Strip trailing slashes from a base URL.
///
/// ```
/// use preinscription::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:5000/"), "http://localhost:5000");
/// assert_eq!(normalize_base_url("https://example.org/app///"), "https://example.org/app");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path.
///
/// ```
/// use preinscription::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:5000/", "/api/message"),
///     "http://localhost:5000/api/message"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalize_base_url(base_url), endpoint)
}

/// Whether a configured base URL can be used at all.
pub fn is_http_url(base_url: &str) -> bool {
    let trimmed = base_url.trim();
    trimmed.starts_with("http://") || trimmed.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes_and_whitespace() {
        assert_eq!(
            normalize_base_url("http://localhost:5000"),
            "http://localhost:5000"
        );
        assert_eq!(
            normalize_base_url(" http://localhost:5000// "),
            "http://localhost:5000"
        );
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn endpoints_join_with_exactly_one_slash() {
        for base in ["http://host", "http://host/", "http://host///"] {
            for endpoint in ["api/message", "/api/message", "//api/message"] {
                assert_eq!(
                    construct_api_url(base, endpoint),
                    "http://host/api/message",
                    "base={base} endpoint={endpoint}"
                );
            }
        }
        assert_eq!(
            construct_api_url("https://example.org/prefix/", "api/auth/check"),
            "https://example.org/prefix/api/auth/check"
        );
    }

    #[test]
    fn only_http_schemes_are_accepted() {
        assert!(is_http_url("http://localhost:5000"));
        assert!(is_http_url("https://example.org"));
        assert!(!is_http_url("localhost:5000"));
        assert!(!is_http_url("ftp://example.org"));
    }
}

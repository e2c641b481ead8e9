//! Target URL resolution
//!
//! Validates the caller-supplied `url` query parameter and produces the
//! absolute URL to fetch. Rejection here short-circuits the request before
//! any outbound call is made.

use crate::error::ProxyError;
use std::borrow::Cow;
use url::Url;

/// Custom scheme accepted as an alias for `https://`.
const ZIPPED_PREFIX: &str = "zipped://";

/// Resolve the raw `url` parameter into a fetchable target.
///
/// The value is whitespace-trimmed, the `zipped://` prefix is normalized to
/// `https://`, and the result must parse as an absolute URL with an `http`
/// or `https` scheme.
pub fn resolve(raw: Option<&str>) -> Result<Url, ProxyError> {
    let raw = raw.map_or("", str::trim);
    if raw.is_empty() {
        return Err(ProxyError::MissingUrl);
    }

    let normalized = normalize_scheme(raw);
    let target = Url::parse(&normalized).map_err(|_| ProxyError::InvalidUrl)?;

    match target.scheme() {
        "http" | "https" => Ok(target),
        _ => Err(ProxyError::UnsupportedProtocol),
    }
}

/// Rewrite a leading `zipped://` to `https://`.
///
/// The prefix test is case-sensitive; `Zipped://` falls through to URL
/// parsing and is rejected by the scheme check.
fn normalize_scheme(raw: &str) -> Cow<'_, str> {
    match raw.strip_prefix(ZIPPED_PREFIX) {
        Some(rest) => Cow::Owned(format!("https://{rest}")),
        None => Cow::Borrowed(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_empty() {
        assert!(matches!(resolve(None), Err(ProxyError::MissingUrl)));
        assert!(matches!(resolve(Some("")), Err(ProxyError::MissingUrl)));
        assert!(matches!(resolve(Some("   ")), Err(ProxyError::MissingUrl)));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            resolve(Some("not a url")),
            Err(ProxyError::InvalidUrl)
        ));
        assert!(matches!(
            resolve(Some("example.com/no-scheme")),
            Err(ProxyError::InvalidUrl)
        ));
    }

    #[test]
    fn test_unsupported_protocol() {
        assert!(matches!(
            resolve(Some("file:///etc/passwd")),
            Err(ProxyError::UnsupportedProtocol)
        ));
        assert!(matches!(
            resolve(Some("ftp://example.com/file")),
            Err(ProxyError::UnsupportedProtocol)
        ));
    }

    #[test]
    fn test_http_and_https_accepted() {
        let http = resolve(Some("http://example.com/page")).expect("http accepted");
        assert_eq!(http.scheme(), "http");

        let https = resolve(Some("https://example.com/page")).expect("https accepted");
        assert_eq!(https.scheme(), "https");
    }

    #[test]
    fn test_zipped_scheme_normalized() {
        let target = resolve(Some("zipped://example.com/page")).expect("normalized");
        assert_eq!(target.as_str(), "https://example.com/page");

        let plain = resolve(Some("https://example.com/page")).expect("parsed");
        assert_eq!(target, plain);
    }

    #[test]
    fn test_zipped_prefix_is_case_sensitive() {
        assert!(matches!(
            resolve(Some("Zipped://example.com/page")),
            Err(ProxyError::UnsupportedProtocol)
        ));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let target = resolve(Some("  https://example.com/  ")).expect("trimmed");
        assert_eq!(target.as_str(), "https://example.com/");
    }
}

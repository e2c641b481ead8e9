//! Upstream fetch
//!
//! Performs the single outbound GET per invocation. Redirects follow the
//! client's defaults; no retry and no timeout are applied here, so a slow
//! upstream runs to completion or failure.

use crate::error::ProxyError;
use hyper::body::Bytes;
use url::Url;

/// A fetched upstream resource.
///
/// Upstream status is intentionally absent: success is always relayed as
/// 200, and transport failures surface as [`ProxyError::Upstream`].
#[derive(Debug)]
pub struct Fetched {
    /// Upstream `Content-Type` header value, empty string when absent
    pub content_type: String,
    pub body: FetchedBody,
}

/// Upstream body, decoded according to the content-type branch.
#[derive(Debug)]
pub enum FetchedBody {
    /// HTML read as text (charset-decoded)
    Text(String),
    /// Everything else read as raw bytes
    Bytes(Bytes),
}

/// Whether a `Content-Type` header value selects the HTML rewrite branch.
pub fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html")
}

/// Issue the outbound GET and read the full body.
pub async fn fetch(
    client: &reqwest::Client,
    target: &Url,
    user_agent: &str,
) -> Result<Fetched, ProxyError> {
    let response = client
        .get(target.as_str())
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = if is_html(&content_type) {
        FetchedBody::Text(response.text().await?)
    } else {
        FetchedBody::Bytes(response.bytes().await?)
    };

    Ok(Fetched { content_type, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("text/html; charset=utf-8"));
        assert!(!is_html("image/png"));
        assert!(!is_html("application/json"));
        assert!(!is_html(""));
    }
}

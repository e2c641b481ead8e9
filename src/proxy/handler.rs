//! Proxy request handler
//!
//! The linear per-invocation transform: parse input, validate, one outbound
//! fetch, transform, respond. Three exit branches (client error, HTML
//! success, binary success) plus the catch-all failure branch.

use crate::config::AppState;
use crate::error::ProxyError;
use crate::http;
use crate::logger;
use crate::proxy::rewrite;
use crate::proxy::target;
use crate::proxy::upstream::{self, Fetched, FetchedBody};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::sync::Arc;

/// Outcome of a successful proxy invocation, ready to relay.
#[derive(Debug)]
pub enum Relayed {
    /// Rewritten HTML, relayed as text
    Html(String),
    /// Non-HTML body, relayed as base64 text with the encoding flag set
    Binary { content_type: String, body: String },
}

/// Handle one proxy invocation end to end.
pub async fn handle_proxy(
    query: Option<&str>,
    is_head: bool,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    match proxy(query, state).await {
        Ok(Relayed::Html(html)) => http::build_proxied_html_response(html, is_head),
        Ok(Relayed::Binary { content_type, body }) => {
            http::build_proxied_binary_response(&content_type, body, is_head)
        }
        Err(err) => {
            if err.is_client_error() {
                logger::log_warning(&format!("Rejected proxy request: {err}"));
            } else {
                logger::log_error(&format!("Upstream fetch failed: {err}"));
            }
            http::build_error_response(&err)
        }
    }
}

/// Validate, fetch, and transform. Client errors short-circuit before the
/// outbound call.
async fn proxy(query: Option<&str>, state: &Arc<AppState>) -> Result<Relayed, ProxyError> {
    let raw_url = query_param(query, "url");
    let target = target::resolve(raw_url.as_deref())?;

    let fetched = upstream::fetch(&state.client, &target, &state.config.http.user_agent).await?;
    Ok(relay(fetched))
}

/// Transform a fetched resource into its relayed form.
fn relay(fetched: Fetched) -> Relayed {
    match fetched.body {
        FetchedBody::Text(html) => Relayed::Html(rewrite::rewrite_html(&html)),
        FetchedBody::Bytes(bytes) => Relayed::Binary {
            content_type: fetched.content_type,
            body: STANDARD.encode(&bytes),
        },
    }
}

/// Look up a single query parameter by name, URL-decoded.
///
/// Presence and absence are explicit; an absent parameter is `None`, never
/// an empty string.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::response::BASE64_FLAG_HEADER;
    use http_body_util::BodyExt;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;

    fn test_state() -> Arc<AppState> {
        let cfg = Config::load_from("does-not-exist").expect("defaults load");
        Arc::new(AppState::new(cfg))
    }

    async fn read_body(response: Response<Full<Bytes>>) -> String {
        let collected = response.into_body().collect().await.expect("body collects");
        String::from_utf8(collected.to_bytes().to_vec()).expect("utf8 body")
    }

    /// Serve a fixed response on an ephemeral local port.
    async fn spawn_upstream(content_type: &'static str, payload: &'static [u8]) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let service = service_fn(move |_req| async move {
                        Ok::<_, Infallible>(
                            Response::builder()
                                .header("Content-Type", content_type)
                                .body(Full::new(Bytes::from_static(payload)))
                                .expect("upstream response"),
                        )
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_missing_url_is_400_with_guidance() {
        let state = test_state();
        let resp = handle_proxy(None, false, &state).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(
            read_body(resp).await,
            "Missing url parameter. Example: ?url=https://example.com"
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_400() {
        let state = test_state();
        let resp = handle_proxy(Some("url=not%20a%20url"), false, &state).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(read_body(resp).await, "Invalid URL");
    }

    #[tokio::test]
    async fn test_file_scheme_is_400() {
        let state = test_state();
        let resp = handle_proxy(Some("url=file:///etc/passwd"), false, &state).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(read_body(resp).await, "Unsupported protocol");
    }

    #[tokio::test]
    async fn test_html_is_rewritten_end_to_end() {
        let html: &[u8] = concat!(
            "<html><head>",
            r#"<meta http-equiv="Content-Security-Policy" content="default-src 'self'">"#,
            "</head><body><script>alert(1)</script><p>page</p></body></html>",
        )
        .as_bytes();
        let addr = spawn_upstream("text/html; charset=utf-8", html).await;

        let state = test_state();
        let query = format!("url=http://{addr}/page");
        let resp = handle_proxy(Some(&query), false, &state).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html");
        assert!(resp.headers().get(BASE64_FLAG_HEADER).is_none());

        let body = read_body(resp).await;
        assert!(!body.to_lowercase().contains("<script"));
        assert!(!body.contains("Content-Security-Policy"));
        assert!(body.contains(&format!("{}</body>", rewrite::BADGE)));
        assert!(body.contains("<p>page</p>"));
    }

    #[tokio::test]
    async fn test_binary_is_base64_relayed_end_to_end() {
        const PAYLOAD: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];
        let addr = spawn_upstream("image/png", PAYLOAD).await;

        let state = test_state();
        let query = format!("url=http://{addr}/icon.png");
        let resp = handle_proxy(Some(&query), false, &state).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "image/png");
        assert_eq!(resp.headers()[BASE64_FLAG_HEADER], "true");

        let body = read_body(resp).await;
        assert_eq!(STANDARD.decode(body).expect("valid base64"), PAYLOAD);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_500() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let state = test_state();
        let query = format!("url=http://{addr}/");
        let resp = handle_proxy(Some(&query), false, &state).await;

        assert_eq!(resp.status(), 500);
        assert!(read_body(resp).await.starts_with("Proxy error: "));
    }

    #[test]
    fn test_query_param_lookup() {
        assert_eq!(
            query_param(Some("url=https://example.com"), "url").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(query_param(Some("other=1"), "url"), None);
        assert_eq!(query_param(None, "url"), None);
    }

    #[test]
    fn test_query_param_decodes() {
        assert_eq!(
            query_param(Some("url=https%3A%2F%2Fexample.com%2Fa%20b"), "url").as_deref(),
            Some("https://example.com/a b")
        );
    }

    #[test]
    fn test_relay_html_rewrites() {
        let fetched = Fetched {
            content_type: "text/html; charset=utf-8".to_string(),
            body: FetchedBody::Text("<body><script>x()</script></body>".to_string()),
        };
        match relay(fetched) {
            Relayed::Html(html) => {
                assert!(!html.to_lowercase().contains("<script"));
                assert!(html.contains(rewrite::BADGE));
            }
            Relayed::Binary { .. } => panic!("expected html relay"),
        }
    }

    #[test]
    fn test_relay_binary_round_trips() {
        let payload: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff, 0x10];
        let fetched = Fetched {
            content_type: "image/png".to_string(),
            body: FetchedBody::Bytes(Bytes::copy_from_slice(payload)),
        };
        match relay(fetched) {
            Relayed::Binary { content_type, body } => {
                assert_eq!(content_type, "image/png");
                let decoded = STANDARD.decode(body).expect("valid base64");
                assert_eq!(decoded, payload);
            }
            Relayed::Html(_) => panic!("expected binary relay"),
        }
    }

    #[test]
    fn test_relay_preserves_empty_content_type() {
        let fetched = Fetched {
            content_type: String::new(),
            body: FetchedBody::Bytes(Bytes::from_static(b"raw")),
        };
        match relay(fetched) {
            Relayed::Binary { content_type, .. } => assert_eq!(content_type, ""),
            Relayed::Html(_) => panic!("expected binary relay"),
        }
    }
}

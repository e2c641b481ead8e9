//! HTTP response building module
//!
//! Builders for every response the proxy emits, decoupled from handler
//! logic. Builder failures fall back to a plain response and are logged,
//! never panicked on.

use crate::error::ProxyError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Header marking a base64 body: the body field is base64 text representing
/// raw bytes, not literal content.
pub const BASE64_FLAG_HEADER: &str = "X-Base64-Encoded";

/// Build the error response for a failed proxy invocation.
///
/// Client-input errors carry their message verbatim with status 400; every
/// other failure collapses to 500 with a `Proxy error:` body.
pub fn build_error_response(err: &ProxyError) -> Response<Full<Bytes>> {
    let body = if err.is_client_error() {
        err.to_string()
    } else {
        format!("Proxy error: {err}")
    };

    Response::builder()
        .status(err.status())
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("error", &e);
            Response::new(Full::new(Bytes::from("Proxy error")))
        })
}

/// Build the 200 response for rewritten HTML.
pub fn build_proxied_html_response(html: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = html.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(html) };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("html", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build the 200 response for a base64-encoded binary body.
///
/// The upstream `Content-Type` value is relayed verbatim, including the
/// empty string when the upstream sent none.
pub fn build_proxied_binary_response(
    content_type: &str,
    encoded: String,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = encoded.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(encoded)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header(BASE64_FLAG_HEADER, "true")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("binary", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build health check response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(status.to_string())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from("ok")))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Log response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {kind} response: {error}"));
}

//! HTML rewriting
//!
//! String-level transforms applied to proxied HTML before it is relayed:
//! script-element removal, Content-Security-Policy meta removal, and badge
//! injection. Rewriting is regex-based rather than parser-based, so its
//! behavior on malformed or nested markup matches plain pattern matching.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a full `<script ...>...</script>` element, non-greedy,
/// case-insensitive, with `.` spanning newlines.
static RE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script.*?>.*?</script>").expect("valid script pattern"));

/// Matches a `<meta>` tag whose `http-equiv` is `Content-Security-Policy`,
/// quotes on the attribute value optional.
static RE_CSP_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*http-equiv=["']?Content-Security-Policy["']?[^>]*>"#)
        .expect("valid csp pattern")
});

/// Fixed badge markup injected into every relayed HTML document.
pub const BADGE: &str = r#"<div style="position:fixed;right:8px;bottom:8px;z-index:9999;padding:6px 10px;background:rgba(0,0,0,0.6);color:white;border-radius:6px;font-size:12px;">ZIPPED</div>"#;

const BODY_CLOSE: &str = "</body>";

/// Apply the full rewrite pipeline: scripts out, CSP metas out, badge in.
///
/// Order matters only in that both removals feed the badge injection; each
/// step operates on the previous step's output.
pub fn rewrite_html(html: &str) -> String {
    let stripped = strip_scripts(html);
    let stripped = strip_csp_meta(&stripped);
    inject_badge(&stripped)
}

/// Remove every `<script>` element, including multi-line bodies.
pub fn strip_scripts(html: &str) -> String {
    RE_SCRIPT.replace_all(html, "").into_owned()
}

/// Remove every CSP `<meta>` tag.
pub fn strip_csp_meta(html: &str) -> String {
    RE_CSP_META.replace_all(html, "").into_owned()
}

/// Insert the badge immediately before the first `</body>`, or append it
/// when the document has no closing body tag.
pub fn inject_badge(html: &str) -> String {
    match html.find(BODY_CLOSE) {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + BADGE.len());
            out.push_str(&html[..idx]);
            out.push_str(BADGE);
            out.push_str(&html[idx..]);
            out
        }
        None => {
            let mut out = String::with_capacity(html.len() + BADGE.len());
            out.push_str(html);
            out.push_str(BADGE);
            out
        }
    }
}

//! Browser headers sent with every embed page request.
//!
//! The embed host only serves the player page to requests that look like an
//! iframe load from the broadcaster's site. Keep these values byte-for-byte
//! unless the upstream changes what it checks.

use anyhow::Context;
use reqwest::header::{HOST, HeaderMap, HeaderName, HeaderValue};
use url::Url;

pub const EMBED_HEADERS: &[(&str, &str)] = &[
    ("sec-fetch-dest", "iframe"),
    (
        "user-agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Safari/605.1.15",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("referer", "https://m4sport.hu/"),
    ("sec-fetch-site", "cross-site"),
    ("sec-fetch-mode", "navigate"),
    ("accept-language", "en-GB,en;q=0.9"),
    ("priority", "u=0, i"),
    ("connection", "keep-alive"),
];

/// Build the header set for a request to `url`. `Host` mirrors the URL's
/// authority, everything else comes from [`EMBED_HEADERS`].
pub fn embed_headers(url: &Url) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(EMBED_HEADERS.len() + 1);

    let host = url.host_str().context("embed url has no host")?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    headers.insert(HOST, HeaderValue::from_str(&authority)?);

    for (name, value) in EMBED_HEADERS {
        headers.insert(
            HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("header name {name}"))?,
            HeaderValue::from_static(*value),
        );
    }
    Ok(headers)
}

use super::error::ResolutionError;
use super::request::ResolutionRequest;
use crate::config::EmbedConfig;
use anyhow::Context;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use std::time::Duration;

/// Decoded body of a successful embed page response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument(String);

impl HtmlDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
}

impl Fetcher {
    pub fn new(cfg: &EmbedConfig) -> anyhow::Result<Self> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(cfg.timeout_secs.max(1)));
        if !cfg.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().context("build reqwest client")?;
        Ok(Self { http })
    }

    /// One GET, no retries.
    pub async fn fetch(&self, request: &ResolutionRequest) -> Result<HtmlDocument, ResolutionError> {
        tracing::debug!(url = %request.url, "requesting embed page");

        let resp = self
            .http
            .get(request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await?;

        let status = resp.status();
        let mime = resp
            .headers()
            .get(CONTENT_TYPE)
            .map(declared_media_type);

        // A declared non-HTML type is reported as such whatever the status.
        if let Some(m) = &mime
            && !is_html(m)
        {
            return Err(ResolutionError::UnexpectedContentType(Some(m.clone())));
        }
        if !status.is_success() {
            return Err(ResolutionError::InvalidHttpResponse {
                status: status.as_u16(),
            });
        }
        if mime.is_none() {
            return Err(ResolutionError::UnexpectedContentType(None));
        }

        let body = resp.bytes().await?;
        let text = String::from_utf8(body.to_vec()).map_err(ResolutionError::InvalidHtmlContent)?;
        Ok(HtmlDocument::new(text))
    }
}

/// Header values are not guaranteed to be ASCII; keep what was sent.
fn declared_media_type(value: &HeaderValue) -> String {
    media_type(&String::from_utf8_lossy(value.as_bytes()))
}

/// `text/html; charset=UTF-8` -> `text/html`
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_html(media_type: &str) -> bool {
    media_type == "text/html"
}

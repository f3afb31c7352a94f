//! Channel id -> playable stream URL.
//!
//! The broadcaster's embed page carries the real HLS link inside the player
//! config, next to a pre-roll "bumper" clip. Resolution fetches that page
//! with browser-like headers and picks the first usable `"file"` entry.

pub mod error;
pub mod extract;
pub mod fetch;
pub mod headers;
pub mod request;

pub use error::ResolutionError;
pub use extract::ResolvedStream;
pub use request::Channel;

use crate::config::EmbedConfig;
use fetch::Fetcher;
use request::ResolutionRequest;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Resolver {
    embed_base: String,
    fetcher: Fetcher,
}

impl Resolver {
    pub fn new(cfg: &EmbedConfig) -> anyhow::Result<Self> {
        Ok(Self {
            embed_base: cfg.base_url.clone(),
            fetcher: Fetcher::new(cfg)?,
        })
    }

    /// Fetch the channel's embed page and extract its stream. Errors from
    /// either step are returned as-is.
    pub async fn resolve(&self, channel: &Channel) -> Result<ResolvedStream, ResolutionError> {
        tracing::info!(%channel, "starting video loading process");
        let request = ResolutionRequest::for_channel(&self.embed_base, channel)?;

        let started = Instant::now();
        let document = self.fetcher.fetch(&request).await?;
        let stream = extract::extract(&document)?;

        tracing::info!(
            %channel,
            url = %stream,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "resolved stream"
        );
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubResponse, serve};

    fn resolver(base: &str) -> Resolver {
        Resolver::new(&EmbedConfig {
            base_url: base.to_string(),
            timeout_secs: 5,
            system_proxy: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_stream_from_embed_page() {
        let page = r#"<html><script>
            pl.setup({"playlist":[
                {"file": "https:\/\/cdn.example\/bumper\/m4_intro.mp4"},
                {"file": "https:\/\/cdn.example\/live\/mtv4live\/index.m3u8?v=5iip:1.2.3.4"}
            ]});
        </script></html>"#;
        let mut server = serve(StubResponse::html(page)).await;

        let stream = resolver(&server.base_url)
            .resolve(&Channel::new("mtv4live"))
            .await
            .unwrap();
        assert_eq!(stream.as_str(), "https://cdn.example/live/mtv4live/index.m3u8");

        let raw = server.requests.recv().await.unwrap();
        assert!(raw.contains("video=mtv4live&noflash=yes"));
    }

    #[tokio::test]
    async fn test_empty_page_is_not_found() {
        let server = serve(StubResponse::html("")).await;
        let err = resolver(&server.base_url)
            .resolve(&Channel::new("mtv1live"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::VideoUrlNotFound));
    }

    #[tokio::test]
    async fn test_http_error_passes_through() {
        let server = serve(StubResponse {
            status: 404,
            ..StubResponse::html("gone")
        })
        .await;
        let err = resolver(&server.base_url)
            .resolve(&Channel::new("mtv1live"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidHttpResponse { status: 404 }));
    }

    #[tokio::test]
    async fn test_invalid_base_fails_before_fetch() {
        let err = resolver("::nope::")
            .resolve(&Channel::new("mtv1live"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidUrl(_)));
    }
}

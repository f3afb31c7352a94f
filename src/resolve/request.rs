use super::error::ResolutionError;
use super::headers;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Channel identifier as the embed player knows it, e.g. `mtv4live`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ready-to-send GET for one channel's embed page.
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

impl ResolutionRequest {
    /// `<embed_base>?video=<channel>&noflash=yes` plus the pinned header set.
    pub fn for_channel(embed_base: &str, channel: &Channel) -> Result<Self, ResolutionError> {
        let id = channel.as_str();
        if id.is_empty() || id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ResolutionError::InvalidUrl(format!("bad channel id {id:?}")));
        }

        let mut url = Url::parse(embed_base)
            .map_err(|e| ResolutionError::InvalidUrl(format!("{embed_base}: {e}")))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ResolutionError::InvalidUrl(embed_base.to_string()));
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("video", id)
            .append_pair("noflash", "yes");

        let headers = headers::embed_headers(&url)
            .map_err(|e| ResolutionError::InvalidUrl(format!("{e:#}")))?;
        Ok(Self { url, headers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://player.mediaklikk.hu/playernew/player.php";

    #[test]
    fn test_embed_url_shape() {
        let req = ResolutionRequest::for_channel(BASE, &Channel::new("mtv4live")).unwrap();
        assert_eq!(
            req.url.as_str(),
            "https://player.mediaklikk.hu/playernew/player.php?video=mtv4live&noflash=yes"
        );
        assert_eq!(req.headers.get("host").unwrap(), "player.mediaklikk.hu");
    }

    #[test]
    fn test_rejects_bad_channel_ids() {
        for id in ["", "mtv 1", "mtv\n1"] {
            let err = ResolutionRequest::for_channel(BASE, &Channel::new(id)).unwrap_err();
            assert!(matches!(err, ResolutionError::InvalidUrl(_)), "{id:?}");
        }
    }

    #[test]
    fn test_rejects_unparsable_base() {
        let err = ResolutionRequest::for_channel("not a url", &Channel::new("mtv1live")).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidUrl(_)));

        let err = ResolutionRequest::for_channel("mailto:tv@example.com", &Channel::new("mtv1live"))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidUrl(_)));
    }
}

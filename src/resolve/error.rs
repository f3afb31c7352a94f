use std::sync::Arc;

/// Everything that can end a resolution attempt, plus the asynchronous
/// playback failure reported by the player after a stream started.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolutionError {
    #[error("Invalid URL for fetching HTML content: {0}")]
    InvalidUrl(String),

    #[error("Network is unavailable")]
    NetworkUnavailable,

    #[error("Network error: {0}")]
    Network(#[source] Arc<reqwest::Error>),

    #[error("Invalid HTTP response. Status code: {status}")]
    InvalidHttpResponse { status: u16 },

    #[error("Unexpected content type received: {}", .0.as_deref().unwrap_or("<none>"))]
    UnexpectedContentType(Option<String>),

    #[error("Invalid HTML content received")]
    InvalidHtmlContent(#[source] std::string::FromUtf8Error),

    #[error("Video URL not found in HTML content")]
    VideoUrlNotFound,

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Playback error: {0}")]
    Playback(String),
}

impl From<reqwest::Error> for ResolutionError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(Arc::new(e))
    }
}

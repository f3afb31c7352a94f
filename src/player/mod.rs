pub mod mpv;

use url::Url;

/// Playback backend driven by the app loop. Failures after a stream started
/// arrive separately, as `PlayerEvent::Failed` on the app's event channel.
pub trait Player: Send + Sync {
    /// Replace whatever is loaded with `url` and start playing.
    fn start(&self, url: &Url) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn pause(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Seek the loaded stream back to zero and play.
    fn restart(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

use super::events::Event;
use crate::config::{ChannelEntry, NetworkConfig};
use crate::net::{MonitorHandle, monitor};
use crate::resolve::Resolver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Pending {
    attempt: u64,
    task: JoinHandle<()>,
}

/// One active channel: its connectivity monitor and at most one in-flight
/// resolution. Dropping the session stops both.
#[derive(Debug)]
pub struct ChannelSession {
    id: u64,
    entry: ChannelEntry,
    _monitor: MonitorHandle,
    attempts: u64,
    pending: Option<Pending>,
}

impl ChannelSession {
    pub fn start(
        id: u64,
        entry: ChannelEntry,
        network: &NetworkConfig,
        tx: mpsc::Sender<Event>,
    ) -> Self {
        tracing::info!(session = id, channel = %entry.id, "session started");
        Self {
            id,
            entry,
            _monitor: monitor::start(network, id, tx),
            attempts: 0,
            pending: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn entry(&self) -> &ChannelEntry {
        &self.entry
    }

    /// Spawn a resolution, superseding any attempt still in flight.
    pub fn begin_attempt(&mut self, resolver: &Resolver, tx: &mpsc::Sender<Event>) -> u64 {
        self.cancel_pending();
        self.attempts += 1;

        let (session, attempt) = (self.id, self.attempts);
        let resolver = resolver.clone();
        let channel = self.entry.id.clone();
        let tx = tx.clone();
        let task = tokio::spawn(async move {
            let result = resolver.resolve(&channel).await;
            let _ = tx
                .send(Event::Resolved {
                    session,
                    attempt,
                    result,
                })
                .await;
        });

        self.pending = Some(Pending { attempt, task });
        attempt
    }

    /// Abort the in-flight attempt; a result it already queued is then stale.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(p) => {
                tracing::debug!(session = self.id, attempt = p.attempt, "cancelling resolution");
                p.task.abort();
                true
            }
            None => false,
        }
    }

    /// Claim the result of `attempt` if it is the one in flight.
    pub fn complete(&mut self, attempt: u64) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.attempt == attempt) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for ChannelSession {
    fn drop(&mut self) {
        self.cancel_pending();
        tracing::info!(session = self.id, channel = %self.entry.id, "session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbedConfig;
    use crate::resolve::Channel;

    fn offline_network() -> NetworkConfig {
        NetworkConfig {
            probe_enabled: false,
            ..NetworkConfig::default()
        }
    }

    fn entry() -> ChannelEntry {
        ChannelEntry {
            tag: "M1".into(),
            id: Channel::new("mtv1live"),
        }
    }

    // Port 9 (discard) is closed on test hosts; attempts fail fast or get aborted.
    fn local_resolver() -> Resolver {
        Resolver::new(&EmbedConfig {
            base_url: "http://127.0.0.1:9/player.php".into(),
            timeout_secs: 1,
            system_proxy: false,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_only_latest_attempt_completes() {
        let (tx, _rx) = mpsc::channel(16);
        let resolver = local_resolver();
        let mut session = ChannelSession::start(1, entry(), &offline_network(), tx.clone());

        let first = session.begin_attempt(&resolver, &tx);
        let second = session.begin_attempt(&resolver, &tx);
        assert_ne!(first, second);
        assert!(!session.complete(first));
        assert!(session.complete(second));
        assert!(!session.complete(second));
    }

    #[tokio::test]
    async fn test_cancel_invalidates_attempt() {
        let (tx, _rx) = mpsc::channel(16);
        let resolver = local_resolver();
        let mut session = ChannelSession::start(3, entry(), &offline_network(), tx.clone());

        let attempt = session.begin_attempt(&resolver, &tx);
        assert!(session.cancel_pending());
        assert!(!session.cancel_pending());
        assert!(!session.complete(attempt));
        assert_eq!(session.id(), 3);
    }
}

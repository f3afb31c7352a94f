use crate::app::events::Event;
use crate::config::NetworkConfig;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    Unreachable,
}

/// Turns raw probe results into reported transitions.
///
/// The first observation is always reported. Losing the network is reported
/// at once; getting it back only after it held for `settle`, so a flapping
/// link cannot fire a resolution on every probe.
#[derive(Debug)]
pub struct Debouncer {
    settle: Duration,
    reported: Option<Reachability>,
    reachable_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            reported: None,
            reachable_since: None,
        }
    }

    pub fn observe(&mut self, status: Reachability, now: Instant) -> Option<Reachability> {
        match (self.reported, status) {
            (Some(prev), s) if prev == s => {
                self.reachable_since = None;
                None
            }
            (Some(_), Reachability::Reachable) => {
                let since = *self.reachable_since.get_or_insert(now);
                if now.duration_since(since) >= self.settle {
                    self.report(Reachability::Reachable)
                } else {
                    None
                }
            }
            (None, s) | (Some(_), s @ Reachability::Unreachable) => self.report(s),
        }
    }

    pub fn is_settling(&self) -> bool {
        self.reachable_since.is_some()
    }

    fn report(&mut self, status: Reachability) -> Option<Reachability> {
        self.reported = Some(status);
        self.reachable_since = None;
        Some(status)
    }
}

/// Owns the probe task of one channel session. Dropping it stops monitoring.
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start watching reachability for `session`; transitions arrive on `tx` as
/// [`Event::Connectivity`].
pub fn start(cfg: &NetworkConfig, session: u64, tx: mpsc::Sender<Event>) -> MonitorHandle {
    let task = if cfg.probe_enabled {
        tokio::spawn(probe_loop(cfg.clone(), session, tx))
    } else {
        tokio::spawn(async move {
            let _ = tx
                .send(Event::Connectivity {
                    session,
                    status: Reachability::Reachable,
                })
                .await;
        })
    };
    MonitorHandle { task }
}

async fn probe_loop(cfg: NetworkConfig, session: u64, tx: mpsc::Sender<Event>) {
    let interval = Duration::from_secs(cfg.probe_interval_secs.max(1));
    let settle = Duration::from_secs(cfg.settle_secs);
    let timeout = Duration::from_secs(cfg.probe_timeout_secs.max(1));
    let mut debouncer = Debouncer::new(settle);

    loop {
        let status = probe(&cfg.probe_host, cfg.probe_port, timeout).await;
        if let Some(change) = debouncer.observe(status, Instant::now()) {
            tracing::info!(session, ?change, "network path changed");
            if tx
                .send(Event::Connectivity {
                    session,
                    status: change,
                })
                .await
                .is_err()
            {
                break;
            }
        }

        let wait = if debouncer.is_settling() {
            settle.min(interval)
        } else {
            interval
        };
        tokio::time::sleep(wait).await;
    }
}

/// A TCP handshake with the embed host stands in for "path satisfied".
pub async fn probe(host: &str, port: u16, timeout: Duration) -> Reachability {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => Reachability::Reachable,
        Ok(Err(e)) => {
            tracing::debug!(host, port, error = %e, "probe failed");
            Reachability::Unreachable
        }
        Err(_) => {
            tracing::debug!(host, port, "probe timed out");
            Reachability::Unreachable
        }
    }
}

pub mod actions;
pub mod events;
pub mod session;
pub mod state;

use crate::config::{ChannelEntry, Config};
use crate::net::Reachability;
use crate::player::Player;
use crate::resolve::{ResolutionError, ResolvedStream, Resolver};
use actions::Action;
use events::{Event, Notice, PlayerEvent};
use session::ChannelSession;
use state::AppState;
use tokio::sync::mpsc;

/// Drives one channel at a time. All state changes happen inside [`App::run`];
/// network probes, resolutions and the player report back through `Event`s.
pub struct App<P: Player> {
    cfg: Config,
    resolver: Resolver,
    player: P,
    state: AppState,
    session: Option<ChannelSession>,
    sessions_started: u64,
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
    notices: mpsc::Sender<Notice>,
}

impl<P: Player> App<P> {
    pub fn new(
        cfg: Config,
        player: P,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        notices: mpsc::Sender<Notice>,
    ) -> anyhow::Result<Self> {
        let resolver = Resolver::new(&cfg.embed)?;
        Ok(Self {
            cfg,
            resolver,
            player,
            state: AppState::default(),
            session: None,
            sessions_started: 0,
            tx,
            rx,
            notices,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(&mut self, channel: ChannelEntry) -> anyhow::Result<()> {
        self.select_channel(channel).await;

        while let Some(ev) = self.rx.recv().await {
            match ev {
                Event::Input(action) => self.handle_action(action).await,
                Event::Player(pe) => self.handle_player(pe).await,
                Event::Connectivity { session, status } => {
                    self.handle_connectivity(session, status).await;
                }
                Event::Resolved {
                    session,
                    attempt,
                    result,
                } => self.handle_resolved(session, attempt, result).await,
            }

            if self.state.should_quit {
                break;
            }
        }

        self.session = None;
        Ok(())
    }

    async fn select_channel(&mut self, entry: ChannelEntry) {
        // Ends the old session: monitor stopped, pending resolution aborted.
        self.session = None;
        if self.state.stream.is_some()
            && let Err(e) = self.player.pause().await
        {
            tracing::warn!(error = %format!("{e:#}"), "pause on channel switch failed");
        }

        self.sessions_started += 1;
        self.session = Some(ChannelSession::start(
            self.sessions_started,
            entry.clone(),
            &self.cfg.network,
            self.tx.clone(),
        ));
        self.state.reset_for(entry.clone());
        tracing::info!(tag = %entry.tag, channel = %entry.id, "channel selected");
        self.notify(Notice::ChannelSelected(entry)).await;
    }

    async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Play if self.state.stream.is_some() => {
                match self.player.restart().await {
                    Ok(()) => self.state.paused = false,
                    Err(e) => tracing::warn!(error = %format!("{e:#}"), "restart failed"),
                }
            }
            Action::Play | Action::Retry => {
                if self.state.is_offline() {
                    self.fail(ResolutionError::NetworkUnavailable).await;
                } else {
                    self.start_resolution().await;
                }
            }
            Action::Pause => match self.player.pause().await {
                Ok(()) => {
                    self.state.paused = true;
                    self.notify(Notice::Paused).await;
                }
                Err(e) => tracing::warn!(error = %format!("{e:#}"), "pause failed"),
            },
            Action::Switch(name) => match self.cfg.find_channel(&name).cloned() {
                Some(entry) if self.state.channel.as_ref() == Some(&entry) => {
                    tracing::debug!(tag = %entry.tag, "already on channel");
                }
                Some(entry) => self.select_channel(entry).await,
                None => self.notify(Notice::UnknownChannel(name)).await,
            },
            Action::Quit => self.state.should_quit = true,
        }
    }

    async fn handle_connectivity(&mut self, session: u64, status: Reachability) {
        if !self.is_current_session(session) {
            tracing::debug!(session, ?status, "ignoring connectivity for ended session");
            return;
        }
        self.state.reachability = Some(status);

        match status {
            Reachability::Reachable => self.start_resolution().await,
            Reachability::Unreachable => {
                if let Some(s) = self.session.as_mut() {
                    s.cancel_pending();
                }
                self.fail(ResolutionError::NetworkUnavailable).await;
            }
        }
    }

    async fn handle_resolved(
        &mut self,
        session: u64,
        attempt: u64,
        result: Result<ResolvedStream, ResolutionError>,
    ) {
        let Some(s) = self.session.as_mut().filter(|s| s.id() == session) else {
            tracing::debug!(session, attempt, "discarding resolution for ended session");
            return;
        };
        if !s.complete(attempt) {
            tracing::debug!(session, attempt, "discarding superseded resolution");
            return;
        }
        let channel = s.entry().id.clone();

        match result {
            Ok(stream) => match self.player.start(stream.url()).await {
                Ok(()) => {
                    self.state.stream = Some(stream.clone());
                    self.state.paused = false;
                    self.state.last_error = None;
                    self.notify(Notice::Playing { channel, stream }).await;
                }
                Err(e) => self.fail(ResolutionError::Playback(format!("{e:#}"))).await,
            },
            Err(e) => self.fail(e).await,
        }
    }

    async fn handle_player(&mut self, pe: PlayerEvent) {
        match pe {
            PlayerEvent::Started => self.state.paused = false,
            PlayerEvent::Paused => self.state.paused = true,
            // The player is idle afterwards; `play` has to resolve again.
            PlayerEvent::Ended => {
                tracing::info!("playback ended");
                self.state.stream = None;
            }
            PlayerEvent::Failed(reason) if self.state.stream.is_some() => {
                self.state.stream = None;
                self.fail(ResolutionError::Playback(reason)).await;
            }
            PlayerEvent::Failed(reason) => {
                tracing::debug!(%reason, "player failure with no stream loaded");
            }
        }
    }

    async fn start_resolution(&mut self) {
        let Some(s) = self.session.as_mut() else {
            return;
        };
        s.begin_attempt(&self.resolver, &self.tx);
        let channel = s.entry().id.clone();
        self.notify(Notice::Resolving(channel)).await;
    }

    async fn fail(&mut self, error: ResolutionError) {
        tracing::error!(error = %error, "video player error");
        self.state.last_error = Some(error.clone());
        self.notify(Notice::Failed(error)).await;
    }

    async fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice).await;
    }

    fn is_current_session(&self, session: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.id() == session)
    }
}

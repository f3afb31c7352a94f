use crate::config::ChannelEntry;
use crate::net::Reachability;
use crate::resolve::{ResolutionError, ResolvedStream};

#[derive(Debug, Default)]
pub struct AppState {
    pub channel: Option<ChannelEntry>,
    pub reachability: Option<Reachability>,
    pub stream: Option<ResolvedStream>,
    pub last_error: Option<ResolutionError>,
    pub paused: bool,
    pub should_quit: bool,
}

impl AppState {
    /// Forget everything tied to the previous channel.
    pub fn reset_for(&mut self, channel: ChannelEntry) {
        self.channel = Some(channel);
        self.reachability = None;
        self.stream = None;
        self.last_error = None;
        self.paused = false;
    }

    pub fn is_offline(&self) -> bool {
        self.reachability == Some(Reachability::Unreachable)
    }
}

use super::actions::Action;
use crate::config::ChannelEntry;
use crate::net::Reachability;
use crate::resolve::{Channel, ResolutionError, ResolvedStream};

/// Everything the app loop reacts to. Producers run on their own tasks; only
/// the loop touches app state.
#[derive(Debug)]
pub enum Event {
    Input(Action),
    Player(PlayerEvent),
    Connectivity {
        session: u64,
        status: Reachability,
    },
    Resolved {
        session: u64,
        attempt: u64,
        result: Result<ResolvedStream, ResolutionError>,
    },
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Started,
    Paused,
    Ended,
    Failed(String),
}

/// What the app reports outward for display.
#[derive(Debug, Clone)]
pub enum Notice {
    ChannelSelected(ChannelEntry),
    UnknownChannel(String),
    Resolving(Channel),
    Playing {
        channel: Channel,
        stream: ResolvedStream,
    },
    Paused,
    Failed(ResolutionError),
}

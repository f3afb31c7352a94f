#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Resume the loaded stream from the start, or resolve one if none is loaded.
    Play,
    Pause,
    /// Resolve the current channel again.
    Retry,
    /// Switch to a configured channel by tag or id.
    Switch(String),
    Quit,
}

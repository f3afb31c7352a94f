use super::{ChannelEntry, Config, EmbedConfig, NetworkConfig, PathsConfig, PlayerConfig};
use crate::resolve::Channel;

pub const EMBED_BASE_URL: &str = "https://player.mediaklikk.hu/playernew/player.php";
pub const PROBE_HOST: &str = "player.mediaklikk.hu";

pub fn defaults() -> Config {
    Config {
        default_channel: "M4".to_string(),
        embed: EmbedConfig::default(),
        network: NetworkConfig::default(),
        player: PlayerConfig::default(),
        paths: PathsConfig::default(),
        channels: vec![
            ChannelEntry {
                tag: "M1".to_string(),
                id: Channel::new("mtv1live"),
            },
            ChannelEntry {
                tag: "M4".to_string(),
                id: Channel::new("mtv4live"),
            },
        ],
    }
}

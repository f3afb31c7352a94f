use crate::resolve::Channel;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag of the channel `watch` starts on.
    pub default_channel: String,
    pub embed: EmbedConfig,
    pub network: NetworkConfig,
    pub player: PlayerConfig,
    pub paths: PathsConfig,
    pub channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Embed player page; `video` and `noflash` are appended per channel.
    pub base_url: String,
    /// Whole-request timeout for the embed page fetch.
    pub timeout_secs: u64,
    /// Honor HTTP(S)_PROXY / NO_PROXY from the environment.
    pub system_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// When off, the network is assumed reachable for the whole session.
    pub probe_enabled: bool,
    pub probe_host: String,
    pub probe_port: u16,
    pub probe_interval_secs: u64,
    pub probe_timeout_secs: u64,
    /// How long reachability must hold before it is reported as regained.
    pub settle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub fullscreen: bool,
    /// Volume level (0-100)
    pub volume: u8,
    /// Write mpv's own log to `<data_dir>/mpv.log`.
    pub log_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Short name shown to the user ("M4").
    pub tag: String,
    pub id: Channel,
}

impl Config {
    /// Look a channel up by tag (case-insensitive) or by its embed id.
    pub fn find_channel(&self, name: &str) -> Option<&ChannelEntry> {
        self.channels
            .iter()
            .find(|c| c.tag.eq_ignore_ascii_case(name) || c.id.as_str() == name)
    }

    /// Configured channel, or `name` taken as a raw embed id.
    pub fn channel_or_raw(&self, name: &str) -> ChannelEntry {
        self.find_channel(name).cloned().unwrap_or_else(|| ChannelEntry {
            tag: name.to_string(),
            id: Channel::new(name),
        })
    }

    pub fn default_entry(&self) -> anyhow::Result<ChannelEntry> {
        self.find_channel(&self.default_channel)
            .or_else(|| self.channels.first())
            .cloned()
            .context("no channels configured")
    }
}

impl Default for Config {
    fn default() -> Self {
        defaults::defaults()
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::EMBED_BASE_URL.to_string(),
            timeout_secs: 15,
            system_proxy: true,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_host: defaults::PROBE_HOST.to_string(),
            probe_port: 443,
            probe_interval_secs: 5,
            probe_timeout_secs: 3,
            settle_secs: 2,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fullscreen: true,
            volume: 80,
            log_file: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("hu", "magyartv", "magyartv");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("magyartv"));
        Self { data_dir }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("hu", "magyartv", "magyartv").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

/// Read the config, writing the defaults out first if the file is missing.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&cfg, &path)?;
        tracing::info!(path = %path.display(), "wrote default config");
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

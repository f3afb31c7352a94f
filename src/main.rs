mod app;
mod config;
mod input;
mod net;
mod player;
mod resolve;
#[cfg(test)]
mod testing;

use anyhow::Context;
use app::events::{Event, Notice};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "magyartv", version, about = "Watch Hungarian live TV channels in mpv")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a channel (default). Type play, pause, retry, a channel tag or quit on stdin.
    Watch {
        /// Channel tag (e.g. M4) or raw embed id (e.g. mtv4live).
        channel: Option<String>,
    },
    /// Print a channel's resolved stream URL (headless).
    Resolve { channel: Option<String> },
    /// List configured channels.
    Channels,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Watch { channel: None }) {
        Command::Watch { channel } => {
            let entry = pick_channel(&cfg, channel.as_deref())?;
            watch(cfg, entry).await?;
        }
        Command::Resolve { channel } => {
            let entry = pick_channel(&cfg, channel.as_deref())?;
            let resolver = resolve::Resolver::new(&cfg.embed)?;
            let stream = resolver
                .resolve(&entry.id)
                .await
                .with_context(|| format!("resolve {}", entry.tag))?;
            println!("{stream}");
        }
        Command::Channels => {
            for c in &cfg.channels {
                let marker = if c.tag.eq_ignore_ascii_case(&cfg.default_channel) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {:<4} {}", c.tag, c.id);
            }
        }
    }

    Ok(())
}

fn pick_channel(cfg: &config::Config, name: Option<&str>) -> anyhow::Result<config::ChannelEntry> {
    match name {
        Some(n) => Ok(cfg.channel_or_raw(n)),
        None => cfg.default_entry(),
    }
}

async fn watch(cfg: config::Config, entry: config::ChannelEntry) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<Event>(256);

    let mpv_log = cfg.player.log_file.then(|| cfg.paths.data_dir.join("mpv.log"));
    if mpv_log.is_some() {
        std::fs::create_dir_all(&cfg.paths.data_dir)
            .with_context(|| format!("create dir {}", cfg.paths.data_dir.display()))?;
    }
    let mpv = player::mpv::MpvHandle::spawn(tx.clone(), &cfg.player, mpv_log.as_deref())
        .await
        .context("start mpv")?;

    let (notice_tx, notice_rx) = mpsc::channel::<Notice>(64);
    tokio::spawn(print_notices(notice_rx));
    input::spawn_input_task(tx.clone());

    let mut app = app::App::new(cfg, mpv, tx, rx, notice_tx)?;
    app.run(entry).await?;
    if let Some(e) = &app.state().last_error {
        tracing::info!(error = %e, "exiting after error");
    }
    Ok(())
}

async fn print_notices(mut rx: mpsc::Receiver<Notice>) {
    while let Some(n) = rx.recv().await {
        match n {
            Notice::ChannelSelected(entry) => println!("Channel: {}", entry.tag),
            Notice::UnknownChannel(name) => println!("Unknown channel: {name}"),
            Notice::Resolving(channel) => println!("Loading {channel}..."),
            Notice::Playing { channel, stream } => println!("Playing {channel}: {stream}"),
            Notice::Paused => println!("Paused"),
            Notice::Failed(e) => println!("Error: {e}"),
        }
    }
}

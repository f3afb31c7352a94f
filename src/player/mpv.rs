use super::Player;
use crate::app::events::{Event, PlayerEvent};
use crate::config::PlayerConfig;
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};
use url::Url;

#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
}

impl MpvHandle {
    pub async fn spawn(
        event_tx: mpsc::Sender<Event>,
        cfg: &PlayerConfig,
        log_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let socket_path =
            std::env::temp_dir().join(format!("magyartv-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args([
            "--idle=yes",
            "--force-window=yes",
            "--input-terminal=no",
            "--really-quiet",
            "--keep-open=no",
        ]);
        if cfg.fullscreen {
            cmd.arg("--fs");
        }
        cmd.arg(format!("--volume={}", cfg.volume.min(100)));
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        // mpv creates the socket shortly after starting.
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        tokio::spawn(read_events_loop(reader, event_tx));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
        };

        this.command(json!({"command":["request_log_messages", "error"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "pause"]}))
            .await?;
        this.command(json!({"command":["observe_property", 2, "eof-reached"]}))
            .await?;

        Ok(this)
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tag requests so failures come back as structured replies.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl Player for MpvHandle {
    async fn start(&self, url: &Url) -> anyhow::Result<()> {
        self.command(json!({"command":["loadfile", url.as_str(), "replace"]}))
            .await?;
        self.command(json!({"command":["set_property", "pause", false]}))
            .await
    }

    async fn pause(&self) -> anyhow::Result<()> {
        self.command(json!({"command":["set_property", "pause", true]}))
            .await
    }

    async fn restart(&self) -> anyhow::Result<()> {
        self.command(json!({"command":["seek", 0, "absolute"]}))
            .await?;
        self.command(json!({"command":["set_property", "pause", false]}))
            .await
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect_with_retry(path: &PathBuf) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(reader: tokio::io::ReadHalf<UnixStream>, event_tx: mpsc::Sender<Event>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        if let Some(pe) = map_mpv_event(&v)
            && event_tx.send(Event::Player(pe)).await.is_err()
        {
            break;
        }
    }
    tracing::debug!("mpv ipc closed");
}

fn map_mpv_event(v: &serde_json::Value) -> Option<PlayerEvent> {
    // Command replies: {"request_id":..., "error":"..."}
    if v.get("request_id").is_some() {
        let err = v.get("error")?.as_str()?;
        if err != "success" {
            tracing::warn!(error = err, "mpv command failed");
        }
        return None;
    }

    match v.get("event")?.as_str()? {
        "property-change" => match v.get("name")?.as_str()? {
            "pause" => {
                let paused = v.get("data")?.as_bool().unwrap_or(false);
                Some(if paused {
                    PlayerEvent::Paused
                } else {
                    PlayerEvent::Started
                })
            }
            "eof-reached" => {
                let eof = v.get("data")?.as_bool().unwrap_or(false);
                if eof { Some(PlayerEvent::Ended) } else { None }
            }
            _ => None,
        },
        "end-file" => {
            // reason=error is mpv's "failed to play to end".
            let reason = v.get("reason").and_then(|x| x.as_str()).unwrap_or("");
            match reason {
                "error" => {
                    let err = v.get("file_error").or_else(|| v.get("error"));
                    let err = err.and_then(|x| x.as_str()).unwrap_or("unknown");
                    Some(PlayerEvent::Failed(err.to_string()))
                }
                "eof" => Some(PlayerEvent::Ended),
                _ => None,
            }
        }
        "log-message" => {
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if !text.is_empty() {
                let prefix = v.get("prefix").and_then(|x| x.as_str()).unwrap_or("mpv");
                tracing::warn!(target: "mpv", "{prefix}: {text}");
            }
            None
        }
        _ => None,
    }
}

//! mpv-backed music-video playback over its JSON IPC socket.
//!
//! mpv is spawned once per session and fed YouTube URLs as tracks change.
//! Observed properties (`time-pos`, `pause`) are cached into a shared
//! status cell so the synchronizer can read them without a round trip;
//! transport commands go out fire-and-forget through a writer task.

use crate::player::{MediaPlayer, PlayerStatus};
use anyhow::Context;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Observed {
    position_secs: Option<f64>,
    paused: bool,
}

/// Kills mpv and removes the socket when the last handle goes away.
#[derive(Debug)]
struct ProcessGuard {
    child: Child,
    socket_path: PathBuf,
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[derive(Debug, Clone)]
pub struct MpvPlayer {
    commands: mpsc::UnboundedSender<serde_json::Value>,
    observed: Arc<Mutex<Observed>>,
    _process: Arc<ProcessGuard>,
}

impl MpvPlayer {
    pub async fn spawn() -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join("chorus-mpv.sock");
        let _ = std::fs::remove_file(&socket_path);

        let child = Command::new("mpv")
            .args([
                "--idle=yes",
                "--really-quiet",
                "--input-terminal=no",
                "--force-window=yes",
                // The video is a visual companion; Spotify owns the audio.
                "--mute=yes",
            ])
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        // mpv creates the socket shortly after starting.
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        let observed = Arc::new(Mutex::new(Observed::default()));
        let (commands, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(write_commands_loop(writer, command_rx));
        tokio::spawn(read_events_loop(reader, observed.clone()));

        let player = Self {
            commands,
            observed,
            _process: Arc::new(ProcessGuard { child, socket_path }),
        };

        player.send(json!({"command": ["observe_property", 1, "time-pos"]}));
        player.send(json!({"command": ["observe_property", 2, "pause"]}));

        Ok(player)
    }

    /// Replace whatever is playing with the given YouTube video.
    pub fn load_video(&self, video_id: &str) {
        // The previous video's position must not leak into drift checks
        // while the new one loads.
        self.observed.lock().unwrap().position_secs = None;
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        self.send(json!({"command": ["loadfile", url, "replace"]}));
    }

    fn send(&self, command: serde_json::Value) {
        let _ = self.commands.send(command);
    }
}

impl MediaPlayer for MpvPlayer {
    fn status(&self) -> Option<PlayerStatus> {
        let observed = self.observed.lock().unwrap();
        observed.position_secs.map(|position_secs| PlayerStatus {
            position_secs,
            playing: !observed.paused,
        })
    }

    fn play(&self) {
        self.send(json!({"command": ["set_property", "pause", false]}));
    }

    fn pause(&self) {
        self.send(json!({"command": ["set_property", "pause", true]}));
    }

    fn seek_to(&self, seconds: f64) {
        self.send(json!({"command": ["seek", seconds, "absolute"]}));
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

async fn write_commands_loop(
    mut writer: WriteHalf<UnixStream>,
    mut command_rx: mpsc::UnboundedReceiver<serde_json::Value>,
) {
    while let Some(command) = command_rx.recv().await {
        let Ok(mut line) = serde_json::to_vec(&command) else {
            continue;
        };
        line.push(b'\n');
        if writer.write_all(&line).await.is_err() {
            break;
        }
        let _ = writer.flush().await;
    }
}

async fn read_events_loop(reader: ReadHalf<UnixStream>, observed: Arc<Mutex<Observed>>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };

        // Command replies: {"request_id":..., "error":"..."}
        if let Some(err) = v.get("error").and_then(|e| e.as_str())
            && err != "success"
        {
            tracing::warn!("mpv ipc error: {err}");
        }

        if v.get("event").and_then(|e| e.as_str()) != Some("property-change") {
            continue;
        }
        match v.get("name").and_then(|n| n.as_str()) {
            Some("time-pos") => {
                observed.lock().unwrap().position_secs =
                    v.get("data").and_then(|d| d.as_f64());
            }
            Some("pause") => {
                if let Some(paused) = v.get("data").and_then(|d| d.as_bool()) {
                    observed.lock().unwrap().paused = paused;
                }
            }
            _ => {}
        }
    }
}

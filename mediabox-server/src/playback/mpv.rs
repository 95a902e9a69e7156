//! mpv-backed [`Player`] over mpv's JSON IPC socket
//!
//! Commands are newline-delimited JSON objects tagged with a `request_id`;
//! replies carry the same id. Everything else arriving on the socket is an
//! asynchronous event, translated into [`PlaybackEvent`]s.

use async_trait::async_trait;
use mediabox_common::events::{PlaybackEvent, PlayerStatus, SeekInfo};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Player;
use crate::error::{Error, Result};

/// Properties observed for event reporting, with their observer ids
const OBSERVED_PROPERTIES: &[(u64, &str)] = &[
    (1, "time-pos"),
    (2, "pause"),
    (3, "mute"),
    (4, "duration"),
    (5, "volume"),
    (6, "filename"),
    (7, "path"),
    (8, "media-title"),
    (9, "playlist-pos"),
    (10, "playlist-count"),
    (11, "loop"),
];

/// How to launch mpv
#[derive(Debug, Clone)]
pub struct MpvOptions {
    /// mpv executable
    pub binary: String,
    /// IPC socket path passed to `--input-ipc-server`
    pub socket_path: PathBuf,
    /// How long to wait for the socket to appear after launch
    pub startup_timeout: Duration,
    /// How long to wait for a command reply
    pub request_timeout: Duration,
}

impl Default for MpvOptions {
    fn default() -> Self {
        Self {
            binary: "mpv".to_string(),
            socket_path: std::env::temp_dir().join("mediabox-mpv.sock"),
            startup_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }
}

type ReplyResult = std::result::Result<Value, String>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<ReplyResult>>>>;

fn lock_pending(pending: &Pending) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<ReplyResult>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Player controlling an mpv process
pub struct MpvPlayer {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: Pending,
    next_request_id: AtomicU64,
    process: tokio::sync::Mutex<Option<Child>>,
    reader: JoinHandle<()>,
    request_timeout: Duration,
}

impl MpvPlayer {
    /// Launch an idle, audio-only mpv and connect to its IPC socket
    pub async fn spawn(
        options: &MpvOptions,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<Self> {
        // A stale socket from a previous run would make the connect succeed too early
        let _ = tokio::fs::remove_file(&options.socket_path).await;

        let child = Command::new(&options.binary)
            .arg("--idle=yes")
            .arg("--no-video")
            .arg("--no-terminal")
            .arg(format!(
                "--input-ipc-server={}",
                options.socket_path.display()
            ))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Player(format!("Failed to start {}: {}", options.binary, e)))?;

        info!("Started {} (pid {:?})", options.binary, child.id());

        let stream = wait_for_socket(&options.socket_path, options.startup_timeout).await?;
        let player = Self::from_stream(stream, events, Some(child), options.request_timeout);
        player.observe_properties().await?;
        Ok(player)
    }

    fn from_stream(
        stream: UnixStream,
        events: mpsc::UnboundedSender<PlaybackEvent>,
        child: Option<Child>,
        request_timeout: Duration,
    ) -> Self {
        let (read_half, write_half) = stream.into_split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(read_half, Arc::clone(&pending), events));

        Self {
            writer: tokio::sync::Mutex::new(write_half),
            pending,
            next_request_id: AtomicU64::new(1),
            process: tokio::sync::Mutex::new(child),
            reader,
            request_timeout,
        }
    }

    async fn observe_properties(&self) -> Result<()> {
        for (observer_id, property) in OBSERVED_PROPERTIES {
            self.command(json!(["observe_property", observer_id, property]))
                .await?;
        }
        debug!("Observing {} mpv properties", OBSERVED_PROPERTIES.len());
        Ok(())
    }

    /// Send one command and wait for its reply
    async fn command(&self, args: Value) -> Result<Value> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(request_id, tx);

        let mut line = json!({ "command": args, "request_id": request_id }).to_string();
        line.push('\n');

        let written = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };
        if let Err(e) = written {
            lock_pending(&self.pending).remove(&request_id);
            return Err(Error::Player(format!("Failed to send command to mpv: {}", e)));
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(Ok(data))) => Ok(data),
            Ok(Ok(Err(message))) => Err(Error::Player(format!(
                "mpv rejected {}: {}",
                args, message
            ))),
            Ok(Err(_)) => Err(Error::Player("mpv connection closed".to_string())),
            Err(_) => {
                lock_pending(&self.pending).remove(&request_id);
                Err(Error::Player(format!("mpv did not answer {}", args)))
            }
        }
    }
}

#[async_trait]
impl Player for MpvPlayer {
    async fn load(&self, source: &str) -> Result<()> {
        self.command(json!(["loadfile", source, "replace"])).await?;
        self.command(json!(["set_property", "pause", false])).await?;
        info!("Loaded {}", source);
        Ok(())
    }

    async fn queue(&self, source: &str) -> Result<()> {
        self.command(json!(["loadfile", source, "append-play"])).await?;
        info!("Queued track: {}", source);
        Ok(())
    }

    async fn pause_or_resume(&self) -> Result<()> {
        self.command(json!(["cycle", "pause"])).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.command(json!(["stop"])).await?;
        info!("Playback stopped");
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        if volume > 100 {
            return Err(Error::BadRequest(
                "Volume must be between 0 and 100.".to_string(),
            ));
        }
        self.command(json!(["set_property", "volume", volume])).await?;
        info!("Volume set to: {}", volume);
        Ok(())
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.command(json!(["seek", seconds, "relative"])).await?;
        info!("Seeked by {} seconds", seconds);
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        // mpv closes the socket while answering, so a missing reply is expected
        if let Err(e) = self.command(json!(["quit"])).await {
            debug!("mpv quit: {}", e);
        }

        if let Some(mut child) = self.process.lock().await.take() {
            match tokio::time::timeout(Duration::from_secs(2), child.wait()).await {
                Ok(status) => info!("mpv exited: {:?}", status),
                Err(_) => {
                    warn!("mpv did not exit, killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn wait_for_socket(path: &Path, timeout: Duration) -> Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match UnixStream::connect(path).await {
            Ok(stream) => return Ok(stream),
            Err(e) if tokio::time::Instant::now() >= deadline => {
                return Err(Error::Player(format!(
                    "mpv IPC socket {} not available: {}",
                    path.display(),
                    e
                )));
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
}

async fn read_loop(
    read_half: OwnedReadHalf,
    pending: Pending,
    events: mpsc::UnboundedSender<PlaybackEvent>,
) {
    let mut translator = EventTranslator::default();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let message: Value = match serde_json::from_str(&line) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Unparseable mpv message: {}", e);
                        continue;
                    }
                };

                if message.get("event").is_none() {
                    if let Some(request_id) = message.get("request_id").and_then(Value::as_u64) {
                        complete_request(&pending, request_id, &message);
                    }
                    continue;
                }

                for event in translator.translate(&message) {
                    if events.send(event).is_err() {
                        debug!("Playback event receiver dropped");
                    }
                }
            }
            Ok(None) => {
                info!("mpv IPC connection closed");
                break;
            }
            Err(e) => {
                warn!("mpv IPC read failed: {}", e);
                break;
            }
        }
    }

    // Waiters see a closed channel instead of hanging until their timeout
    lock_pending(&pending).clear();
}

fn complete_request(pending: &Pending, request_id: u64, message: &Value) {
    let Some(waiter) = lock_pending(pending).remove(&request_id) else {
        debug!("Reply for unknown mpv request {}", request_id);
        return;
    };

    let result = match message.get("error").and_then(Value::as_str) {
        Some("success") | None => Ok(message.get("data").cloned().unwrap_or(Value::Null)),
        Some(error) => Err(error.to_string()),
    };
    let _ = waiter.send(result);
}

/// Turns raw mpv events into [`PlaybackEvent`]s
///
/// Stateful: time-position updates are reduced to one per whole second, and
/// a seek is reported once playback has restarted and the new position is
/// known, whichever of the two mpv reports last.
#[derive(Debug, Default)]
pub struct EventTranslator {
    status: PlayerStatus,
    position: f64,
    last_second: Option<i64>,
    seek: Option<PendingSeek>,
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    start: f64,
    end: Option<f64>,
    restarted: bool,
}

impl EventTranslator {
    pub fn translate(&mut self, message: &Value) -> Vec<PlaybackEvent> {
        let Some(event) = message.get("event").and_then(Value::as_str) else {
            return Vec::new();
        };

        match event {
            "start-file" => vec![PlaybackEvent::Started],
            "end-file" => {
                self.last_second = None;
                vec![PlaybackEvent::Stopped]
            }
            "seek" => {
                self.seek = Some(PendingSeek {
                    start: self.position,
                    end: None,
                    restarted: false,
                });
                Vec::new()
            }
            "playback-restart" => match self.seek.as_mut() {
                Some(seek) => {
                    seek.restarted = true;
                    self.finish_seek().into_iter().collect()
                }
                None => Vec::new(),
            },
            "property-change" => {
                let name = message.get("name").and_then(Value::as_str).unwrap_or_default();
                let data = message.get("data").unwrap_or(&Value::Null);
                self.property_change(name, data)
            }
            _ => Vec::new(),
        }
    }

    fn property_change(&mut self, name: &str, data: &Value) -> Vec<PlaybackEvent> {
        if name == "time-pos" {
            let Some(seconds) = data.as_f64() else {
                return Vec::new();
            };
            self.position = seconds;
            if let Some(seek) = self.seek.as_mut() {
                seek.end = Some(seconds);
            }
            let mut events: Vec<PlaybackEvent> = self.finish_seek().into_iter().collect();

            let whole = seconds.floor() as i64;
            if self.last_second != Some(whole) {
                self.last_second = Some(whole);
                events.push(PlaybackEvent::TimePosition(whole as f64));
            }
            return events;
        }

        let before = self.status.clone();
        let mut events = Vec::new();

        match name {
            "pause" => {
                let paused = data.as_bool().unwrap_or(false);
                if paused != self.status.pause {
                    self.status.pause = paused;
                    events.push(if paused {
                        PlaybackEvent::Paused
                    } else {
                        PlaybackEvent::Resumed
                    });
                }
            }
            "mute" => self.status.mute = data.as_bool().unwrap_or(false),
            "duration" => self.status.duration = data.as_f64(),
            "volume" => self.status.volume = data.as_f64().unwrap_or(self.status.volume),
            "filename" => self.status.filename = data.as_str().map(str::to_string),
            "path" => self.status.path = data.as_str().map(str::to_string),
            "media-title" => self.status.media_title = data.as_str().map(str::to_string),
            "playlist-pos" => self.status.playlist_pos = data.as_i64().unwrap_or(-1),
            "playlist-count" => self.status.playlist_count = data.as_i64().unwrap_or(0),
            "loop" => {
                self.status.loop_mode = match data {
                    Value::String(mode) => mode.clone(),
                    Value::Bool(true) => "inf".to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => "no".to_string(),
                }
            }
            _ => return Vec::new(),
        }

        if self.status != before {
            events.push(PlaybackEvent::StatusChange(self.status.clone()));
        }
        events
    }

    /// Emit the pending seek once it has both restarted and a new position
    fn finish_seek(&mut self) -> Option<PlaybackEvent> {
        match self.seek {
            Some(PendingSeek {
                start,
                end: Some(end),
                restarted: true,
            }) => {
                self.seek = None;
                Some(PlaybackEvent::Seek(SeekInfo { start, end }))
            }
            _ => None,
        }
    }
}

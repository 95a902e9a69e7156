//! Event types for the mediabox event system
//!
//! The audio player reports state changes as [`PlaybackEvent`] values. The
//! server republishes each one to live-update clients under the name returned
//! by [`PlaybackEvent::event_name`].

mod playback_types;

pub use playback_types::{PlayerStatus, SeekInfo};

use serde_json::{json, Value};

/// Playback state change reported by the audio player
///
/// Each variant corresponds to one player notification
/// (`started|stopped|paused|resumed|timeposition|seek|statuschange`).
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A file started playing
    Started,
    /// Playback ended (end of file or explicit stop)
    Stopped,
    /// Playback was paused
    Paused,
    /// Playback resumed after a pause
    Resumed,
    /// Current playback position in seconds
    TimePosition(f64),
    /// A seek completed
    Seek(SeekInfo),
    /// One of the observed player properties changed
    StatusChange(PlayerStatus),
}

impl PlaybackEvent {
    /// Name the player uses for this notification
    pub fn source_name(&self) -> &'static str {
        match self {
            PlaybackEvent::Started => "started",
            PlaybackEvent::Stopped => "stopped",
            PlaybackEvent::Paused => "paused",
            PlaybackEvent::Resumed => "resumed",
            PlaybackEvent::TimePosition(_) => "timeposition",
            PlaybackEvent::Seek(_) => "seek",
            PlaybackEvent::StatusChange(_) => "statuschange",
        }
    }

    /// Name under which the event is published to live-update clients
    pub fn event_name(&self) -> &'static str {
        match self {
            PlaybackEvent::Started => "playbackStarted",
            PlaybackEvent::Stopped => "playbackStopped",
            PlaybackEvent::Paused => "playbackPaused",
            PlaybackEvent::Resumed => "playbackResumed",
            PlaybackEvent::TimePosition(_) => "playbackTime",
            PlaybackEvent::Seek(_) => "playbackSeek",
            PlaybackEvent::StatusChange(_) => "playbackStatus",
        }
    }

    /// JSON payload sent with the event
    pub fn payload(&self) -> Value {
        match self {
            PlaybackEvent::Started => json!("Audio playback has started"),
            PlaybackEvent::Stopped => json!("Audio playback has stopped"),
            PlaybackEvent::Paused => json!("Audio playback has been paused"),
            PlaybackEvent::Resumed => json!("Audio playback has resumed"),
            PlaybackEvent::TimePosition(seconds) => json!(seconds),
            PlaybackEvent::Seek(info) => json!(info),
            PlaybackEvent::StatusChange(status) => json!(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let events = vec![
            (PlaybackEvent::Started, "started", "playbackStarted"),
            (PlaybackEvent::Stopped, "stopped", "playbackStopped"),
            (PlaybackEvent::Paused, "paused", "playbackPaused"),
            (PlaybackEvent::Resumed, "resumed", "playbackResumed"),
            (PlaybackEvent::TimePosition(3.0), "timeposition", "playbackTime"),
            (
                PlaybackEvent::Seek(SeekInfo { start: 1.0, end: 30.0 }),
                "seek",
                "playbackSeek",
            ),
            (
                PlaybackEvent::StatusChange(PlayerStatus::default()),
                "statuschange",
                "playbackStatus",
            ),
        ];

        for (event, source, published) in events {
            assert_eq!(event.source_name(), source);
            assert_eq!(event.event_name(), published);
        }
    }

    #[test]
    fn test_payloads() {
        assert_eq!(
            PlaybackEvent::Paused.payload(),
            json!("Audio playback has been paused")
        );
        assert_eq!(PlaybackEvent::TimePosition(42.0).payload(), json!(42.0));

        let seek = PlaybackEvent::Seek(SeekInfo { start: 10.0, end: 25.5 }).payload();
        assert_eq!(seek["start"], 10.0);
        assert_eq!(seek["end"], 25.5);
    }

    #[test]
    fn test_status_uses_player_property_names() {
        let status = PlayerStatus {
            media_title: Some("Song".to_string()),
            playlist_pos: 2,
            ..PlayerStatus::default()
        };
        let payload = PlaybackEvent::StatusChange(status).payload();
        assert_eq!(payload["media-title"], "Song");
        assert_eq!(payload["playlist-pos"], 2);
        assert_eq!(payload["loop"], "no");
    }
}

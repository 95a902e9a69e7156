//! Playback-related type definitions
//!
//! Supporting payload types carried by [`super::PlaybackEvent`].

use serde::{Deserialize, Serialize};

/// Position jump reported by the player when a seek completes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeekInfo {
    /// Playback position (seconds) before the seek
    pub start: f64,
    /// Playback position (seconds) after the seek
    pub end: f64,
}

/// Snapshot of the player's observable properties
///
/// Field names on the wire follow the player's property names so browser
/// code can read them unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerStatus {
    pub mute: bool,
    pub pause: bool,
    pub duration: Option<f64>,
    pub volume: f64,
    pub filename: Option<String>,
    pub path: Option<String>,
    #[serde(rename = "media-title")]
    pub media_title: Option<String>,
    #[serde(rename = "playlist-pos")]
    pub playlist_pos: i64,
    #[serde(rename = "playlist-count")]
    pub playlist_count: i64,
    #[serde(rename = "loop")]
    pub loop_mode: String,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            mute: false,
            pause: false,
            duration: None,
            volume: 100.0,
            filename: None,
            path: None,
            media_title: None,
            playlist_pos: -1,
            playlist_count: 0,
            loop_mode: "no".to_string(),
        }
    }
}

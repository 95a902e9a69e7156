//! Audio player collaborator
//!
//! Handlers drive playback through the [`Player`] trait. The production
//! implementation ([`mpv::MpvPlayer`]) controls an external mpv process and
//! reports state changes as [`PlaybackEvent`](mediabox_common::PlaybackEvent)s
//! on a channel bridged onto the event bus.

pub mod fetch;
#[cfg(unix)]
pub mod mpv;

pub use fetch::RemoteFetcher;

use async_trait::async_trait;

use crate::error::Result;

/// Playback control surface used by API actions
#[async_trait]
pub trait Player: Send + Sync {
    /// Replace the current track with `source` (file path or URL) and play it
    async fn load(&self, source: &str) -> Result<()>;

    /// Append `source` to the playlist
    async fn queue(&self, source: &str) -> Result<()>;

    /// Pause if playing, resume if paused
    async fn pause_or_resume(&self) -> Result<()>;

    /// Stop playback and clear the current track
    async fn stop(&self) -> Result<()>;

    /// Set output volume, 0-100
    async fn set_volume(&self, volume: u8) -> Result<()>;

    /// Seek relative to the current position
    async fn seek(&self, seconds: f64) -> Result<()>;

    /// Shut the player down
    async fn quit(&self) -> Result<()>;
}

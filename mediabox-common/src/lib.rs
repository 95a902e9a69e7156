//! # mediabox Common Library
//!
//! Shared code for the mediabox workspace:
//! - Error type used by configuration loading
//! - Configuration file resolution (TOML)
//! - Playback event types published to live-update clients

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::PlaybackEvent;

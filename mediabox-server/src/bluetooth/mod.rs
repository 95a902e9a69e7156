//! Bluetooth collaborator
//!
//! Device management and media-player metadata from BlueZ. The production
//! implementation is [`bluez::BluezCtl`].

pub mod bluez;

pub use bluez::BluezCtl;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Bluetooth operations used by API actions
#[async_trait]
pub trait Bluetooth: Send + Sync {
    /// Object paths of known devices
    async fn devices(&self) -> Result<Vec<String>>;

    async fn start_discovery(&self) -> Result<()>;

    async fn stop_discovery(&self) -> Result<()>;

    async fn pair(&self, device_path: &str) -> Result<()>;

    async fn connect(&self, device_path: &str) -> Result<()>;

    /// Remove the device from the adapter
    async fn unpair(&self, device_path: &str) -> Result<()>;

    /// Install a pairing agent that answers every PIN request with `pin_code`
    async fn set_pin_code(&self, pin_code: &str) -> Result<()>;

    /// Object path of a connected device's media player, if any
    async fn connected_media_player(&self) -> Result<Option<String>>;

    /// Current track properties of `player_path`, if it reports a track
    async fn track_metadata(&self, player_path: &str) -> Result<Option<Map<String, Value>>>;
}

/// Accept only BlueZ device object paths (`/org/bluez/hciN/dev_XX_...`)
pub fn validate_device_path(device_path: &str) -> Result<()> {
    let valid = device_path
        .strip_prefix("/org/bluez/")
        .map(|rest| {
            rest.contains("/dev_")
                && !rest.contains("//")
                && !rest.ends_with('/')
                && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/')
        })
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(Error::BadRequest("Invalid device path.".to_string()))
    }
}

/// PIN codes are 1-16 alphanumeric characters
pub fn validate_pin_code(pin_code: &str) -> Result<()> {
    if (1..=16).contains(&pin_code.len()) && pin_code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(Error::BadRequest("Invalid PIN code.".to_string()))
    }
}

//! Recording fakes for the server's collaborators

use async_trait::async_trait;
use mediabox_server::bluetooth::Bluetooth;
use mediabox_server::playback::Player;
use mediabox_server::system::{ServiceControl, ServiceStatus, ServiceVerb};
use mediabox_server::{Error, Result};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Player that records every call as a string like `load:/a.mp3`
#[derive(Default)]
pub struct FakePlayer {
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl FakePlayer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every subsequent call fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: String) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Player(format!("player unavailable during {}", call)));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn load(&self, source: &str) -> Result<()> {
        self.record(format!("load:{}", source))
    }

    async fn queue(&self, source: &str) -> Result<()> {
        self.record(format!("queue:{}", source))
    }

    async fn pause_or_resume(&self) -> Result<()> {
        self.record("pause_or_resume".to_string())
    }

    async fn stop(&self) -> Result<()> {
        self.record("stop".to_string())
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        self.record(format!("volume:{}", volume))
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        self.record(format!("seek:{}", seconds))
    }

    async fn quit(&self) -> Result<()> {
        self.record("quit".to_string())
    }
}

/// Bluetooth stack with fixed devices and an optional media player
#[derive(Default)]
pub struct FakeBluetooth {
    pub media_player: Option<String>,
    pub track: Option<Map<String, Value>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBluetooth {
    pub fn with_player(player: &str, track: Map<String, Value>) -> Self {
        Self {
            media_player: Some(player.to_string()),
            track: Some(track),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Bluetooth for FakeBluetooth {
    async fn devices(&self) -> Result<Vec<String>> {
        Ok(vec!["/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF".to_string()])
    }

    async fn start_discovery(&self) -> Result<()> {
        self.record("start_discovery".to_string());
        Ok(())
    }

    async fn stop_discovery(&self) -> Result<()> {
        self.record("stop_discovery".to_string());
        Ok(())
    }

    async fn pair(&self, device_path: &str) -> Result<()> {
        self.record(format!("pair:{}", device_path));
        Ok(())
    }

    async fn connect(&self, device_path: &str) -> Result<()> {
        // A device that refuses connections
        if device_path.ends_with("dev_00_00_00_00_00_00") {
            return Err(Error::Bluetooth("org.bluez.Error.Failed".to_string()));
        }
        self.record(format!("connect:{}", device_path));
        Ok(())
    }

    async fn unpair(&self, device_path: &str) -> Result<()> {
        self.record(format!("unpair:{}", device_path));
        Ok(())
    }

    async fn set_pin_code(&self, pin_code: &str) -> Result<()> {
        self.record(format!("pin:{}", pin_code));
        Ok(())
    }

    async fn connected_media_player(&self) -> Result<Option<String>> {
        Ok(self.media_player.clone())
    }

    async fn track_metadata(&self, _player_path: &str) -> Result<Option<Map<String, Value>>> {
        Ok(self.track.clone())
    }
}

/// Service manager where `stopped.service` is inactive and `broken.service`
/// cannot be queried
#[derive(Default)]
pub struct FakeServices {
    calls: Mutex<Vec<String>>,
}

impl FakeServices {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceControl for FakeServices {
    async fn control(&self, verb: ServiceVerb, service: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:{}", verb, service));
        Ok(())
    }

    async fn status(&self, service: &str) -> Result<ServiceStatus> {
        match service {
            "stopped.service" => Ok(ServiceStatus::NotRunning(
                "Active: inactive (dead)".to_string(),
            )),
            "broken.service" => Err(Error::Service("Failed to connect to bus".to_string())),
            _ => Ok(ServiceStatus::Running("Active: active (running)".to_string())),
        }
    }

    async fn reboot(&self) -> Result<()> {
        self.calls.lock().unwrap().push("reboot".to_string());
        Ok(())
    }
}

//! BlueZ access through `busctl` and `bt-agent`
//!
//! `busctl --json=short` prints D-Bus replies as `{"type": sig, "data": ...}`
//! with variants encoded the same way; the parse functions below work on that
//! shape and are independent of the process plumbing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{validate_device_path, validate_pin_code, Bluetooth};
use crate::error::{Error, Result};
use crate::system::command::{self, CommandOutput};

const BLUEZ: &str = "org.bluez";
const ADAPTER_IFACE: &str = "org.bluez.Adapter1";
const DEVICE_IFACE: &str = "org.bluez.Device1";
const MEDIA_PLAYER_IFACE: &str = "org.bluez.MediaPlayer1";

/// [`Bluetooth`] implementation shelling out to BlueZ command-line tools
pub struct BluezCtl {
    adapter_path: String,
    pin_file: PathBuf,
    agent: Mutex<Option<Child>>,
}

impl BluezCtl {
    /// # Arguments
    ///
    /// * `adapter_path` - adapter object path, normally `/org/bluez/hci0`
    /// * `pin_file` - where the PIN agent's key file is written
    pub fn new(adapter_path: impl Into<String>, pin_file: impl Into<PathBuf>) -> Self {
        Self {
            adapter_path: adapter_path.into(),
            pin_file: pin_file.into(),
            agent: Mutex::new(None),
        }
    }

    async fn busctl(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut full = vec!["--system", "--json=short"];
        full.extend_from_slice(args);

        let output = command::run("busctl", &full)
            .await
            .map_err(|e| Error::Bluetooth(format!("Failed to run busctl: {}", e)))?;

        if output.success {
            Ok(output)
        } else {
            Err(Error::Bluetooth(output.stderr.trim().to_string()))
        }
    }

    async fn busctl_json(&self, args: &[&str]) -> Result<Value> {
        let output = self.busctl(args).await?;
        serde_json::from_str(&output.stdout)
            .map_err(|e| Error::Bluetooth(format!("Unexpected busctl output: {}", e)))
    }

    async fn managed_objects(&self) -> Result<Value> {
        self.busctl_json(&[
            "call",
            BLUEZ,
            "/",
            "org.freedesktop.DBus.ObjectManager",
            "GetManagedObjects",
        ])
        .await
    }

    async fn adapter_call(&self, method: &str, extra: &[&str]) -> Result<()> {
        let mut args = vec!["call", BLUEZ, self.adapter_path.as_str(), ADAPTER_IFACE, method];
        args.extend_from_slice(extra);
        self.busctl(&args).await.map(|_| ())
    }

    async fn device_call(&self, device_path: &str, method: &str) -> Result<()> {
        validate_device_path(device_path)?;
        // Pairing waits on the remote side; allow well over the default 25 s
        self.busctl(&["--timeout=60", "call", BLUEZ, device_path, DEVICE_IFACE, method])
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Bluetooth for BluezCtl {
    async fn devices(&self) -> Result<Vec<String>> {
        Ok(device_paths(&self.managed_objects().await?))
    }

    async fn start_discovery(&self) -> Result<()> {
        self.adapter_call("StartDiscovery", &[]).await?;
        info!("Discovery started");
        Ok(())
    }

    async fn stop_discovery(&self) -> Result<()> {
        self.adapter_call("StopDiscovery", &[]).await?;
        info!("Discovery stopped");
        Ok(())
    }

    async fn pair(&self, device_path: &str) -> Result<()> {
        self.device_call(device_path, "Pair").await?;
        info!("Device {} paired successfully", device_path);
        Ok(())
    }

    async fn connect(&self, device_path: &str) -> Result<()> {
        self.device_call(device_path, "Connect").await?;
        info!("Device {} connected successfully", device_path);
        Ok(())
    }

    async fn unpair(&self, device_path: &str) -> Result<()> {
        validate_device_path(device_path)?;
        self.adapter_call("RemoveDevice", &["o", device_path]).await?;
        info!("Device {} unpaired successfully", device_path);
        Ok(())
    }

    async fn set_pin_code(&self, pin_code: &str) -> Result<()> {
        validate_pin_code(pin_code)?;

        if let Some(parent) = self.pin_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.pin_file, format!("* {}\n", pin_code)).await?;

        let mut agent = self.agent.lock().await;
        if let Some(mut previous) = agent.take() {
            debug!("Replacing running PIN agent");
            let _ = previous.kill().await;
        }

        let child = Command::new("bt-agent")
            .arg("--capability=KeyboardDisplay")
            .arg(format!("--pin={}", self.pin_file.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Bluetooth(format!("Failed to start bt-agent: {}", e)))?;

        *agent = Some(child);
        info!("Default PIN agent set");
        Ok(())
    }

    async fn connected_media_player(&self) -> Result<Option<String>> {
        Ok(media_player_path(&self.managed_objects().await?))
    }

    async fn track_metadata(&self, player_path: &str) -> Result<Option<Map<String, Value>>> {
        let reply = self
            .busctl_json(&["get-property", BLUEZ, player_path, MEDIA_PLAYER_IFACE, "Track"])
            .await;

        match reply {
            Ok(value) => Ok(track_properties(&value)),
            Err(e) => {
                info!("No Track property available for player at {}: {}", player_path, e);
                Ok(None)
            }
        }
    }
}

/// The `a{oa{sa{sv}}}` dictionary of a GetManagedObjects reply
fn objects(reply: &Value) -> Option<&Map<String, Value>> {
    reply.get("data")?.get(0)?.as_object()
}

/// Object paths that implement `org.bluez.Device1`
pub fn device_paths(reply: &Value) -> Vec<String> {
    let mut paths: Vec<String> = objects(reply)
        .map(|objects| {
            objects
                .iter()
                .filter(|(path, interfaces)| {
                    path.contains("/dev_") && interfaces.get(DEVICE_IFACE).is_some()
                })
                .map(|(path, _)| path.clone())
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}

/// First object under a device that implements `org.bluez.MediaPlayer1`
pub fn media_player_path(reply: &Value) -> Option<String> {
    objects(reply)?
        .iter()
        .find(|(path, interfaces)| {
            path.contains("/player") && interfaces.get(MEDIA_PLAYER_IFACE).is_some()
        })
        .map(|(path, _)| path.clone())
}

/// Unwrap the variants of a `Track` property (`a{sv}`) into plain values
pub fn track_properties(reply: &Value) -> Option<Map<String, Value>> {
    let track = reply.get("data")?.as_object()?;
    Some(
        track
            .iter()
            .map(|(key, variant)| {
                let value = variant.get("data").cloned().unwrap_or(Value::Null);
                (key.clone(), value)
            })
            .collect(),
    )
}

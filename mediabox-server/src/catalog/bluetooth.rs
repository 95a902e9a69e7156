use serde::Deserialize;
use serde_json::{json, Value};

use super::{mask, required};
use crate::actions::{ActionQuery, ActionReply};
use crate::bluetooth::{validate_device_path, validate_pin_code};
use crate::error::{Error, Result};
use crate::state::AppContext;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceQuery {
    device_path: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PinQuery {
    pin_code: Option<String>,
}

fn device_path(query: &ActionQuery) -> Result<String> {
    let DeviceQuery { device_path } = query.parse()?;
    let device_path = required(device_path, "devicePath")?;
    validate_device_path(&device_path)?;
    Ok(device_path)
}

/// Track metadata of the connected phone/player
pub(super) async fn metadata(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    let player = ctx
        .bluetooth
        .connected_media_player()
        .await
        .map_err(|e| mask(e, "Error fetching metadata.", Error::Bluetooth))?
        .ok_or_else(|| Error::NotFound("No connected media player found.".to_string()))?;

    let metadata = ctx
        .bluetooth
        .track_metadata(&player)
        .await
        .map_err(|e| mask(e, "Error fetching metadata.", Error::Bluetooth))?;

    Ok(ActionReply::ok().with("metadata", metadata.map(Value::Object).unwrap_or(Value::Null)))
}

pub(super) async fn devices(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    let devices = ctx
        .bluetooth
        .devices()
        .await
        .map_err(|e| mask(e, "Error listing devices.", Error::Bluetooth))?;
    Ok(ActionReply::ok().with("devices", json!(devices)))
}

pub(super) async fn start_discovery(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    ctx.bluetooth
        .start_discovery()
        .await
        .map_err(|e| mask(e, "Error starting discovery.", Error::Bluetooth))?;
    Ok(ActionReply::message("Discovery started."))
}

pub(super) async fn stop_discovery(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    ctx.bluetooth
        .stop_discovery()
        .await
        .map_err(|e| mask(e, "Error stopping discovery.", Error::Bluetooth))?;
    Ok(ActionReply::message("Discovery stopped."))
}

pub(super) async fn pair(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let device = device_path(&query)?;
    ctx.bluetooth
        .pair(&device)
        .await
        .map_err(|e| mask(e, format!("Error pairing device {}.", device), Error::Bluetooth))?;
    Ok(ActionReply::message(format!("Device {} paired successfully.", device)))
}

pub(super) async fn connect(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let device = device_path(&query)?;
    ctx.bluetooth
        .connect(&device)
        .await
        .map_err(|e| mask(e, format!("Error connecting device {}.", device), Error::Bluetooth))?;
    Ok(ActionReply::message(format!("Device {} connected successfully.", device)))
}

pub(super) async fn unpair(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let device = device_path(&query)?;
    ctx.bluetooth
        .unpair(&device)
        .await
        .map_err(|e| mask(e, format!("Error unpairing device {}.", device), Error::Bluetooth))?;
    Ok(ActionReply::message(format!("Device {} unpaired successfully.", device)))
}

pub(super) async fn pin(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let PinQuery { pin_code } = query.parse()?;
    let pin_code = required(pin_code, "pinCode")?;
    validate_pin_code(&pin_code)?;

    ctx.bluetooth
        .set_pin_code(&pin_code)
        .await
        .map_err(|e| mask(e, "Error setting PIN code.", Error::Bluetooth))?;
    Ok(ActionReply::message("PIN code set successfully."))
}

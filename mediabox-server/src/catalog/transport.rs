use serde::Deserialize;

use super::mask;
use crate::actions::{ActionQuery, ActionReply};
use crate::error::{Error, Result};
use crate::state::AppContext;

#[derive(Deserialize)]
struct VolumeQuery {
    level: Option<i64>,
}

#[derive(Deserialize)]
struct SeekQuery {
    seconds: Option<f64>,
}

pub(super) async fn pause_toggle(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    ctx.player
        .pause_or_resume()
        .await
        .map_err(|e| mask(e, "Error toggling pause.", Error::Player))?;
    Ok(ActionReply::message("Pause/Resume Toggled"))
}

pub(super) async fn stop(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    ctx.player
        .stop()
        .await
        .map_err(|e| mask(e, "Error stopping playback.", Error::Player))?;
    Ok(ActionReply::message("Playback stopped."))
}

pub(super) async fn volume(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let VolumeQuery { level } = query.parse()?;
    let level = level.ok_or_else(|| Error::BadRequest("Missing level parameter.".to_string()))?;
    let level = u8::try_from(level)
        .ok()
        .filter(|l| *l <= 100)
        .ok_or_else(|| Error::BadRequest("Volume must be between 0 and 100.".to_string()))?;

    ctx.player
        .set_volume(level)
        .await
        .map_err(|e| mask(e, "Error setting volume.", Error::Player))?;
    Ok(ActionReply::message(format!("Volume set to {}.", level)))
}

/// Seek relative to the current position (negative seeks backwards)
pub(super) async fn seek(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let SeekQuery { seconds } = query.parse()?;
    let seconds = seconds
        .filter(|s| s.is_finite())
        .ok_or_else(|| Error::BadRequest("Missing seconds parameter.".to_string()))?;

    ctx.player
        .seek(seconds)
        .await
        .map_err(|e| mask(e, "Error seeking.", Error::Player))?;
    Ok(ActionReply::message(format!("Seeked by {} seconds.", seconds)))
}

use serde::Deserialize;
use tracing::info;

use super::{mask, required};
use crate::actions::{ActionQuery, ActionReply};
use crate::error::{Error, Result};
use crate::state::AppContext;

const PLAYBACK_FAILED: &str = "Error during audio playback.";

#[derive(Deserialize)]
struct RemoteQuery {
    url: Option<String>,
}

#[derive(Deserialize)]
struct FileQuery {
    file: Option<String>,
}

/// Download a remote track, then play it
pub(super) async fn remote(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let RemoteQuery { url } = query.parse()?;
    let url = required(url, "URL")?;

    let file = ctx
        .fetcher
        .fetch(&url)
        .await
        .map_err(|e| mask(e, "Failed to fetch the file.", Error::Player))?;

    info!("Audio Playback initiated {}", url);
    ctx.player
        .load(&file.to_string_lossy())
        .await
        .map_err(|e| mask(e, PLAYBACK_FAILED, Error::Player))?;

    Ok(ActionReply::ok())
}

pub(super) async fn local(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let FileQuery { file } = query.parse()?;
    let file = required(file, "file")?;

    info!("Audio Playback initiated {}", file);
    ctx.player
        .load(&file)
        .await
        .map_err(|e| mask(e, PLAYBACK_FAILED, Error::Player))?;

    Ok(ActionReply::ok())
}

/// Append to the playlist without interrupting the current track
pub(super) async fn queue(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let FileQuery { file } = query.parse()?;
    let file = required(file, "file")?;

    ctx.player
        .queue(&file)
        .await
        .map_err(|e| mask(e, "Error queueing track.", Error::Player))?;

    Ok(ActionReply::message("Track queued."))
}

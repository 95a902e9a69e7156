use serde::Deserialize;
use serde_json::json;

use super::mask;
use crate::actions::{ActionQuery, ActionReply};
use crate::db;
use crate::error::{Error, Result};
use crate::library::{self as music, ScanOutcome};
use crate::paths::resolve_within;
use crate::state::AppContext;

/// Published after a scan added tracks to the library
const LIBRARY_UPDATED_EVENT: &str = "libraryUpdated";

#[derive(Deserialize)]
struct LibraryQuery {
    filter: Option<String>,
}

#[derive(Deserialize)]
struct ScanQuery {
    folder: Option<String>,
    #[serde(default)]
    import: bool,
}

pub(super) async fn get(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let LibraryQuery { filter } = query.parse()?;
    let tracks = db::list_tracks(&ctx.library, filter.as_deref())
        .await
        .map_err(|e| mask(e, "Error reading library.", Error::Internal))?;

    Ok(ActionReply::ok().with("data", json!(tracks)))
}

/// Scan a folder under the media root; with `import=true` add the results
/// and tell live-update clients the library changed
pub(super) async fn scan_folder(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let ScanQuery { folder, import } = query.parse()?;
    let folder = resolve_within(&ctx.paths.media_root, folder.as_deref().unwrap_or(""))?;

    let outcomes = music::scan_folder(folder, ctx.paths.artwork_dir.clone())
        .await
        .map_err(|e| mask(e, "Failed to scan folder", Error::Internal))?;

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, ScanOutcome::Failed { .. }))
        .count();
    let mut reply = ActionReply::ok()
        .with("data", json!(outcomes))
        .with("failed", json!(failed));

    if import {
        let imported = music::import(&ctx.library, &outcomes)
            .await
            .map_err(|e| mask(e, "Error importing tracks.", Error::Internal))?;
        ctx.bus.publish(LIBRARY_UPDATED_EVENT, json!({ "imported": imported }));
        reply = reply.with("imported", json!(imported));
    }

    Ok(reply)
}

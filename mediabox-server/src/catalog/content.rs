use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::actions::{ActionQuery, ActionReply};
use crate::error::{Error, Result};
use crate::paths::resolve_within;
use crate::state::AppContext;

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// Return the HTML fragment for `page` from the views directory
pub(super) async fn get(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let PageQuery { page } = query.parse()?;
    let page = page.unwrap_or_default();
    info!("Rendering page: {}", page);

    if page.is_empty() {
        return Err(Error::BadRequest("No page specified.".to_string()));
    }

    let file_name = if page.ends_with(".html") {
        page
    } else {
        format!("{}.html", page)
    };
    let path = resolve_within(&ctx.paths.views_dir, &file_name)?;

    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(ActionReply::ok().with("content", Value::String(html))),
        Err(e) => {
            error!("Error rendering page {}: {}", path.display(), e);
            Err(Error::BadRequest(format!(
                "Failed to lookup view \"{}\"",
                file_name
            )))
        }
    }
}

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{mask, required};
use crate::actions::{ActionQuery, ActionReply};
use crate::error::{Error, Result};
use crate::paths::resolve_within;
use crate::state::AppContext;
use crate::system::{validate_service_name, ServiceStatus, ServiceVerb};

#[derive(Deserialize)]
struct LogQuery {
    log: Option<String>,
}

#[derive(Deserialize)]
struct ServiceQuery {
    service: Option<String>,
}

/// Return a log file from the log directory as lines
pub(super) async fn logs(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let LogQuery { log } = query.parse()?;
    let log = required(log, "log")?;
    let path = resolve_within(&ctx.paths.log_dir, &log)?;
    info!("Reading log {}", path.display());

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| mask(e.into(), "Error reading log file.", Error::Internal))?;

    Ok(ActionReply::ok().with("lines", json!(split_lines(&content))))
}

fn split_lines(content: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = content
        .split("\r\n")
        .flat_map(|chunk| chunk.split(['\n', '\r']))
        .collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

fn service_name(query: &ActionQuery) -> Result<String> {
    let ServiceQuery { service } = query.parse()?;
    let service = required(service, "service")?;
    validate_service_name(&service)?;
    Ok(service)
}

async fn control(ctx: AppContext, query: ActionQuery, verb: ServiceVerb) -> Result<ActionReply> {
    let service = service_name(&query)?;
    ctx.services.control(verb, &service).await.map_err(|e| {
        mask(e, format!("Error {} service.", verb.gerund()), Error::Service)
    })?;

    Ok(ActionReply::message(format!(
        "{} {} successfully.",
        service,
        verb.past_tense()
    )))
}

pub(super) async fn restart_service(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    control(ctx, query, ServiceVerb::Restart).await
}

pub(super) async fn start_service(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    control(ctx, query, ServiceVerb::Start).await
}

pub(super) async fn stop_service(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    control(ctx, query, ServiceVerb::Stop).await
}

/// A stopped unit is a successful answer, not an error
pub(super) async fn status_service(ctx: AppContext, query: ActionQuery) -> Result<ActionReply> {
    let service = service_name(&query)?;
    let status = ctx
        .services
        .status(&service)
        .await
        .map_err(|e| mask(e, "Error retrieving service status.", Error::Service))?;

    let reply = match status {
        ServiceStatus::Running(text) => {
            ActionReply::message(format!("{} status retrieved successfully.", service))
                .with("status", json!(text))
        }
        ServiceStatus::NotRunning(text) => {
            ActionReply::message(format!("{} is not running.", service)).with("status", json!(text))
        }
    };
    Ok(reply)
}

pub(super) async fn reboot(ctx: AppContext, _query: ActionQuery) -> Result<ActionReply> {
    ctx.services
        .reboot()
        .await
        .map_err(|e| mask(e, "Error rebooting.", Error::Service))?;
    Ok(ActionReply::message("Rebooting..."))
}

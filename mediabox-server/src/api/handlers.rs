//! HTTP request handlers

use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::actions::{ActionQuery, ActionReply};
use crate::error::{Error, Result};

/// Mount point of the action routes
pub const API_PREFIX: &str = "/api/v1";

/// Event name used by [`trigger`]
pub const TRIGGER_EVENT: &str = "message";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Connected live-update clients
    pub clients: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mediabox".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        clients: state.bus.client_count(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    pub message: Option<String>,
}

/// POST /api/v1/trigger
///
/// Publishes `message` (or a default text) to every live-update client.
pub async fn trigger(
    State(state): State<AppState>,
    body: Option<Json<TriggerRequest>>,
) -> Json<Value> {
    let message = body
        .and_then(|Json(request)| request.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Default message".to_string());

    let delivered = state.bus.publish(TRIGGER_EVENT, &message);
    info!("Triggered event delivered to {} clients", delivered);

    Json(json!({ "success": true, "message": "Event triggered" }))
}

/// GET /api/v1/{category}/{path...}
pub async fn dispatch_action(
    State(state): State<AppState>,
    Path((category, path)): Path<(String, String)>,
    uri: Uri,
) -> Result<ActionReply> {
    state
        .dispatcher
        .dispatch(&category, &path, ActionQuery::from_uri(uri))
        .await
}

/// GET /api/v1/{category} (no action path)
pub async fn dispatch_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    uri: Uri,
) -> Result<ActionReply> {
    state
        .dispatcher
        .dispatch(&category, "", ActionQuery::from_uri(uri))
        .await
}

/// Routing error for a path under [`API_PREFIX`] that no route matched
///
/// `rest` is the part after the prefix, e.g. `""`, `"/"` or `"/play/"`.
pub fn unmatched_action(rest: &str) -> Error {
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    match rest.split_once('/') {
        Some((category, path)) => Error::UnknownPath {
            category: category.to_string(),
            path: path.to_string(),
        },
        None => Error::UnknownCategory(rest.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_action_reasons() {
        assert!(matches!(unmatched_action(""), Error::UnknownCategory(c) if c.is_empty()));
        assert!(matches!(unmatched_action("/"), Error::UnknownCategory(c) if c.is_empty()));
        assert!(matches!(
            unmatched_action("/play/"),
            Error::UnknownPath { category, path } if category == "play" && path.is_empty()
        ));
    }
}

//! Router assembly and server loop

use axum::{
    extract::{OriginalUri, Request},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use super::handlers::{self, API_PREFIX};
use super::{rate_limit, sse};
use crate::actions::Dispatcher;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sse::EventBus;
use crate::state::AppContext;

/// State shared by the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<AppContext>>,
    pub bus: EventBus,
}

/// Router-level settings
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub public_dir: PathBuf,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl From<&Config> for HttpOptions {
    fn from(config: &Config) -> Self {
        Self {
            public_dir: config.public_dir.clone(),
            rate_limit_max: config.rate_limit_max,
            rate_limit_window: config.rate_limit_window,
        }
    }
}

/// Build the application router
///
/// Must be called inside a Tokio runtime (starts the rate-limiter pruner).
pub fn build_router(state: AppState, options: &HttpOptions) -> Router {
    let limiter = rate_limit::ip_limiter(options.rate_limit_max, options.rate_limit_window);
    rate_limit::spawn_pruner(&limiter, options.rate_limit_window);

    let api = Router::new()
        .route("/trigger", post(handlers::trigger))
        .route("/events", get(sse::event_stream))
        .route("/:category", get(handlers::dispatch_category))
        .route("/:category/*path", get(handlers::dispatch_action))
        .route_layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::limit_by_ip,
        ));

    let files = ServeDir::new(&options.public_dir);

    Router::new()
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, api)
        .fallback(move |request: Request| fallback(files.clone(), request))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}

/// Unmatched `/api/v1` paths get the structured routing error; everything
/// else is a static file
async fn fallback(files: ServeDir, request: Request) -> Response {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| request.uri().clone());

    if let Some(rest) = uri.path().strip_prefix(API_PREFIX) {
        if rest.is_empty() || rest.starts_with('/') {
            let err = handlers::unmatched_action(rest);
            warn!("Invalid API action: {}", err);
            return err.into_response();
        }
    }

    match files.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    };
    error!("Unhandled panic in request: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": "Internal Server Error" })),
    )
        .into_response()
}

/// Serve `app` on `listener` until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Server is running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| Error::Http(e.to_string()))?;

    info!("Server shutdown complete");
    Ok(())
}

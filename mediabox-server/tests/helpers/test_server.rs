//! In-process test server
//!
//! Builds the real router and action table over fake collaborators, an
//! in-memory database and temporary directories.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mediabox_server::actions::{ActionTimeouts, Dispatcher};
use mediabox_server::api::{build_router, AppState, HttpOptions};
use mediabox_server::playback::RemoteFetcher;
use mediabox_server::sse::{ClientRegistry, EventBus};
use mediabox_server::{catalog, db, AppContext, AppPaths};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use super::{FakeBluetooth, FakePlayer, FakeServices};

pub struct TestServer {
    pub router: Router,
    pub bus: EventBus,
    pub clients: Arc<ClientRegistry>,
    pub player: Arc<FakePlayer>,
    pub bluetooth: Arc<FakeBluetooth>,
    pub services: Arc<FakeServices>,
    pub pool: SqlitePool,
    pub root: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::build(FakeBluetooth::default(), 100).await
    }

    pub async fn with_bluetooth(bluetooth: FakeBluetooth) -> Self {
        Self::build(bluetooth, 100).await
    }

    pub async fn with_rate_limit(max: u32) -> Self {
        Self::build(FakeBluetooth::default(), max).await
    }

    async fn build(bluetooth: FakeBluetooth, rate_limit_max: u32) -> Self {
        let root = TempDir::new().unwrap();
        for dir in ["public", "views", "logs", "media", "artwork", "downloads"] {
            std::fs::create_dir_all(root.path().join(dir)).unwrap();
        }

        // One connection: each :memory: connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::ensure_schema(&pool).await.unwrap();

        let clients = ClientRegistry::new(Duration::from_secs(15), 64);
        let bus = EventBus::new(Arc::clone(&clients));
        let player = Arc::new(FakePlayer::default());
        let bluetooth = Arc::new(bluetooth);
        let services = Arc::new(FakeServices::default());

        let context = AppContext {
            bus: bus.clone(),
            player: player.clone(),
            fetcher: Arc::new(RemoteFetcher::new(root.path().join("downloads"))),
            library: pool.clone(),
            bluetooth: bluetooth.clone(),
            services: services.clone(),
            paths: Arc::new(AppPaths {
                views_dir: root.path().join("views"),
                media_root: root.path().join("media"),
                log_dir: root.path().join("logs"),
                artwork_dir: root.path().join("artwork"),
            }),
        };

        let registry = catalog::build_registry().unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            context,
            ActionTimeouts::default(),
        ));
        let options = HttpOptions {
            public_dir: root.path().join("public"),
            rate_limit_max,
            rate_limit_window: Duration::from_secs(900),
        };
        let router = build_router(
            AppState {
                dispatcher,
                bus: bus.clone(),
            },
            &options,
        );

        Self {
            router,
            bus,
            clients,
            player,
            bluetooth,
            services,
            pool,
            root,
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// GET `uri` and decode the JSON body (`Value::Null` if not JSON)
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST a JSON body to `uri`
    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Open an event stream; returns its body for [`next_sse_frame`]
    pub async fn open_event_stream(&self) -> Body {
        let response = self
            .router
            .clone()
            .oneshot(Request::get("/api/v1/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );
        response.into_body()
    }
}

/// Read the next complete SSE frame (up to and including the blank line)
pub async fn next_sse_frame(body: &mut Body, buffer: &mut String) -> Option<String> {
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let frame = buffer[..end + 2].to_string();
            buffer.drain(..end + 2);
            return Some(frame);
        }

        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for SSE frame")?
            .ok()?;
        if let Ok(data) = frame.into_data() {
            buffer.push_str(std::str::from_utf8(&data).unwrap());
        }
    }
}

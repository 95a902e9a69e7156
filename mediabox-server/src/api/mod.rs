//! HTTP API
//!
//! - `GET /health`
//! - `POST /api/v1/trigger` publishes a `message` event
//! - `GET /api/v1/events` live-update stream (SSE)
//! - `GET /api/v1/{category}/{path...}` action dispatch
//! - anything else is served from the public directory

pub mod handlers;
pub mod rate_limit;
pub mod server;
pub mod sse;

pub use server::{build_router, serve, AppState, HttpOptions};

//! The API action table
//!
//! Every `/api/v1/{category}/{path}` endpoint is declared here. Handlers live
//! in one module per category and receive a clone of [`AppContext`].

mod admin;
mod bluetooth;
mod content;
mod library;
mod play;
mod transport;

use tracing::error;

use crate::actions::{ActionClass, ActionRegistry};
use crate::error::{Error, Result};
use crate::state::AppContext;

/// Build the full action table
pub fn build_registry() -> Result<ActionRegistry<AppContext>> {
    use ActionClass::{Extended, Quick};

    ActionRegistry::builder()
        .register("play", "remote", Extended, play::remote)
        .register("play", "local", Quick, play::local)
        .register("play", "queue", Quick, play::queue)
        .register("content", "get", Quick, content::get)
        .register("transport", "pausetoggle", Quick, transport::pause_toggle)
        .register("transport", "stop", Quick, transport::stop)
        .register("transport", "volume", Quick, transport::volume)
        .register("transport", "seek", Quick, transport::seek)
        .register("library", "get", Quick, library::get)
        .register("library", "scanfolder", Extended, library::scan_folder)
        .register("admin", "logs", Quick, admin::logs)
        .register("admin", "restartservice", Quick, admin::restart_service)
        .register("admin", "startservice", Quick, admin::start_service)
        .register("admin", "stopservice", Quick, admin::stop_service)
        .register("admin", "statusservice", Quick, admin::status_service)
        .register("admin", "reboot", Quick, admin::reboot)
        .register("bluetooth", "metadata", Quick, bluetooth::metadata)
        .register("bluetooth", "devices", Quick, bluetooth::devices)
        .register("bluetooth", "discovery/start", Quick, bluetooth::start_discovery)
        .register("bluetooth", "discovery/stop", Quick, bluetooth::stop_discovery)
        .register("bluetooth", "device/pair", Extended, bluetooth::pair)
        .register("bluetooth", "device/connect", Extended, bluetooth::connect)
        .register("bluetooth", "device/unpair", Quick, bluetooth::unpair)
        .register("bluetooth", "pin", Quick, bluetooth::pin)
        .build()
}

/// A required query parameter; absent and empty are both missing
fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadRequest(format!("Missing {} parameter.", name)))
}

/// Log a collaborator failure and replace it with a fixed client message
///
/// Request-level errors (400/404) keep their own message.
fn mask(err: Error, public: impl Into<String>, wrap: fn(String) -> Error) -> Error {
    match err {
        e @ (Error::BadRequest(_) | Error::NotFound(_)) => e,
        e => {
            let public = public.into();
            error!("{} ({})", public, e);
            wrap(public)
        }
    }
}

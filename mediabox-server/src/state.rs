//! Shared context handed to every API action

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::bluetooth::Bluetooth;
use crate::playback::{Player, RemoteFetcher};
use crate::sse::EventBus;
use crate::system::ServiceControl;

/// Directories actions read from or write to
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub views_dir: PathBuf,
    pub media_root: PathBuf,
    pub log_dir: PathBuf,
    pub artwork_dir: PathBuf,
}

/// Collaborators available to action handlers
///
/// Cheap to clone; a fresh clone is passed to each invocation.
#[derive(Clone)]
pub struct AppContext {
    pub bus: EventBus,
    pub player: Arc<dyn Player>,
    pub fetcher: Arc<RemoteFetcher>,
    pub library: SqlitePool,
    pub bluetooth: Arc<dyn Bluetooth>,
    pub services: Arc<dyn ServiceControl>,
    pub paths: Arc<AppPaths>,
}

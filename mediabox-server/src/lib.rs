//! mediabox-server library
//!
//! Media playback control server: an action table reachable over HTTP, a
//! live-update event stream over SSE, and the collaborators (player, library,
//! Bluetooth, service manager) the actions drive.

pub mod actions;
pub mod api;
pub mod bluetooth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod paths;
pub mod playback;
pub mod sse;
pub mod state;
pub mod system;

pub use error::{Error, Result};
pub use state::{AppContext, AppPaths};

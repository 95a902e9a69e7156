//! Server-Sent Events (SSE) live-update channel
//!
//! - [`ClientRegistry`] owns every connected client and its heartbeat
//! - [`EventBus`] is the single publish point used by the rest of the server
//! - [`SseFrame`] is what gets written to a client's stream

pub mod bus;
pub mod clients;
pub mod events;
mod heartbeat;

pub use bus::{forward_playback_events, EventBus};
pub use clients::{ClientGuard, ClientRegistry, Departure};
pub use events::SseFrame;

//! Event bus: the single publish point for live-update events
//!
//! Publishers hand over a name and any serializable payload; the bus owns
//! serialization and delivery through the [`ClientRegistry`].

use mediabox_common::events::PlaybackEvent;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ClientRegistry, SseFrame};

/// Publishes events to every connected live-update client
#[derive(Clone)]
pub struct EventBus {
    clients: Arc<ClientRegistry>,
}

impl EventBus {
    pub fn new(clients: Arc<ClientRegistry>) -> Self {
        Self { clients }
    }

    /// Serialize and broadcast one event
    ///
    /// Delivery happens before this returns. Returns the number of clients
    /// that received the frame; 0 with no clients connected is not an error.
    pub fn publish(&self, name: &str, payload: impl Serialize) -> usize {
        let frame = match SseFrame::event(name, &payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to serialize event \"{}\": {}", name, e);
                return 0;
            }
        };

        info!("Event \"{}\" received, emitting to all clients", name);
        let delivered = self.clients.broadcast(&frame);
        debug!("Event \"{}\" delivered to {} clients", name, delivered);
        delivered
    }

    /// Republish a player notification under its `playback*` name
    pub fn publish_playback(&self, event: &PlaybackEvent) -> usize {
        self.publish(event.event_name(), event.payload())
    }

    /// Number of connected clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }
}

/// Bridge player notifications onto the bus until the player side closes
pub fn forward_playback_events(
    bus: EventBus,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match &event {
                PlaybackEvent::TimePosition(seconds) => debug!("Playback time: {}", seconds),
                other => info!("Player event: {}", other.source_name()),
            }
            bus.publish_playback(&event);
        }
        debug!("Playback event bridge stopped");
    })
}

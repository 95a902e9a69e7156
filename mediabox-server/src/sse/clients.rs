//! Connected live-update clients
//!
//! The registry is the only owner of client transports. Each entry carries
//! its heartbeat, so admission starts the timer and any removal path (close,
//! failed broadcast write, failed heartbeat) cancels it in the same step.
//!
//! Client lifecycle: `Connecting → Active → (Closing | Failed) → Removed`.
//! Ids are fresh v4 UUIDs and are never handed out again once removed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::heartbeat::Heartbeat;
use super::SseFrame;

/// Why a client left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The transport reported the connection closed
    Closed,
    /// Writing a broadcast frame failed
    WriteFailed,
    /// Writing a keep-alive failed
    HeartbeatFailed,
}

struct ClientEntry {
    id: Uuid,
    transport: mpsc::Sender<SseFrame>,
    heartbeat: Heartbeat,
}

/// Registry of connected SSE clients, in registration order
pub struct ClientRegistry {
    clients: Mutex<Vec<ClientEntry>>,
    heartbeat_interval: Duration,
    buffer: usize,
    // Back-reference handed to heartbeat tasks
    me: Weak<ClientRegistry>,
}

impl ClientRegistry {
    /// Create a registry
    ///
    /// # Arguments
    ///
    /// * `heartbeat_interval` - keep-alive period for every client (15 s in production)
    /// * `buffer` - frames queued per client before a write counts as failed
    pub fn new(heartbeat_interval: Duration, buffer: usize) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            clients: Mutex::new(Vec::new()),
            heartbeat_interval,
            buffer: buffer.max(1),
            me: me.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ClientEntry>> {
        // A panic while holding the lock cannot leave the Vec half-updated
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a new client on `transport` and return its id
    ///
    /// The `Connected` frame is queued before the client becomes visible to
    /// broadcasts, so it is always the first frame on the stream. Must be
    /// called from within a Tokio runtime (the heartbeat is a spawned task).
    pub fn add(&self, transport: mpsc::Sender<SseFrame>) -> Uuid {
        let mut clients = self.lock();

        let mut id = Uuid::new_v4();
        while clients.iter().any(|c| c.id == id) {
            id = Uuid::new_v4();
        }

        if let Err(e) = transport.try_send(SseFrame::Connected(id)) {
            warn!(client_id = %id, "Client transport unusable at admission: {}", e);
            return id;
        }

        let heartbeat = Heartbeat::start(
            self.me.clone(),
            id,
            transport.clone(),
            self.heartbeat_interval,
        );
        clients.push(ClientEntry {
            id,
            transport,
            heartbeat,
        });

        info!(client_id = %id, "Client connected");
        info!("Clients connected: {}", clients.len());
        id
    }

    /// Create a transport channel sized for this registry and admit it
    pub fn connect(&self) -> (Uuid, mpsc::Receiver<SseFrame>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.add(tx);
        (id, rx)
    }

    /// Remove a client after its connection closed
    ///
    /// Idempotent: returns `false` if the id is not (or no longer) registered.
    pub fn remove(&self, id: Uuid) -> bool {
        self.evict(id, Departure::Closed)
    }

    /// Remove a client for `reason`; its heartbeat is cancelled before return
    pub(crate) fn evict(&self, id: Uuid, reason: Departure) -> bool {
        let removed = {
            let mut clients = self.lock();
            let position = clients.iter().position(|c| c.id == id);
            position.map(|index| (clients.remove(index), clients.len()))
        };

        match removed {
            Some((entry, remaining)) => {
                drop(entry);
                info!(client_id = %id, ?reason, "Client disconnected");
                info!("Clients connected: {}", remaining);
                true
            }
            None => {
                debug!(client_id = %id, ?reason, "Client already removed");
                false
            }
        }
    }

    /// Deliver `frame` to every client in registration order
    ///
    /// Writes never block. A client whose write fails is evicted after the
    /// pass; the remaining clients still receive the frame. Returns the number
    /// of clients the frame was delivered to.
    pub fn broadcast(&self, frame: &SseFrame) -> usize {
        let mut clients = self.lock();
        if clients.is_empty() {
            return 0;
        }

        let mut failed = Vec::new();
        for client in clients.iter() {
            match client.transport.try_send(frame.clone()) {
                Ok(()) => debug!(client_id = %client.id, event = ?frame.name(), "Emitting event to client"),
                Err(e) => {
                    warn!(client_id = %client.id, "Write to client failed: {}", e);
                    failed.push(client.id);
                }
            }
        }

        let delivered = clients.len() - failed.len();
        if !failed.is_empty() {
            clients.retain(|c| !failed.contains(&c.id));
            let remaining = clients.len();
            drop(clients);
            for id in &failed {
                info!(client_id = %id, reason = ?Departure::WriteFailed, "Client disconnected");
            }
            info!("Clients connected: {}", remaining);
        }

        delivered
    }

    /// Remove every client, ending their streams (used at shutdown)
    pub fn disconnect_all(&self) -> usize {
        let drained: Vec<ClientEntry> = self.lock().drain(..).collect();
        let count = drained.len();
        drop(drained);
        if count > 0 {
            info!("Disconnected {} clients", count);
        }
        count
    }

    /// Number of connected clients
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of connected clients, in registration order
    pub fn ids(&self) -> Vec<Uuid> {
        self.lock().iter().map(|c| c.id).collect()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.lock().iter().any(|c| c.id == id)
    }

    /// Number of clients whose heartbeat task is still running
    pub fn running_heartbeats(&self) -> usize {
        self.lock().iter().filter(|c| c.heartbeat.is_running()).count()
    }
}

/// Removes its client from the registry when dropped
///
/// Held by the HTTP response stream; the stream is dropped when the peer
/// disconnects, which makes removal deterministic even without a close event.
pub struct ClientGuard {
    registry: Arc<ClientRegistry>,
    id: Uuid,
}

impl ClientGuard {
    pub fn new(registry: Arc<ClientRegistry>, id: Uuid) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

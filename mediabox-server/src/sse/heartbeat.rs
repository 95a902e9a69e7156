//! Per-client keep-alive timer
//!
//! A heartbeat lives inside its client's registry entry: dropping the entry
//! aborts the timer, so a client and its heartbeat are always created and
//! destroyed together.

use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{trace, warn};
use uuid::Uuid;

use super::clients::{ClientRegistry, Departure};
use super::SseFrame;

pub(crate) struct Heartbeat {
    task: JoinHandle<()>,
}

impl Heartbeat {
    /// Start sending [`SseFrame::Ping`] every `interval`
    ///
    /// The first ping is sent one full interval after admission. A failed
    /// write evicts the client, which in turn drops (and aborts) this timer.
    pub(crate) fn start(
        registry: Weak<ClientRegistry>,
        client_id: Uuid,
        transport: mpsc::Sender<SseFrame>,
        interval: Duration,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match transport.try_send(SseFrame::Ping) {
                    Ok(()) => trace!(%client_id, "Heartbeat sent"),
                    Err(e) => {
                        warn!(%client_id, "Error sending ping to client: {}", e);
                        if let Some(registry) = registry.upgrade() {
                            registry.evict(client_id, Departure::HeartbeatFailed);
                        }
                        break;
                    }
                }
            }
        });

        Self { task }
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

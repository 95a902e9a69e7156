//! `GET /api/v1/events`

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use super::AppState;
use crate::sse::{ClientGuard, SseFrame};

/// Open a live-update stream
///
/// The first frame announces the client id; pings and published events
/// follow. When the peer goes away the response stream is dropped, and with
/// it the guard that removes the client.
pub async fn event_stream(State(state): State<AppState>) -> Sse<ClientStream> {
    let clients = Arc::clone(state.bus.clients());
    let (id, frames) = clients.connect();
    debug!(client_id = %id, "SSE stream opened");

    Sse::new(ClientStream {
        frames: ReceiverStream::new(frames),
        _guard: ClientGuard::new(clients, id),
    })
}

/// A client's frames, bound to its registry membership
pub struct ClientStream {
    frames: ReceiverStream<SseFrame>,
    _guard: ClientGuard,
}

impl Stream for ClientStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames)
            .poll_next(cx)
            .map(|frame| frame.map(|f| Ok(f.into_event())))
    }
}

//! SSE frame types written to live-update clients

use axum::response::sse::Event;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One unit written to a client's event stream
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// First frame of every stream, announcing the assigned client id
    Connected(Uuid),
    /// Named event with a JSON payload (already serialized)
    Event { name: Arc<str>, data: Arc<str> },
    /// Keep-alive
    Ping,
}

impl SseFrame {
    /// Serialize `payload` once; the frame is then cloned per client
    pub fn event(name: &str, payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_string(payload)?;
        Ok(SseFrame::Event {
            name: Arc::from(name),
            data: Arc::from(data),
        })
    }

    /// Event name, if this is a named event
    pub fn name(&self) -> Option<&str> {
        match self {
            SseFrame::Event { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Format as SSE protocol string
    pub fn to_sse_string(&self) -> String {
        match self {
            SseFrame::Connected(id) => format!("data: Connected as client {}\n\n", id),
            SseFrame::Event { name, data } => format!("event: {}\ndata: {}\n\n", name, data),
            SseFrame::Ping => "data: ping\n\n".to_string(),
        }
    }

    /// Convert to an axum SSE event
    pub fn into_event(self) -> Event {
        match self {
            SseFrame::Connected(id) => {
                Event::default().data(format!("Connected as client {}", id))
            }
            SseFrame::Event { name, data } => Event::default().event(&*name).data(&*data),
            SseFrame::Ping => Event::default().data("ping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let frame = SseFrame::event("playbackStarted", &json!("x")).unwrap();
        assert_eq!(frame.name(), Some("playbackStarted"));
        assert_eq!(frame.to_sse_string(), "event: playbackStarted\ndata: \"x\"\n\n");

        assert_eq!(SseFrame::Ping.to_sse_string(), "data: ping\n\n");

        let id = Uuid::new_v4();
        assert_eq!(
            SseFrame::Connected(id).to_sse_string(),
            format!("data: Connected as client {}\n\n", id)
        );
    }

    #[test]
    fn test_object_payload_serialized_compactly() {
        let frame = SseFrame::event("playbackSeek", &json!({"start": 1.5, "end": 20.0})).unwrap();
        assert_eq!(
            frame.to_sse_string(),
            "event: playbackSeek\ndata: {\"end\":20.0,\"start\":1.5}\n\n"
        );
    }
}

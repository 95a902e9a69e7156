//! Live-update stream tests through the HTTP router

mod helpers;

use axum::http::StatusCode;
use helpers::{next_sse_frame, TestServer};
use mediabox_common::events::PlaybackEvent;
use serde_json::json;

#[tokio::test]
async fn test_stream_starts_with_connected_frame() {
    let server = TestServer::start().await;
    let mut body = server.open_event_stream().await;
    let mut buffer = String::new();

    let first = next_sse_frame(&mut body, &mut buffer).await.unwrap();
    let id = server.clients.ids()[0];
    assert_eq!(first, format!("data: Connected as client {}\n\n", id));
}

#[tokio::test]
async fn test_three_clients_receive_trigger_and_disconnect_is_removed() {
    let server = TestServer::start().await;

    let mut streams = Vec::new();
    for _ in 0..3 {
        let mut body = server.open_event_stream().await;
        let mut buffer = String::new();
        let connected = next_sse_frame(&mut body, &mut buffer).await.unwrap();
        assert!(connected.starts_with("data: Connected as client "));
        streams.push((body, buffer));
    }
    assert_eq!(server.clients.len(), 3);

    let (status, _) = server
        .post_json("/api/v1/trigger", json!({"message": "hi"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    for (body, buffer) in streams.iter_mut() {
        let frame = next_sse_frame(body, buffer).await.unwrap();
        assert_eq!(frame, "event: message\ndata: \"hi\"\n\n");
    }

    // Closing one stream removes exactly that client
    let (closed, _) = streams.remove(1);
    drop(closed);
    assert_eq!(server.clients.len(), 2);
    assert_eq!(server.clients.running_heartbeats(), 2);

    let (_, body) = server.get("/health").await;
    assert_eq!(body["clients"], 2);

    let (status, _) = server.post_json("/api/v1/trigger", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    for (body, buffer) in streams.iter_mut() {
        let frame = next_sse_frame(body, buffer).await.unwrap();
        assert_eq!(frame, "event: message\ndata: \"Default message\"\n\n");
    }
}

#[tokio::test]
async fn test_playback_events_reach_stream() {
    let server = TestServer::start().await;
    let mut body = server.open_event_stream().await;
    let mut buffer = String::new();
    next_sse_frame(&mut body, &mut buffer).await.unwrap();

    server.bus.publish_playback(&PlaybackEvent::TimePosition(42.0));
    server.bus.publish_playback(&PlaybackEvent::Paused);

    assert_eq!(
        next_sse_frame(&mut body, &mut buffer).await.unwrap(),
        "event: playbackTime\ndata: 42.0\n\n"
    );
    assert_eq!(
        next_sse_frame(&mut body, &mut buffer).await.unwrap(),
        "event: playbackPaused\ndata: \"Audio playback has been paused\"\n\n"
    );
}

#[tokio::test]
async fn test_library_import_notifies_stream() {
    let server = TestServer::start().await;
    std::fs::create_dir_all(server.path("media/empty")).unwrap();
    let mut body = server.open_event_stream().await;
    let mut buffer = String::new();
    next_sse_frame(&mut body, &mut buffer).await.unwrap();

    let (status, reply) = server
        .get("/api/v1/library/scanfolder?folder=empty&import=true")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["imported"], 0);

    assert_eq!(
        next_sse_frame(&mut body, &mut buffer).await.unwrap(),
        "event: libraryUpdated\ndata: {\"imported\":0}\n\n"
    );
}

// Integration tests for `FeedHandle` against a local WebSocket server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;
use url::Url;

use meshview_api::{FeedEvent, FeedHandle, ReconnectConfig};

// ── Helpers ─────────────────────────────────────────────────────────

/// Accept one client, send `frames`, then close with a normal close frame.
async fn serve_once(frames: Vec<Message>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        ws.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }))
        .await
        .unwrap();
    });

    Url::parse(&format!("ws://{addr}/websocket")).unwrap()
}

async fn next(feed: &mut FeedHandle) -> FeedEvent {
    tokio::time::timeout(Duration::from_secs(5), feed.next_event())
        .await
        .expect("feed event within timeout")
        .expect("feed still open")
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forwards_frames_in_order() {
    let url = serve_once(vec![
        Message::Text(r#"[{"Types":"node","Id":1}]"#.into()),
        Message::Text("null".into()),
    ])
    .await;

    let mut feed =
        FeedHandle::connect(url, ReconnectConfig::default(), CancellationToken::new()).unwrap();

    assert_eq!(next(&mut feed).await, FeedEvent::Connected);
    assert_eq!(
        next(&mut feed).await,
        FeedEvent::Message(r#"[{"Types":"node","Id":1}]"#.into())
    );
    assert_eq!(next(&mut feed).await, FeedEvent::Message("null".into()));
    assert_eq!(
        next(&mut feed).await,
        FeedEvent::Closed {
            reason: "connection closed (1000)".into()
        }
    );
}

#[tokio::test]
async fn test_utf8_binary_frames_are_forwarded_as_text() {
    let url = serve_once(vec![Message::Binary(b"[]".to_vec().into())]).await;

    let mut feed =
        FeedHandle::connect(url, ReconnectConfig::default(), CancellationToken::new()).unwrap();

    assert_eq!(next(&mut feed).await, FeedEvent::Connected);
    assert_eq!(next(&mut feed).await, FeedEvent::Message("[]".into()));
}

#[tokio::test]
async fn test_closed_feed_is_not_retried_by_default() {
    let url = serve_once(Vec::new()).await;

    let mut feed =
        FeedHandle::connect(url, ReconnectConfig::default(), CancellationToken::new()).unwrap();

    assert_eq!(next(&mut feed).await, FeedEvent::Connected);
    assert!(matches!(next(&mut feed).await, FeedEvent::Closed { .. }));

    // The task exits, so the channel drains to `None`.
    let end = tokio::time::timeout(Duration::from_secs(5), feed.next_event())
        .await
        .unwrap();
    assert!(end.is_none());
}

#[tokio::test]
async fn test_refused_connection_reports_closed() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/websocket")).unwrap();
    let mut feed =
        FeedHandle::connect(url, ReconnectConfig::default(), CancellationToken::new()).unwrap();

    match next(&mut feed).await {
        FeedEvent::Closed { reason } => {
            assert!(reason.contains("WebSocket connection failed"), "{reason}");
        }
        other => panic!("expected Closed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shutdown_stops_the_feed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and hold the connection open without sending anything.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let url = Url::parse(&format!("ws://{addr}/websocket")).unwrap();
    let mut feed =
        FeedHandle::connect(url, ReconnectConfig::forever(), CancellationToken::new()).unwrap();

    assert_eq!(next(&mut feed).await, FeedEvent::Connected);
    feed.shutdown();

    let end = tokio::time::timeout(Duration::from_secs(5), feed.next_event())
        .await
        .unwrap();
    assert!(end.is_none());
}

// ABOUTME: Integration tests for the progress feed against a local STOMP-over-WebSocket server
// ABOUTME: Covers the subscribe/release lifecycle, malformed payloads, reconnects and handshake timeouts

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use import_console::progress::stomp::parse_frames;
use import_console::progress::{FeedSettings, ProgressFeed, ProgressReconciler};
use import_console::remote::models::JobStatus;

const TOPIC: &str = "/topic/import-progress";

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws/websocket", listener.local_addr().unwrap());
    (listener, url)
}

fn settings(url: String) -> FeedSettings {
    FeedSettings {
        url,
        topic: TOPIC.to_string(),
        reconnect_delay: Duration::from_millis(50),
        heartbeat: Duration::ZERO,
    }
}

/// Next client frame command, skipping heart-beat EOLs.
async fn next_command(ws: &mut WebSocketStream<TcpStream>) -> Option<String> {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            if let Some(frame) = parse_frames(&text).unwrap().into_iter().next() {
                return Some(frame.command);
            }
        }
    }
    None
}

async fn handshake(ws: &mut WebSocketStream<TcpStream>) {
    assert_eq!(next_command(ws).await.as_deref(), Some("CONNECT"));
    ws.send(Message::Text(
        "CONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0".to_string(),
    ))
    .await
    .unwrap();

    let text = loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => break text,
            Some(Ok(_)) => continue,
            other => panic!("expected SUBSCRIBE, got {:?}", other),
        }
    };
    let frame = parse_frames(&text).unwrap().remove(0);
    assert_eq!(frame.command, "SUBSCRIBE");
    assert_eq!(frame.get("destination"), Some(TOPIC));
}

fn message_frame(body: &str) -> Message {
    Message::Text(format!(
        "MESSAGE\ndestination:{}\nsubscription:sub-0\nmessage-id:1\ncontent-type:application/json\n\n{}\0",
        TOPIC, body
    ))
}

async fn wait_for(reconciler: &ProgressReconciler, check: impl Fn(&ProgressReconciler) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check(reconciler) {
        assert!(Instant::now() < deadline, "timed out waiting for feed state");
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_subscribe_apply_and_release() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        handshake(&mut ws).await;

        ws.send(message_frame("{not json")).await.unwrap();
        ws.send(message_frame(
            r#"{"importId":7,"status":"ACTIVE","currentRecord":50,"totalRecords":200}"#,
        ))
        .await
        .unwrap();

        let mut after = Vec::new();
        while let Some(command) = next_command(&mut ws).await {
            after.push(command);
        }
        after
    });

    let feed = ProgressFeed::subscribe(settings(url));
    let reconciler = feed.reconciler();

    wait_for(&reconciler, |r| r.status(7, None) == Some(JobStatus::Active)).await;
    assert!(feed.is_connected());
    assert_eq!(reconciler.display_progress(7).as_deref(), Some("50/200"));

    feed.release().await;
    assert!(!reconciler.is_connected());

    let after = timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not finish")
        .unwrap();
    assert_eq!(after, vec!["UNSUBSCRIBE".to_string(), "DISCONNECT".to_string()]);
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        assert_eq!(next_command(&mut ws).await.as_deref(), Some("CONNECT"));
        drop(ws);

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        handshake(&mut ws).await;
        ws.send(message_frame(
            r#"{"importId":3,"status":"COMPLETED","currentRecord":10,"totalRecords":10,"completionDatetime":"2024-05-01T10:00:00"}"#,
        ))
        .await
        .unwrap();
        while next_command(&mut ws).await.is_some() {}
    });

    let feed = ProgressFeed::subscribe(settings(url));
    let reconciler = feed.reconciler();

    wait_for(&reconciler, |r| r.status(3, None) == Some(JobStatus::Completed)).await;
    assert!(reconciler.is_connected());
    assert!(reconciler.completion_time(3, None).is_some());

    feed.release().await;
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_error_frame_before_connected_retries() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        assert_eq!(next_command(&mut ws).await.as_deref(), Some("CONNECT"));
        ws.send(Message::Text(
            "ERROR\nmessage:not now\n\n\0".to_string(),
        ))
        .await
        .unwrap();

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        handshake(&mut ws).await;
        while next_command(&mut ws).await.is_some() {}
    });

    let feed = ProgressFeed::subscribe(settings(url));
    let reconciler = feed.reconciler();
    wait_for(&reconciler, |r| r.is_connected()).await;

    feed.release().await;
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_silent_server_times_out_and_reconnects() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut silent = accept_async(stream).await.unwrap();
        assert_eq!(next_command(&mut silent).await.as_deref(), Some("CONNECT"));

        // Never answer; the client has to give up on its own.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        handshake(&mut ws).await;
        while next_command(&mut ws).await.is_some() {}
        drop(silent);
    });

    let feed = ProgressFeed::subscribe(settings(url));
    let reconciler = feed.reconciler();
    wait_for(&reconciler, |r| r.is_connected()).await;

    feed.release().await;
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

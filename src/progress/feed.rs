// ABOUTME: Long-lived STOMP-over-WebSocket subscription to job progress snapshots
// ABOUTME: Acquire with subscribe, release with unsubscribe+disconnect; reconnects after a fixed delay

use futures::{SinkExt, StreamExt};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, sleep_until, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::board::{ProgressBoard, ProgressReconciler};
use super::stomp::{parse_frames, Frame, Heartbeat};
use crate::config::Config;
use crate::error::{ConsoleError, Result};
use crate::remote::models::ProgressSnapshot;

const SUBSCRIPTION_ID: &str = "sub-0";
const MIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub url: String,
    pub topic: String,
    pub reconnect_delay: Duration,
    /// Zero disables heart-beats in both directions.
    pub heartbeat: Duration,
}

impl From<&Config> for FeedSettings {
    fn from(config: &Config) -> Self {
        Self {
            url: config.ws_url.clone(),
            topic: config.progress_topic.clone(),
            reconnect_delay: config.reconnect_delay(),
            heartbeat: config.heartbeat(),
        }
    }
}

/// Owns the push subscription for the lifetime of a view.
///
/// Consumers only see the [`ProgressReconciler`]; the transport never leaks.
/// Dropping the feed cancels it, `release` additionally waits for the
/// UNSUBSCRIBE/DISCONNECT exchange to finish.
pub struct ProgressFeed {
    reconciler: ProgressReconciler,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressFeed {
    pub fn subscribe(settings: FeedSettings) -> Self {
        let board = Arc::new(RwLock::new(ProgressBoard::new()));
        let (connected_tx, connected_rx) = watch::channel(false);
        let reconciler = ProgressReconciler::new(board, connected_rx);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            settings,
            reconciler.clone(),
            connected_tx,
            cancel.clone(),
        ));

        Self {
            reconciler,
            cancel,
            task: Some(task),
        }
    }

    pub fn reconciler(&self) -> ProgressReconciler {
        self.reconciler.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.reconciler.is_connected()
    }

    pub async fn release(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Progress feed task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ProgressFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    settings: FeedSettings,
    reconciler: ProgressReconciler,
    connected: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    loop {
        match session(&settings, &reconciler, &connected, &cancel).await {
            Ok(()) => break,
            Err(e) => warn!("Progress feed disconnected: {}", e),
        }
        connected.send_replace(false);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(settings.reconnect_delay) => {
                debug!("Reconnecting progress feed to {}", settings.url);
            }
        }
    }
    connected.send_replace(false);
    info!("Progress feed released");
}

/// How long to wait for CONNECTED once the socket is open.
fn handshake_timeout(settings: &FeedSettings) -> Duration {
    (settings.reconnect_delay * 2).max(MIN_HANDSHAKE_TIMEOUT)
}

/// One connection attempt. `Ok` means the feed was cancelled and shut down cleanly.
async fn session(
    settings: &FeedSettings,
    reconciler: &ProgressReconciler,
    connected: &watch::Sender<bool>,
    cancel: &CancellationToken,
) -> Result<()> {
    let stream = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        result = connect_async(settings.url.as_str()) => {
            result.map_err(|e| ConsoleError::push(format!("connect to {}: {}", settings.url, e)))?.0
        }
    };
    let (mut sink, mut source) = stream.split();

    let host = host_of(&settings.url);
    send(&mut sink, Frame::connect(&host, settings.heartbeat)).await?;

    let deadline = Instant::now() + handshake_timeout(settings);
    let heartbeat = loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = sleep_until(deadline) => {
                return Err(ConsoleError::push("no CONNECTED frame before the handshake timeout"))
            }
            message = source.next() => message,
        };
        let text = match message {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => {
                return Err(ConsoleError::push("closed before CONNECTED"))
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(ConsoleError::push(e.to_string())),
        };
        if let Some(frame) = parse_frames(&text)?.into_iter().next() {
            match frame.command.as_str() {
                "CONNECTED" => break Heartbeat::negotiate(settings.heartbeat, frame.get("heart-beat")),
                "ERROR" => return Err(stomp_error(&frame)),
                other => debug!("Ignoring {} before CONNECTED", other),
            }
        }
    };

    send(&mut sink, Frame::subscribe(SUBSCRIPTION_ID, &settings.topic)).await?;
    connected.send_replace(true);
    info!("Progress feed connected, subscribed to {}", settings.topic);

    let tick_period = match (heartbeat.outgoing, heartbeat.incoming) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    let ticking = tick_period.is_some();
    let period = tick_period.unwrap_or(Duration::from_secs(3600));
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut last_seen = Instant::now();
    let mut last_sent = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                send(&mut sink, Frame::unsubscribe(SUBSCRIPTION_ID)).await?;
                send(&mut sink, Frame::disconnect()).await?;
                let _ = sink.close().await;
                return Ok(());
            }
            _ = ticker.tick(), if ticking => {
                if let Some(incoming) = heartbeat.incoming {
                    // Allow some slack before declaring the server gone.
                    if last_seen.elapsed() > incoming * 2 {
                        return Err(ConsoleError::push("server heart-beat missed"));
                    }
                }
                if let Some(outgoing) = heartbeat.outgoing {
                    if last_sent.elapsed() >= outgoing {
                        sink.send(Message::Text("\n".to_string()))
                            .await
                            .map_err(|e| ConsoleError::push(e.to_string()))?;
                        last_sent = Instant::now();
                    }
                }
            }
            message = source.next() => {
                last_seen = Instant::now();
                match message {
                    Some(Ok(Message::Text(text))) => {
                        for frame in parse_frames(&text)? {
                            handle_frame(&frame, reconciler)?;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(ConsoleError::push("connection closed by server"))
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ConsoleError::push(e.to_string())),
                }
            }
        }
    }
}

/// Apply one server frame. Malformed snapshots are skipped, ERROR frames end the session.
pub(crate) fn handle_frame(frame: &Frame, reconciler: &ProgressReconciler) -> Result<()> {
    match frame.command.as_str() {
        "MESSAGE" => match serde_json::from_str::<ProgressSnapshot>(&frame.body) {
            Ok(snapshot) => {
                debug!(
                    "Progress for import {}: {} ({}/{})",
                    snapshot.import_id,
                    snapshot.status,
                    snapshot.current_record,
                    snapshot.total_records
                );
                reconciler.apply(snapshot);
            }
            Err(e) => warn!("Skipping malformed progress message: {}", e),
        },
        "ERROR" => return Err(stomp_error(frame)),
        "RECEIPT" => {}
        other => debug!("Ignoring STOMP {} frame", other),
    }
    Ok(())
}

fn stomp_error(frame: &Frame) -> ConsoleError {
    ConsoleError::push(format!(
        "STOMP error: {} {}",
        frame.get("message").unwrap_or("(no message)"),
        frame.body.trim()
    ))
}

async fn send<S>(sink: &mut S, frame: Frame) -> Result<()>
where
    S: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    sink.send(Message::Text(frame.encode()))
        .await
        .map_err(|e| ConsoleError::push(e.to_string()))
}

fn host_of(url: &str) -> String {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .and_then(|authority| authority.split(':').next())
        .unwrap_or("localhost")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::models::JobStatus;

    #[test]
    fn message_frame_updates_reconciler() {
        let reconciler = ProgressReconciler::detached();
        let frame = Frame {
            command: "MESSAGE".to_string(),
            headers: vec![("subscription".to_string(), SUBSCRIPTION_ID.to_string())],
            body: r#"{"importId":4,"status":"ACTIVE","currentRecord":20,"totalRecords":80}"#
                .to_string(),
        };
        handle_frame(&frame, &reconciler).unwrap();
        assert_eq!(reconciler.status(4, None), Some(JobStatus::Active));
        assert_eq!(reconciler.display_progress(4).as_deref(), Some("20/80"));
    }

    #[test]
    fn malformed_body_is_skipped_not_fatal() {
        let reconciler = ProgressReconciler::detached();
        let mut frame = Frame::new("MESSAGE");
        frame.body = "not json".to_string();
        assert!(handle_frame(&frame, &reconciler).is_ok());
        assert!(reconciler.read(|b| b.is_empty()));
    }

    #[test]
    fn error_frame_ends_session() {
        let reconciler = ProgressReconciler::detached();
        let frame = Frame::new("ERROR").header("message", "access denied");
        let err = handle_frame(&frame, &reconciler).unwrap_err();
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn handshake_timeout_follows_reconnect_delay_with_floor() {
        let mut settings = FeedSettings {
            url: "ws://localhost:8080/ws/websocket".to_string(),
            topic: "/topic/import-progress".to_string(),
            reconnect_delay: Duration::from_secs(5),
            heartbeat: Duration::ZERO,
        };
        assert_eq!(handshake_timeout(&settings), Duration::from_secs(10));

        settings.reconnect_delay = Duration::from_millis(50);
        assert_eq!(handshake_timeout(&settings), MIN_HANDSHAKE_TIMEOUT);
    }

    #[test]
    fn host_is_extracted_from_ws_url() {
        assert_eq!(host_of("ws://localhost:8080/ws/websocket"), "localhost");
        assert_eq!(host_of("wss://imports.example.com/ws"), "imports.example.com");
    }
}

//! WebSocket snapshot feed.
//!
//! Connects to a mesh monitor's WebSocket endpoint and forwards every text
//! frame, together with connect/close lifecycle events, through a
//! [`tokio::sync::mpsc`] channel. Frames are not interpreted here; decoding
//! snapshots belongs to `meshview-core`.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshview_api::{FeedEvent, FeedHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let url = Url::parse("ws://localhost:8000/websocket")?;
//! let mut feed = FeedHandle::connect(url, ReconnectConfig::default(), CancellationToken::new())?;
//!
//! while let Some(event) = feed.next_event().await {
//!     if let FeedEvent::Message(text) = event {
//!         println!("{} bytes", text.len());
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, protocol::CloseFrame};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── FeedEvent ────────────────────────────────────────────────────────

/// Something the transport observed, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The WebSocket handshake completed.
    Connected,

    /// A raw text payload (one snapshot, undecoded).
    Message(String),

    /// The connection closed or could not be established.
    Closed { reason: String },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for feed reconnection.
///
/// The default never reconnects: a closed feed stays closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive reconnection attempts before giving up.
    /// `Some(0)` disables reconnection, `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: Some(0),
        }
    }
}

impl ReconnectConfig {
    /// Retry forever with the default backoff bounds.
    pub fn forever() -> Self {
        Self {
            max_retries: None,
            ..Self::default()
        }
    }

    fn allows_retry(&self, attempt: u32) -> bool {
        self.max_retries.is_none_or(|max| attempt < max)
    }
}

// ── FeedHandle ───────────────────────────────────────────────────────

/// Handle to a running feed task.
///
/// Dropping the handle (or calling [`shutdown`](Self::shutdown)) tears the
/// background task down.
#[derive(Debug)]
pub struct FeedHandle {
    url: Url,
    event_rx: mpsc::Receiver<FeedEvent>,
    cancel: CancellationToken,
}

impl FeedHandle {
    /// Validate the address and spawn the connection loop.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background and is reported as [`FeedEvent::Connected`] or
    /// [`FeedEvent::Closed`]. Must be called from within a tokio runtime.
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        match ws_url.scheme() {
            "ws" | "wss" => {}
            other => return Err(Error::UnsupportedScheme(other.to_owned())),
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let task_url = ws_url.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            feed_loop(task_url, event_tx, reconnect, task_cancel).await;
        });

        Ok(Self {
            url: ws_url,
            event_rx,
            cancel,
        })
    }

    /// The address this feed connects to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Receive the next event. Returns `None` once the task has exited
    /// and every buffered event has been drained.
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.event_rx.recv().await
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background connection loop ───────────────────────────────────────

/// How a single connection ended without a transport error.
enum SessionEnd {
    Closed(String),
    Cancelled,
    ConsumerGone,
}

/// Main loop: connect → read → report close → maybe back off and retry.
async fn feed_loop(
    ws_url: Url,
    event_tx: mpsc::Sender<FeedEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = connect_and_read(&ws_url, &event_tx, &cancel) => outcome,
        };

        let reason = match outcome {
            // The session was established, so the failure streak is over.
            Ok(SessionEnd::Closed(reason)) => {
                attempt = 0;
                reason
            }
            Ok(SessionEnd::Cancelled | SessionEnd::ConsumerGone) => break,
            Err(e) => {
                tracing::warn!(error = %e, attempt, "Feed connection error");
                e.to_string()
            }
        };

        if event_tx.send(FeedEvent::Closed { reason }).await.is_err() {
            break;
        }

        if !reconnect.allows_retry(attempt) {
            tracing::info!(
                max_retries = ?reconnect.max_retries,
                "Feed closed, not reconnecting"
            );
            break;
        }

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }

    tracing::debug!("Feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and forward frames until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &mpsc::Sender<FeedEvent>,
    cancel: &CancellationToken,
) -> Result<SessionEnd, Error> {
    tracing::info!(url = %url, "Connecting to feed");

    let (mut ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!(url = %url, "Feed connected");
    if event_tx.send(FeedEvent::Connected).await.is_err() {
        return Ok(SessionEnd::ConsumerGone);
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(SessionEnd::Cancelled),
            frame = ws_stream.next() => {
                let text = match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => text.as_str().to_owned(),
                    Some(Ok(tungstenite::Message::Binary(data))) => {
                        match std::str::from_utf8(&data) {
                            Ok(text) => text.to_owned(),
                            Err(e) => {
                                tracing::debug!(error = %e, len = data.len(), "Dropping non-UTF-8 binary frame");
                                continue;
                            }
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        let reason = close_reason(frame.as_ref());
                        tracing::info!(%reason, "Feed close frame received");
                        return Ok(SessionEnd::Closed(reason));
                    }
                    Some(Ok(_)) => {
                        // Ping, Pong, raw Frame -- tungstenite answers pings itself
                        continue;
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("Feed stream ended");
                        return Ok(SessionEnd::Closed(close_reason(None)));
                    }
                };

                if event_tx.send(FeedEvent::Message(text)).await.is_err() {
                    return Ok(SessionEnd::ConsumerGone);
                }
            }
        }
    }
}

/// Human-readable close description, e.g. `connection closed (1000)`.
fn close_reason(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(cf) if cf.reason.is_empty() => {
            format!("connection closed ({})", u16::from(cf.code))
        }
        Some(cf) => format!("connection closed ({}): {}", u16::from(cf.code), cf.reason),
        None => "connection closed".to_owned(),
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25%, seeded from the attempt number.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(i32::try_from(attempt.min(30)).unwrap_or(30));
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

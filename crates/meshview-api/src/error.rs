use thiserror::Error;

/// Top-level error type for the `meshview-api` crate.
///
/// Covers the failure modes of the snapshot feed transport.
#[derive(Debug, Error)]
pub enum Error {
    /// The feed address is not a `ws://` or `wss://` URL.
    #[error("Unsupported feed scheme '{0}' (expected ws or wss)")]
    UnsupportedScheme(String),

    /// The WebSocket handshake or stream failed. Reported to the consumer
    /// as a close reason.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),
}

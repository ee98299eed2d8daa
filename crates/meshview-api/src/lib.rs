// meshview-api: WebSocket feed client for mesh topology snapshots.

pub mod error;
pub mod websocket;

pub use error::Error;
pub use websocket::{FeedEvent, FeedHandle, ReconnectConfig};

// meshview-core: Reconciliation engine between the snapshot feed and the views.
//
// Turns successive whole-state snapshots into identity-preserving updates
// to a node/link graph (driving a force layout) and to keyed table rows.

pub mod engine;
pub mod error;
pub mod force;
pub mod graph;
pub mod layout;
pub mod snapshot;
pub mod status;
pub mod table;

use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

// ── Primary re-exports ──────────────────────────────────────────────
pub use engine::{Engine, EngineConfig, EngineStats, Outcome, ReconcileSummary};
pub use error::CoreError;
pub use force::ForceLayout;
pub use graph::{Diagnostic, GraphState, Link, Node, TopologyReport};
pub use layout::{LayoutAdapter, LayoutConfig, LayoutEngine, Point, RestartPolicy, Size};
pub use snapshot::{Entry, NoUpdate, Snapshot, SnapshotCategory};
pub use status::{ConnectionState, Status, StatusReporter, StatusTone};
pub use table::{ApplyReport, Cell, Row, SubTable, TableDiff, TableRowState};

pub use meshview_api::{FeedEvent, FeedHandle, ReconnectConfig};

/// Default feed address.
pub const DEFAULT_FEED_URL: &str = "ws://localhost:8000/websocket";

/// One-time setup: declared headers, layout engine and status, all empty.
pub fn init(config: EngineConfig) -> Engine<ForceLayout> {
    Engine::new(config)
}

/// Open the realtime feed. Events are delivered through the returned
/// handle and fed into [`Engine::handle_feed_event`] by the host loop.
pub fn connect(
    address: &str,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) -> Result<FeedHandle, CoreError> {
    let url = Url::parse(address).map_err(|e| CoreError::Config {
        message: format!("Invalid feed URL '{address}': {e}"),
    })?;
    info!(url = %url, "opening feed");
    Ok(FeedHandle::connect(url, reconnect, cancel)?)
}

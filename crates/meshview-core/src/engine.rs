// ── Reconciliation engine ──
//
// Owns all view state and reacts to feed events one at a time. Every
// failure degrades to "skip this update" or "omit this edge"; nothing
// here returns an error or panics.

use chrono::{DateTime, Utc};
use meshview_api::FeedEvent;
use tracing::{debug, trace, warn};

use crate::force::ForceLayout;
use crate::graph::{Diagnostic, GraphState, TopologyReport};
use crate::layout::{LayoutAdapter, LayoutConfig, LayoutEngine, Point};
use crate::snapshot::{self, NoUpdate, Snapshot, SnapshotCategory};
use crate::status::StatusReporter;
use crate::table::{ApplyReport, TableRowState};

const ZOOM_STEP: f64 = 1.25;

// ── Configuration ────────────────────────────────────────────────────

/// Declared table columns and layout parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub node_headers: Vec<String>,
    pub neighbour_headers: Vec<String>,
    pub layout: LayoutConfig,
}

impl EngineConfig {
    pub fn default_node_headers() -> Vec<String> {
        to_owned(&["Types", "Id", "Hash", "Peer"])
    }

    pub fn default_neighbour_headers() -> Vec<String> {
        to_owned(&["Types", "Ip", "Zone", "Id", "Eid"])
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_headers: Self::default_node_headers(),
            neighbour_headers: Self::default_neighbour_headers(),
            layout: LayoutConfig::default(),
        }
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

// ── Outcomes ─────────────────────────────────────────────────────────

/// What a successful reconciliation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub category: SnapshotCategory,
    pub table: ApplyReport,
    /// Present for topology snapshots only.
    pub topology: Option<TopologyReport>,
    pub layout_restarted: bool,
}

/// Result of handling one raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was touched and no layout pass ran.
    Skipped(NoUpdate),
    Applied(ReconcileSummary),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Running counters, kept separately per skip reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub received: u64,
    pub applied: u64,
    pub malformed: u64,
    pub empty: u64,
    pub unrecognized: u64,
    pub unknown_peers: u64,
    pub last_applied: Option<DateTime<Utc>>,
}

// ── Engine ───────────────────────────────────────────────────────────

/// Graph and table state plus the collaborators that present it.
#[derive(Debug)]
pub struct Engine<E = ForceLayout> {
    graph: GraphState,
    nodes: TableRowState,
    neighbours: TableRowState,
    layout: LayoutAdapter<E>,
    status: StatusReporter,
    stats: EngineStats,
    diagnostics: Vec<Diagnostic>,
}

impl Engine<ForceLayout> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_layout_engine(config, ForceLayout::new())
    }
}

impl<E: LayoutEngine> Engine<E> {
    pub fn with_layout_engine(config: EngineConfig, layout_engine: E) -> Self {
        Self {
            graph: GraphState::new(),
            nodes: TableRowState::new(config.node_headers),
            neighbours: TableRowState::new(config.neighbour_headers),
            layout: LayoutAdapter::new(layout_engine, config.layout),
            status: StatusReporter::new(),
            stats: EngineStats::default(),
            diagnostics: Vec::new(),
        }
    }

    // ── Feed handling ────────────────────────────────────────────────

    /// Route one transport event. Only messages produce an outcome.
    pub fn handle_feed_event(&mut self, event: FeedEvent) -> Option<Outcome> {
        match event {
            FeedEvent::Connected => {
                self.on_connect();
                None
            }
            FeedEvent::Message(raw) => Some(self.handle_message(&raw)),
            FeedEvent::Closed { reason } => {
                self.on_close(&reason);
                None
            }
        }
    }

    pub fn on_connect(&mut self) {
        self.status.on_connect();
    }

    pub fn on_close(&mut self, reason: &str) {
        self.status.on_close(reason);
    }

    /// Parse and reconcile one raw message.
    pub fn handle_message(&mut self, raw: &str) -> Outcome {
        self.stats.received += 1;

        match snapshot::parse(raw) {
            Ok(snapshot) => Outcome::Applied(self.apply(&snapshot)),
            Err(reason) => {
                self.record_skip(&reason, raw.len());
                Outcome::Skipped(reason)
            }
        }
    }

    fn apply(&mut self, snapshot: &Snapshot) -> ReconcileSummary {
        let summary = match snapshot {
            Snapshot::Topology(entries) => {
                let table = self.nodes.reconcile(entries);
                let topology = self.graph.reconcile(entries);
                let layout_restarted = self.layout.apply(&self.graph, topology.structure_changed());

                self.stats.unknown_peers +=
                    u64::try_from(topology.unknown_peers()).unwrap_or(u64::MAX);
                self.diagnostics.clone_from(&topology.diagnostics);
                ReconcileSummary {
                    category: SnapshotCategory::Node,
                    table,
                    topology: Some(topology),
                    layout_restarted,
                }
            }
            Snapshot::Neighbours(entries) => {
                let table = self.neighbours.reconcile(entries);
                let layout_restarted = self.layout.apply(&self.graph, false);
                ReconcileSummary {
                    category: SnapshotCategory::Neighbour,
                    table,
                    topology: None,
                    layout_restarted,
                }
            }
        };

        self.stats.applied += 1;
        self.stats.last_applied = Some(Utc::now());
        debug!(
            category = %summary.category,
            entries = snapshot.entries().len(),
            added = summary.table.added,
            changed = summary.table.changed,
            removed = summary.table.removed,
            "snapshot reconciled"
        );
        summary
    }

    fn record_skip(&mut self, reason: &NoUpdate, len: usize) {
        match reason {
            NoUpdate::Empty => {
                self.stats.empty += 1;
                trace!("empty snapshot");
            }
            NoUpdate::Malformed(_) | NoUpdate::MissingCategory => {
                self.stats.malformed += 1;
                debug!(%reason, len, "malformed snapshot skipped");
            }
            NoUpdate::UnrecognizedSnapshotCategory(category) => {
                self.stats.unrecognized += 1;
                warn!(category = %category, "unrecognized snapshot category");
            }
        }
    }

    // ── Layout ───────────────────────────────────────────────────────

    /// Advance the layout one step. Reads graph state, never mutates it.
    pub fn tick(&mut self) -> bool {
        self.layout.tick()
    }

    pub fn restart_layout(&mut self) {
        self.layout.restart();
    }

    pub fn zoom_in(&mut self) {
        self.layout.set_zoom(self.layout.zoom() * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.layout.set_zoom(self.layout.zoom() / ZOOM_STEP);
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.layout.position(id)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn graph(&self) -> &GraphState {
        &self.graph
    }

    pub fn table(&self, category: SnapshotCategory) -> &TableRowState {
        match category {
            SnapshotCategory::Node => &self.nodes,
            SnapshotCategory::Neighbour => &self.neighbours,
        }
    }

    pub fn layout(&self) -> &LayoutAdapter<E> {
        &self.layout
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Diagnostics from the most recent topology snapshot.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

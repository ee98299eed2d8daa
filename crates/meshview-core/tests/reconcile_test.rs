// End-to-end reconciliation through `Engine`, driven by raw feed text.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;

use meshview_core::{
    Cell, ConnectionState, Diagnostic, Engine, EngineConfig, FeedEvent, GraphState, LayoutConfig,
    LayoutEngine, Link, NoUpdate, Outcome, Point, RestartPolicy, SnapshotCategory,
    StatusTone,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Layout engine that only records what it was asked to do.
#[derive(Debug, Default)]
struct RecordingLayout {
    passes: usize,
    starts: usize,
    last_nodes: Vec<String>,
}

impl LayoutEngine for RecordingLayout {
    fn configure(&mut self, _config: &LayoutConfig) {}
    fn set_graph(&mut self, graph: &GraphState) {
        self.passes += 1;
        self.last_nodes = graph.nodes().map(|n| n.id.clone()).collect();
    }
    fn start(&mut self) {
        self.starts += 1;
    }
    fn tick(&mut self) -> bool {
        false
    }
    fn position(&self, _id: &str) -> Option<Point> {
        None
    }
    fn alpha(&self) -> f64 {
        0.0
    }
}

fn recording_engine(restart: RestartPolicy) -> Engine<RecordingLayout> {
    let config = EngineConfig {
        layout: LayoutConfig {
            restart,
            ..LayoutConfig::default()
        },
        ..EngineConfig::default()
    };
    Engine::with_layout_engine(config, RecordingLayout::default())
}

fn node_ids<E: LayoutEngine>(engine: &Engine<E>) -> Vec<String> {
    engine.graph().nodes().map(|n| n.id.clone()).collect()
}

fn row_keys<E: LayoutEngine>(engine: &Engine<E>, category: SnapshotCategory) -> Vec<String> {
    engine.table(category).keys().map(str::to_owned).collect()
}

fn two_routers() -> String {
    json!([
        { "Types": "node", "Id": "R1", "Peer": [{ "PeerId": "R2" }] },
        { "Types": "node", "Id": "R2", "Peer": [] },
    ])
    .to_string()
}

// ── Topology ────────────────────────────────────────────────────────

#[test]
fn test_resolved_peer_produces_one_link() {
    let mut engine = meshview_core::init(EngineConfig::default());
    let outcome = engine.handle_message(&two_routers());

    assert!(outcome.is_applied());
    assert_eq!(node_ids(&engine), vec!["R1", "R2"]);
    assert_eq!(engine.graph().links(), &[Link::new("R1", "R2")]);
    assert!(engine.diagnostics().is_empty());
    assert_eq!(row_keys(&engine, SnapshotCategory::Node), vec!["R1", "R2"]);
}

#[test]
fn test_unknown_peer_is_dropped_with_diagnostic() {
    let mut engine = meshview_core::init(EngineConfig::default());
    engine.handle_message(
        &json!([{ "Types": "node", "Id": "R1", "Peer": [{ "PeerId": "R9" }] }]).to_string(),
    );

    assert_eq!(node_ids(&engine), vec!["R1"]);
    assert!(engine.graph().links().is_empty());
    assert_eq!(
        engine.diagnostics(),
        &[Diagnostic::UnknownPeer {
            node: "R1".into(),
            peer_id: "R9".into()
        }]
    );
    assert_eq!(engine.stats().unknown_peers, 1);
}

#[test]
fn test_reapplying_snapshot_is_idempotent() {
    let mut engine = meshview_core::init(EngineConfig::default());
    engine.handle_message(&two_routers());
    let Outcome::Applied(summary) = engine.handle_message(&two_routers()) else {
        panic!("expected an applied snapshot");
    };

    assert!(summary.table.is_noop());
    assert_eq!(summary.table.unchanged, 2);
    assert!(!summary.topology.unwrap().structure_changed());
    assert_eq!(engine.graph().node_count(), 2);
    assert_eq!(engine.graph().links().len(), 1);
    assert_eq!(engine.table(SnapshotCategory::Node).len(), 2);
}

#[test]
fn test_rows_follow_snapshot_keys() {
    let mut engine = meshview_core::init(EngineConfig::default());
    let snapshot = |ids: &[&str]| {
        let items: Vec<_> = ids.iter().map(|id| json!({ "Types": "node", "Id": id })).collect();
        json!(items).to_string()
    };

    engine.handle_message(&snapshot(&["a", "b", "c"]));
    let Outcome::Applied(summary) = engine.handle_message(&snapshot(&["b", "c", "d"])) else {
        panic!("expected an applied snapshot");
    };

    assert_eq!(summary.table.added, 1);
    assert_eq!(summary.table.removed, 1);
    assert_eq!(row_keys(&engine, SnapshotCategory::Node), vec!["b", "c", "d"]);
    assert_eq!(node_ids(&engine), vec!["b", "c", "d"]);
}

#[test]
fn test_node_rows_render_peer_sub_tables() {
    let mut engine = meshview_core::init(EngineConfig::default());
    engine.handle_message(
        &json!([
            { "Types": "node", "Id": 10, "Hash": 99, "Peer": [{ "PeerId": 11, "Peid": 1, "Leid": 2 }] },
            { "Types": "node", "Id": 11, "Hash": 98, "Peer": null },
        ])
        .to_string(),
    );

    let table = engine.table(SnapshotCategory::Node);
    let row = table.row("10").unwrap();
    assert_eq!(row[0], Cell::Text("node".into()));
    assert_eq!(row[1], Cell::Text("10".into()));
    assert_eq!(row[2], Cell::Text("99".into()));
    let Cell::SubTable(peers) = &row[3] else {
        panic!("expected a peer sub-table");
    };
    assert_eq!(peers.rows, vec![vec!["11".to_owned(), "1".into(), "2".into()]]);

    // A null peer list renders as an empty cell.
    assert_eq!(table.row("11").unwrap()[3], Cell::Text(String::new()));
}

// ── Neighbours ──────────────────────────────────────────────────────

#[test]
fn test_neighbour_snapshots_only_touch_their_table() {
    let mut engine = meshview_core::init(EngineConfig::default());
    engine.handle_message(&two_routers());
    let outcome = engine.handle_message(
        &json!([
            { "Types": "neighbour", "Ip": "fe80::1", "Zone": "eth0", "Id": 7, "Eid": 1 },
        ])
        .to_string(),
    );

    let Outcome::Applied(summary) = outcome else {
        panic!("expected an applied snapshot");
    };
    assert_eq!(summary.category, SnapshotCategory::Neighbour);
    assert!(summary.topology.is_none());
    assert_eq!(node_ids(&engine), vec!["R1", "R2"]);
    assert_eq!(
        row_keys(&engine, SnapshotCategory::Neighbour),
        vec!["fe80::1/eth0/7/1"]
    );
    assert_eq!(engine.table(SnapshotCategory::Node).len(), 2);
}

// ── Skipped input ───────────────────────────────────────────────────

#[test]
fn test_malformed_input_changes_nothing() {
    let mut engine = recording_engine(RestartPolicy::Always);
    engine.handle_message(&two_routers());
    engine.on_connect();
    let passes = engine.layout().engine().passes;

    let outcome = engine.handle_message("not-json");

    assert!(matches!(outcome, Outcome::Skipped(NoUpdate::Malformed(_))));
    assert_eq!(node_ids(&engine), vec!["R1", "R2"]);
    assert_eq!(engine.graph().links().len(), 1);
    assert_eq!(engine.table(SnapshotCategory::Node).len(), 2);
    assert_eq!(engine.status().state(), ConnectionState::Connected);
    assert_eq!(engine.layout().engine().passes, passes);
    assert_eq!(engine.stats().malformed, 1);
}

#[test]
fn test_skip_reasons_are_counted_separately() {
    let mut engine = meshview_core::init(EngineConfig::default());

    assert_eq!(engine.handle_message("null"), Outcome::Skipped(NoUpdate::Empty));
    assert_eq!(
        engine.handle_message(r#"[{"Types":"gateway"}]"#),
        Outcome::Skipped(NoUpdate::UnrecognizedSnapshotCategory("gateway".into()))
    );
    engine.handle_message("{");

    let stats = engine.stats();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.applied, 0);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.unrecognized, 1);
    assert_eq!(stats.malformed, 1);
    assert!(stats.last_applied.is_none());
}

// ── Layout ──────────────────────────────────────────────────────────

#[test]
fn test_always_policy_restarts_on_every_update() {
    let mut engine = recording_engine(RestartPolicy::Always);
    engine.handle_message(&two_routers());
    engine.handle_message(&two_routers());
    engine.handle_message(&json!([{ "Types": "neighbour", "Ip": "fe80::1" }]).to_string());

    let layout = engine.layout().engine();
    assert_eq!(layout.passes, 3);
    assert_eq!(layout.starts, 3);
    assert_eq!(layout.last_nodes, vec!["R1", "R2"]);
}

#[test]
fn test_on_change_policy_restarts_only_on_structure_change() {
    let mut engine = recording_engine(RestartPolicy::OnChange);
    engine.handle_message(&two_routers());
    engine.handle_message(&two_routers());
    engine.handle_message(&json!([{ "Types": "neighbour", "Ip": "fe80::1" }]).to_string());

    let layout = engine.layout().engine();
    assert_eq!(layout.passes, 3);
    assert_eq!(layout.starts, 1);
}

#[test]
fn test_force_layout_positions_every_node() {
    let mut engine = meshview_core::init(EngineConfig::default());
    engine.handle_message(&two_routers());

    let mut ticks = 0;
    while engine.tick() && ticks < 1000 {
        ticks += 1;
    }

    assert!(ticks > 0);
    assert!(engine.position("R1").is_some());
    assert!(engine.position("R2").is_some());
    assert!(engine.position("R9").is_none());
    assert_eq!(engine.graph().node_count(), 2);
}

// ── Status ──────────────────────────────────────────────────────────

#[test]
fn test_close_event_shows_disconnected_regardless_of_prior_state() {
    let mut engine = meshview_core::init(EngineConfig::default());

    for prior in [None, Some(FeedEvent::Connected)] {
        if let Some(event) = prior {
            assert!(engine.handle_feed_event(event).is_none());
        }
        engine.handle_feed_event(FeedEvent::Closed {
            reason: "connection closed (1006)".into(),
        });

        let status = engine.status().current();
        assert_eq!(status.text, "disconnected");
        assert_eq!(status.tone, StatusTone::Bad);
    }
}

#[test]
fn test_feed_messages_are_reconciled() {
    let mut engine = meshview_core::init(EngineConfig::default());
    engine.handle_feed_event(FeedEvent::Connected);
    let outcome = engine.handle_feed_event(FeedEvent::Message(two_routers()));

    assert!(outcome.unwrap().is_applied());
    assert_eq!(engine.status().current().text, "connected");
    assert_eq!(engine.status().current().tone, StatusTone::Good);
}

#[test]
fn test_connect_rejects_bad_addresses() {
    let cancel = tokio_util::sync::CancellationToken::new();
    let err = meshview_core::connect("not a url", meshview_core::ReconnectConfig::default(), cancel)
        .unwrap_err();
    assert!(matches!(err, meshview_core::CoreError::Config { .. }));

    let err = meshview_core::connect(
        "http://localhost:8000/websocket",
        meshview_core::ReconnectConfig::default(),
        tokio_util::sync::CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, meshview_core::CoreError::Feed(_)));
    assert!(err.to_string().contains("'http'"));
}

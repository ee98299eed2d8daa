// ── Topology graph ──
//
// Nodes are upserted by id so existing records (and the layout positions
// keyed by them) survive across snapshots. Links are rebuilt from scratch
// on every topology snapshot and only ever connect nodes of that snapshot.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::snapshot::{Entry, ID_FIELD, PEER_FIELD, PEER_ID_FIELD, Scalar};

/// Field carrying a node's content hash.
const HASH_FIELD: &str = "Hash";

/// One network element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub hash: Option<String>,
}

/// A wired adjacency discovered through a peer reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Something in a topology snapshot that could not be turned into graph state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A peer reference names a node absent from the snapshot.
    UnknownPeer { node: String, peer_id: String },
    /// A node entry carries no usable `Id`.
    MissingNodeId { key: String },
    /// A peer reference carries no usable `PeerId`.
    MalformedPeer { node: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPeer { node, peer_id } => {
                write!(f, "unknown peer {peer_id} referenced by node {node}")
            }
            Self::MissingNodeId { key } => write!(f, "node entry {key} has no {ID_FIELD}"),
            Self::MalformedPeer { node } => {
                write!(f, "node {node} has a peer without {PEER_ID_FIELD}")
            }
        }
    }
}

/// Outcome of reconciling one topology snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub links_changed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl TopologyReport {
    /// Whether the node or link sets differ from before.
    pub fn structure_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || self.links_changed
    }

    pub fn unknown_peers(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnknownPeer { .. }))
            .count()
    }
}

// ── GraphState ───────────────────────────────────────────────────────

/// Current node and link collections consumed by the layout.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    nodes: IndexMap<String, Node>,
    links: Vec<Link>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bring the graph in line with a topology snapshot.
    ///
    /// Peer references resolve only against the ids of this snapshot. An
    /// unresolved reference yields a diagnostic and no link; repeated
    /// references to the same target yield repeated links.
    pub fn reconcile(&mut self, entries: &[Entry]) -> TopologyReport {
        let mut report = TopologyReport::default();

        let mut present: IndexMap<String, Option<String>> = IndexMap::with_capacity(entries.len());
        for entry in entries {
            match entry.id() {
                Some(id) => {
                    present.insert(id, entry.scalar(HASH_FIELD).map(Scalar::to_string));
                }
                None => {
                    debug!(key = entry.key(), "node entry without id");
                    report.diagnostics.push(Diagnostic::MissingNodeId {
                        key: entry.key().to_owned(),
                    });
                }
            }
        }

        report.removed = self
            .nodes
            .keys()
            .filter(|id| !present.contains_key(*id))
            .cloned()
            .collect();
        self.nodes.retain(|id, _| present.contains_key(id));

        for (id, hash) in &present {
            match self.nodes.get_mut(id) {
                Some(node) => node.hash.clone_from(hash),
                None => {
                    self.nodes.insert(
                        id.clone(),
                        Node {
                            id: id.clone(),
                            hash: hash.clone(),
                        },
                    );
                    report.added.push(id.clone());
                }
            }
        }

        let links = Self::resolve_links(entries, &present, &mut report.diagnostics);
        report.links_changed = links != self.links;
        self.links = links;

        report
    }

    fn resolve_links(
        entries: &[Entry],
        present: &IndexMap<String, Option<String>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Link> {
        let mut links = Vec::new();
        for entry in entries {
            let Some(source) = entry.id() else {
                continue;
            };
            for peer in entry.sub_entries(PEER_FIELD) {
                let Some(target) = peer.get(PEER_ID_FIELD).and_then(Scalar::as_id) else {
                    diagnostics.push(Diagnostic::MalformedPeer {
                        node: source.clone(),
                    });
                    continue;
                };
                if present.contains_key(&target) {
                    links.push(Link::new(source.clone(), target));
                } else {
                    warn!(node = %source, peer_id = %target, "unknown peer");
                    diagnostics.push(Diagnostic::UnknownPeer {
                        node: source.clone(),
                        peer_id: target,
                    });
                }
            }
        }
        links
    }
}

// ── Tests ────────────────────────────────────────────────────────────

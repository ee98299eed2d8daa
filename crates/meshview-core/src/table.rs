// ── Keyed table reconciliation ──
//
// A pure row diff (`reconcile`) plus the persistent per-table row state it
// is applied to. Top-level rows keep their identity across snapshots;
// nested sub-tables are replaced wholesale by position.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::snapshot::{Entry, FieldValue, SubEntry};

/// Fixed column set of a nested peer sub-table.
pub const PEER_SUBHEADERS: [&str; 3] = ["PeerId", "Peid", "Leid"];

// ── Cells & rows ─────────────────────────────────────────────────────

/// A nested table rendered inside one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTable {
    pub headers: Vec<String>,
    /// One row per list element, in list order.
    pub rows: Vec<Vec<String>>,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Scalar text; absent fields render as an empty string.
    Text(String),
    SubTable(SubTable),
}

impl Cell {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Number of text lines needed to draw this cell (sub-table header included).
    pub fn height(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::SubTable(sub) => sub.rows.len() + 1,
        }
    }
}

/// A keyed row of rendered cells, one per declared header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    pub cells: Vec<Cell>,
}

/// Row changes needed to bring a table in line with a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDiff {
    pub added: Vec<Row>,
    pub updated: Vec<Row>,
    pub removed: Vec<String>,
}

// ── Reconciler ───────────────────────────────────────────────────────

/// Diff a snapshot against the keys currently rendered.
///
/// Keys missing from the snapshot are removed, keys present are upserted
/// with one cell per header. When a key repeats inside the snapshot the last
/// entry wins and the first position is kept. With no headers declared,
/// rows carry no cells.
pub fn reconcile<K: AsRef<str>>(
    prior_keys: impl IntoIterator<Item = K>,
    entries: &[Entry],
    headers: &[String],
) -> TableDiff {
    let prior: Vec<K> = prior_keys.into_iter().collect();
    let prior_set: HashSet<&str> = prior.iter().map(|k| k.as_ref()).collect();

    let mut incoming: IndexMap<&str, &Entry> = IndexMap::with_capacity(entries.len());
    for entry in entries {
        incoming.insert(entry.key(), entry);
    }

    let mut diff = TableDiff::default();
    for (key, entry) in &incoming {
        let row = Row {
            key: (*key).to_owned(),
            cells: render_cells(entry, headers),
        };
        if prior_set.contains(key) {
            diff.updated.push(row);
        } else {
            diff.added.push(row);
        }
    }

    diff.removed = prior
        .iter()
        .map(|k| k.as_ref())
        .filter(|key| !incoming.contains_key(key))
        .map(str::to_owned)
        .collect();

    diff
}

fn render_cells(entry: &Entry, headers: &[String]) -> Vec<Cell> {
    headers
        .iter()
        .map(|header| match entry.field(header) {
            None => Cell::empty(),
            Some(FieldValue::Scalar(value)) => Cell::Text(value.to_string()),
            Some(FieldValue::List(items)) => Cell::SubTable(render_sub_table(items)),
        })
        .collect()
}

fn render_sub_table(items: &[SubEntry]) -> SubTable {
    SubTable {
        headers: PEER_SUBHEADERS.iter().map(|h| (*h).to_owned()).collect(),
        rows: items
            .iter()
            .map(|item| {
                PEER_SUBHEADERS
                    .iter()
                    .map(|h| item.get(*h).map(ToString::to_string).unwrap_or_default())
                    .collect()
            })
            .collect(),
    }
}

// ── Persistent row state ─────────────────────────────────────────────

/// Counts from applying a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub added: usize,
    /// Upserted rows whose cells differ from what was rendered before.
    pub changed: usize,
    /// Upserted rows whose cells were already identical.
    pub unchanged: usize,
    pub removed: usize,
}

impl ApplyReport {
    /// `true` when applying the diff altered nothing.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.changed == 0 && self.removed == 0
    }
}

/// Rendered rows of one table, keyed by entry key.
///
/// Created once and mutated in place. Rows keep the order in which their
/// keys were first seen; new rows are appended.
#[derive(Debug, Clone, Default)]
pub struct TableRowState {
    headers: Vec<String>,
    rows: IndexMap<String, Vec<Cell>>,
    version: u64,
}

impl TableRowState {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: IndexMap::new(),
            version: 0,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn row(&self, key: &str) -> Option<&[Cell]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bumped whenever applying a diff changes anything.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a diff produced by [`reconcile`].
    pub fn apply(&mut self, diff: TableDiff) -> ApplyReport {
        let mut report = ApplyReport::default();

        for key in &diff.removed {
            if self.rows.shift_remove(key).is_some() {
                report.removed += 1;
            }
        }

        for row in diff.added.into_iter().chain(diff.updated) {
            match self.rows.get_mut(&row.key) {
                Some(cells) if *cells == row.cells => report.unchanged += 1,
                Some(cells) => {
                    *cells = row.cells;
                    report.changed += 1;
                }
                None => {
                    self.rows.insert(row.key, row.cells);
                    report.added += 1;
                }
            }
        }

        if !report.is_noop() {
            self.version += 1;
        }
        report
    }

    /// Diff `entries` against the current rows and apply the result.
    pub fn reconcile(&mut self, entries: &[Entry]) -> ApplyReport {
        let diff = reconcile(self.keys(), entries, &self.headers);
        self.apply(diff)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

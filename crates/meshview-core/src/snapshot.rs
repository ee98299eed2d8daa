// ── Snapshot decoding ──
//
// A snapshot is one feed message describing the complete current state of
// one entity category. Decoding yields either a typed `Snapshot` or a
// `NoUpdate` reason; it never touches engine state.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use thiserror::Error;

/// Field carrying the category discriminant.
pub const CATEGORY_FIELD: &str = "Types";
/// Optional explicit row identity.
pub const KEY_FIELD: &str = "Key";
/// Node identifier.
pub const ID_FIELD: &str = "Id";
/// List of peer references on a node entry.
pub const PEER_FIELD: &str = "Peer";
/// Peer reference target inside a `Peer` sub-entry.
pub const PEER_ID_FIELD: &str = "PeerId";

// ── Category ─────────────────────────────────────────────────────────

/// The two snapshot categories the feed produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SnapshotCategory {
    /// Mesh nodes with their peer adjacencies. Drives the graph and a table.
    Node,
    /// Directly attached neighbours. Table only.
    Neighbour,
}

impl SnapshotCategory {
    /// Fields that together identify one entry of this category.
    fn identity_fields(self) -> &'static [&'static str] {
        match self {
            Self::Node => &[ID_FIELD],
            Self::Neighbour => &["Ip", "Zone", ID_FIELD, "Eid"],
        }
    }
}

// ── Values ───────────────────────────────────────────────────────────

/// A scalar field value, kept close to its JSON form.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Any nested structure that is not a list of sub-entries, as compact JSON.
    Json(String),
}

impl Scalar {
    /// Interpret the value as an identifier.
    ///
    /// The producer sends 32-bit node ids as JSON numbers; both numbers and
    /// non-empty strings normalize to their decimal/textual form.
    pub fn as_id(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            other => Self::Json(other.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) | Self::Json(s) => f.write_str(s),
        }
    }
}

/// One row of a nested list field (a peer reference, in practice).
pub type SubEntry = IndexMap<String, Scalar>;

/// The value of one entry field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    /// A list whose elements are all objects.
    List(Vec<SubEntry>),
}

impl FieldValue {
    fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => Self::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(sub_entry(map)),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Scalar(Scalar::from_json(other)),
        }
    }
}

fn sub_entry(map: Map<String, Value>) -> SubEntry {
    map.into_iter()
        .map(|(name, value)| (name, Scalar::from_json(value)))
        .collect()
}

// ── Entry ────────────────────────────────────────────────────────────

/// One element of a snapshot: a keyed mapping of field name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    key: String,
    fields: IndexMap<String, FieldValue>,
}

impl Entry {
    fn from_object(category: SnapshotCategory, index: usize, map: Map<String, Value>) -> Self {
        let fields: IndexMap<String, FieldValue> = map
            .into_iter()
            .map(|(name, value)| (name, FieldValue::from_json(value)))
            .collect();
        let key = derive_key(category, index, &fields);
        Self { key, fields }
    }

    /// Row identity used by the table reconciler.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        match self.fields.get(name) {
            Some(FieldValue::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    /// The node identifier, normalized to a string.
    pub fn id(&self) -> Option<String> {
        self.scalar(ID_FIELD).and_then(Scalar::as_id)
    }

    /// Sub-entries of a list field. Missing, `null`, or scalar fields yield
    /// an empty slice.
    pub fn sub_entries(&self, name: &str) -> &[SubEntry] {
        match self.fields.get(name) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }
}

/// Explicit `Key` wins, then the category's identity fields joined with
/// `/`, then the entry's position in the snapshot.
fn derive_key(
    category: SnapshotCategory,
    index: usize,
    fields: &IndexMap<String, FieldValue>,
) -> String {
    let text = |name: &str| match fields.get(name) {
        Some(FieldValue::Scalar(s)) => s.as_id(),
        _ => None,
    };

    if let Some(key) = text(KEY_FIELD) {
        return key;
    }

    let parts: Vec<Option<String>> = category
        .identity_fields()
        .iter()
        .map(|name| text(name))
        .collect();
    if parts.iter().all(Option::is_none) {
        return index.to_string();
    }

    parts
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("/")
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// A decoded snapshot, tagged by category at the parse boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Topology(Vec<Entry>),
    Neighbours(Vec<Entry>),
}

impl Snapshot {
    pub fn category(&self) -> SnapshotCategory {
        match self {
            Self::Topology(_) => SnapshotCategory::Node,
            Self::Neighbours(_) => SnapshotCategory::Neighbour,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        match self {
            Self::Topology(entries) | Self::Neighbours(entries) => entries,
        }
    }
}

/// Why a message produced no update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoUpdate {
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    #[error("snapshot carries no entries")]
    Empty,

    #[error("first entry has no `Types` discriminant")]
    MissingCategory,

    #[error("unrecognized snapshot category '{0}'")]
    UnrecognizedSnapshotCategory(String),
}

// ── Parser ───────────────────────────────────────────────────────────

/// Decode one raw feed message.
///
/// The category is read from the first entry; entries are assumed to be
/// homogeneous within one snapshot.
pub fn parse(raw: &str) -> Result<Snapshot, NoUpdate> {
    if raw.trim().is_empty() {
        return Err(NoUpdate::Empty);
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| NoUpdate::Malformed(e.to_string()))?;

    let items = match value {
        Value::Null => return Err(NoUpdate::Empty),
        Value::Array(items) => items,
        other => {
            return Err(NoUpdate::Malformed(format!(
                "expected a sequence of entries, got {}",
                json_kind(&other)
            )));
        }
    };

    let mut objects = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => objects.push(map),
            other => {
                return Err(NoUpdate::Malformed(format!(
                    "entry {index} is {}, not an object",
                    json_kind(&other)
                )));
            }
        }
    }

    let Some(first) = objects.first() else {
        return Err(NoUpdate::Empty);
    };
    let Some(Value::String(tag)) = first.get(CATEGORY_FIELD) else {
        return Err(NoUpdate::MissingCategory);
    };
    let category = SnapshotCategory::from_str(tag)
        .map_err(|_| NoUpdate::UnrecognizedSnapshotCategory(tag.clone()))?;

    let entries = objects
        .into_iter()
        .enumerate()
        .map(|(index, map)| Entry::from_object(category, index, map))
        .collect();

    Ok(match category {
        SnapshotCategory::Node => Snapshot::Topology(entries),
        SnapshotCategory::Neighbour => Snapshot::Neighbours(entries),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn null_and_blank_messages_are_empty() {
        assert_eq!(parse("null"), Err(NoUpdate::Empty));
        assert_eq!(parse(""), Err(NoUpdate::Empty));
        assert_eq!(parse("  \n"), Err(NoUpdate::Empty));
        assert_eq!(parse("[]"), Err(NoUpdate::Empty));
    }

    #[test]
    fn undecodable_text_is_malformed() {
        assert!(matches!(parse("not-json"), Err(NoUpdate::Malformed(_))));
        assert!(matches!(parse(r#"{"Types":"node"}"#), Err(NoUpdate::Malformed(_))));
        assert!(matches!(parse(r#"[{"Types":"node"}, 3]"#), Err(NoUpdate::Malformed(_))));
    }

    #[test]
    fn category_comes_from_first_entry() {
        assert_eq!(parse(r#"[{"Id":1}]"#), Err(NoUpdate::MissingCategory));
        assert_eq!(parse(r#"[{"Types":7}]"#), Err(NoUpdate::MissingCategory));
        assert_eq!(
            parse(r#"[{"Types":"router","Id":1}]"#),
            Err(NoUpdate::UnrecognizedSnapshotCategory("router".into()))
        );
        assert_eq!(
            parse(r#"[{"Types":"neighbour","Ip":"fe80::1"}]"#).unwrap().category(),
            SnapshotCategory::Neighbour
        );
    }

    #[test]
    fn numeric_node_ids_normalize_to_strings() {
        let raw = json!([
            { "Types": "node", "Id": 3_735_928_559_u32, "Hash": 42,
              "Peer": [{ "PeerId": 17, "Peid": 1, "Leid": 2 }] },
        ])
        .to_string();

        let snapshot = parse(&raw).unwrap();
        let entry = &snapshot.entries()[0];
        assert_eq!(entry.id().as_deref(), Some("3735928559"));
        assert_eq!(entry.key(), "3735928559");

        let peers = entry.sub_entries(PEER_FIELD);
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0][PEER_ID_FIELD].as_id().as_deref(), Some("17"));
    }

    #[test]
    fn null_peer_list_has_no_sub_entries() {
        let snapshot = parse(r#"[{"Types":"node","Id":"R1","Peer":null}]"#).unwrap();
        assert!(snapshot.entries()[0].sub_entries(PEER_FIELD).is_empty());
        assert_eq!(
            snapshot.entries()[0].field(PEER_FIELD),
            Some(&FieldValue::Scalar(Scalar::Null))
        );
    }

    #[test]
    fn neighbour_key_joins_identity_fields() {
        let raw = json!([
            { "Types": "neighbour", "Ip": "fe80::1", "Zone": "eth0", "Id": 5, "Eid": 2 },
            { "Types": "neighbour", "Ip": "fe80::2", "Zone": "", "Id": 6, "Eid": 1 },
            { "Types": "neighbour", "Other": true },
        ])
        .to_string();

        let snapshot = parse(&raw).unwrap();
        let keys: Vec<&str> = snapshot.entries().iter().map(Entry::key).collect();
        assert_eq!(keys, vec!["fe80::1/eth0/5/2", "fe80::2//6/1", "2"]);
    }

    #[test]
    fn explicit_key_wins() {
        let snapshot = parse(r#"[{"Types":"node","Key":"row-a","Id":"R1"}]"#).unwrap();
        assert_eq!(snapshot.entries()[0].key(), "row-a");
        assert_eq!(snapshot.entries()[0].id().as_deref(), Some("R1"));
    }

    #[test]
    fn non_object_lists_stay_scalar() {
        let snapshot = parse(r#"[{"Types":"node","Id":"R1","Tags":["a","b"]}]"#).unwrap();
        assert_eq!(
            snapshot.entries()[0].scalar("Tags"),
            Some(&Scalar::Json(r#"["a","b"]"#.into()))
        );
    }

    #[test]
    fn scalar_display_matches_cell_text() {
        assert_eq!(Scalar::Null.to_string(), "");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::Number(12.into()).to_string(), "12");
        assert_eq!(Scalar::Text("x".into()).to_string(), "x");
    }
}

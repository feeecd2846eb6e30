//! The canonical record: the single validated shape that every imported card
//! takes, no matter which source format produced it. Importers construct
//! records, the coordinator validates them once, and the relational writer
//! maps them onto storage rows. After that point only storage rows exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Error raised when a record fails schema validation. Each variant names the
/// first violated field and its path within the record.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("createdAt {created} is later than modifiedAt {modified}")]
    TimestampOrder {
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    },

    #[error("tags[{0}] is an empty string")]
    EmptyTag(usize),

    #[error("properties contains an empty key")]
    EmptyPropertyKey,

    #[error("sourceId is set without a source")]
    OrphanSourceId,
}

/// The full set of node types a record may carry. Stored rows use the reduced
/// [`CardType`] set; the mapping happens at write time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeType {
    Note,
    Task,
    Document,
    Person,
    Contact,
    Event,
    Meeting,
    Resource,
    Link,
    File,
}

impl NodeType {
    /// Reduces the ten ingest-facing node types to the four stored card types.
    pub fn card_type(&self) -> CardType {
        match self {
            NodeType::Note | NodeType::Task | NodeType::Document => CardType::Note,
            NodeType::Person | NodeType::Contact => CardType::Person,
            NodeType::Event | NodeType::Meeting => CardType::Event,
            NodeType::Resource | NodeType::Link | NodeType::File => CardType::Resource,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Note => "note",
            NodeType::Task => "task",
            NodeType::Document => "document",
            NodeType::Person => "person",
            NodeType::Contact => "contact",
            NodeType::Event => "event",
            NodeType::Meeting => "meeting",
            NodeType::Resource => "resource",
            NodeType::Link => "link",
            NodeType::File => "file",
        }
    }
}

impl Default for NodeType {
    fn default() -> NodeType {
        NodeType::Note
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reduced node-type set actually persisted in the `card_type` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardType {
    Note,
    Person,
    Event,
    Resource,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Note => "note",
            CardType::Person => "person",
            CardType::Event => "event",
            CardType::Resource => "resource",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_version() -> i64 {
    1
}

/// A single card, in its canonical in-memory form. Optional fields are
/// grouped by their LATCH axis: Location, Alphabet, Time, Category, and
/// Hierarchy. Anything a source carries that the column set does not name
/// belongs in `properties`, keyed by the source's own field name.
///
/// Unknown top-level fields are rejected at deserialization time
/// (`deny_unknown_fields`); importers must route extras into `properties`
/// before constructing the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CanonicalRecord {
    pub id: String,
    #[serde(default)]
    pub node_type: NodeType,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,

    // Alphabet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    // Location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_address: Option<String>,

    // Time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_end: Option<DateTime<Utc>>,

    // Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    // Hierarchy
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub importance: i64,
    #[serde(default)]
    pub sort_order: i64,

    // Grid placement, carried through for the storage contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_y: Option<i64>,

    // Provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl CanonicalRecord {
    /// A record with the required fields set and every optional field at its
    /// schema default. Importers start here and fill in what their source
    /// provides.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> CanonicalRecord {
        CanonicalRecord {
            id: id.into(),
            node_type: NodeType::default(),
            name: name.into(),
            created_at,
            modified_at,
            summary: None,
            content: None,
            latitude: None,
            longitude: None,
            location_name: None,
            location_address: None,
            due_at: None,
            completed_at: None,
            event_start: None,
            event_end: None,
            folder: None,
            tags: Vec::new(),
            status: None,
            priority: 0,
            importance: 0,
            sort_order: 0,
            grid_x: None,
            grid_y: None,
            source: None,
            source_id: None,
            source_url: None,
            version: default_version(),
            deleted_at: None,
            properties: BTreeMap::new(),
        }
    }

    /// Enforces every schema invariant, reporting the first violated field.
    /// Validation is idempotent: a record that validates once validates
    /// unchanged thereafter.
    pub fn validate(self) -> Result<CanonicalRecord, SchemaError> {
        if self.id.trim().is_empty() {
            return Err(SchemaError::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(SchemaError::MissingField("name"));
        }
        if self.created_at > self.modified_at {
            return Err(SchemaError::TimestampOrder {
                created: self.created_at,
                modified: self.modified_at,
            });
        }
        if let Some(index) = self.tags.iter().position(|t| t.is_empty()) {
            return Err(SchemaError::EmptyTag(index));
        }
        if self.properties.keys().any(|k| k.is_empty()) {
            return Err(SchemaError::EmptyPropertyKey);
        }
        if self.source_id.is_some() && self.source.is_none() {
            return Err(SchemaError::OrphanSourceId);
        }
        Ok(self)
    }
}

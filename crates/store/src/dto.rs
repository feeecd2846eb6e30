//! Diagnostic projection of a stored card to a wire DTO: the canonical
//! columns with the tags array decoded and lifecycle timestamps as ISO-8601
//! UTC. Consumed by API collaborators; the core only defines the shape.

use crate::{Result, DB};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub id: String,
    pub card_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub priority: i64,
    pub importance: i64,
    pub sort_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: i64,
}

const LOAD_CARD_SQL: &str = "SELECT id, card_type, name, content, summary, latitude, longitude, \
     location_name, location_address, created_at, modified_at, due_at, completed_at, \
     event_start, event_end, folder, tags, status, priority, importance, sort_order, \
     source, source_id, source_url, deleted_at, version \
     FROM cards WHERE id = ?";

pub fn load_card(db: &DB, id: &str) -> Result<Option<CardDto>> {
    let raw = db
        .query_row(LOAD_CARD_SQL, [id], |row| {
            Ok(RawCard {
                id: row.get(0)?,
                card_type: row.get(1)?,
                name: row.get(2)?,
                content: row.get(3)?,
                summary: row.get(4)?,
                latitude: row.get(5)?,
                longitude: row.get(6)?,
                location_name: row.get(7)?,
                location_address: row.get(8)?,
                created_at: row.get(9)?,
                modified_at: row.get(10)?,
                due_at: row.get(11)?,
                completed_at: row.get(12)?,
                event_start: row.get(13)?,
                event_end: row.get(14)?,
                folder: row.get(15)?,
                tags: row.get(16)?,
                status: row.get(17)?,
                priority: row.get(18)?,
                importance: row.get(19)?,
                sort_order: row.get(20)?,
                source: row.get(21)?,
                source_id: row.get(22)?,
                source_url: row.get(23)?,
                deleted_at: row.get(24)?,
                version: row.get(25)?,
            })
        })
        .optional()?;

    raw.map(RawCard::into_dto).transpose()
}

struct RawCard {
    id: String,
    card_type: String,
    name: String,
    content: Option<String>,
    summary: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_name: Option<String>,
    location_address: Option<String>,
    created_at: String,
    modified_at: String,
    due_at: Option<String>,
    completed_at: Option<String>,
    event_start: Option<String>,
    event_end: Option<String>,
    folder: Option<String>,
    tags: Option<String>,
    status: Option<String>,
    priority: i64,
    importance: i64,
    sort_order: i64,
    source: Option<String>,
    source_id: Option<String>,
    source_url: Option<String>,
    deleted_at: Option<String>,
    version: i64,
}

impl RawCard {
    fn into_dto(self) -> Result<CardDto> {
        Ok(CardDto {
            id: self.id,
            card_type: self.card_type,
            name: self.name,
            content: self.content,
            summary: self.summary,
            latitude: self.latitude,
            longitude: self.longitude,
            location_name: self.location_name,
            location_address: self.location_address,
            created_at: parse_timestamp(&self.created_at)?,
            modified_at: parse_timestamp(&self.modified_at)?,
            due_at: parse_optional(self.due_at.as_deref())?,
            completed_at: parse_optional(self.completed_at.as_deref())?,
            event_start: parse_optional(self.event_start.as_deref())?,
            event_end: parse_optional(self.event_end.as_deref())?,
            folder: self.folder,
            tags: match self.tags.as_deref() {
                Some(json) => serde_json::from_str(json)?,
                None => Vec::new(),
            },
            status: self.status,
            priority: self.priority,
            importance: self.importance,
            sort_order: self.sort_order,
            source: self.source,
            source_id: self.source_id,
            source_url: self.source_url,
            deleted_at: parse_optional(self.deleted_at.as_deref())?,
            version: self.version,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

fn parse_optional(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}

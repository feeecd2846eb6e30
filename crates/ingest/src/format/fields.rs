//! Shared mapping from loosely named source fields onto canonical columns.
//! Importers that read tabular or key/value shaped sources (JSON, CSV,
//! spreadsheets, front matter) all funnel their fields through here so the
//! same source key lands in the same canonical column regardless of format.

use crate::format::FileSource;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use model::{CanonicalRecord, NodeType, Value};
use serde_json::Map;
use std::str::FromStr;

/// Builds a record from a key/value field map: canonical columns are filled
/// from recognized keys, everything else is routed into `properties` under
/// its original key. Timestamps fall back to the file's mtime, then to the
/// Unix epoch, so identical input always produces an identical record.
pub(crate) fn build_record(
    file: &FileSource,
    fields: Map<String, Value>,
    id: String,
    source_name: &'static str,
) -> CanonicalRecord {
    let fallback = file.modified.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let mut record = CanonicalRecord::new(id.clone(), file.stem(), fallback, fallback);
    record.source = Some(source_name.to_string());
    record.source_id = Some(id);

    for (key, value) in fields {
        apply_field(&mut record, &key, value);
    }
    finalize_timestamps(&mut record);
    record
}

/// Applies one source field to the record. Recognized keys that fail to
/// parse (a non-date in `created`, say) are preserved as properties rather
/// than dropped.
pub(crate) fn apply_field(record: &mut CanonicalRecord, key: &str, value: Value) {
    let stash = |record: &mut CanonicalRecord, value: Value| {
        record.properties.insert(key.to_string(), value);
    };

    match normalize_key(key).as_str() {
        // Identity keys feed the id generator through the header, not the
        // record itself.
        "id" | "sourceid" => {}
        "name" | "title" => match string_value(&value) {
            Some(s) if !s.is_empty() => record.name = s,
            _ => stash(record, value),
        },
        "type" | "nodetype" => match value.as_str().and_then(|s| NodeType::from_str(s).ok()) {
            Some(node_type) => record.node_type = node_type,
            None => stash(record, value),
        },
        "summary" | "description" => record.summary = string_value(&value),
        "content" | "body" | "text" => record.content = string_value(&value),
        "folder" | "category" | "project" => record.folder = string_value(&value),
        "status" | "state" => record.status = string_value(&value),
        "tags" | "keywords" | "labels" => match tags_value(&value) {
            Some(tags) => record.tags = tags,
            None => stash(record, value),
        },
        "priority" => match int_value(&value) {
            Some(n) => record.priority = n,
            None => stash(record, value),
        },
        "importance" => match int_value(&value) {
            Some(n) => record.importance = n,
            None => stash(record, value),
        },
        "sortorder" => match int_value(&value) {
            Some(n) => record.sort_order = n,
            None => stash(record, value),
        },
        "created" | "createdat" | "date" => match timestamp_value(&value) {
            Some(ts) => record.created_at = ts,
            None => stash(record, value),
        },
        "modified" | "modifiedat" | "updated" | "updatedat" => match timestamp_value(&value) {
            Some(ts) => record.modified_at = ts,
            None => stash(record, value),
        },
        "due" | "dueat" | "duedate" => match timestamp_value(&value) {
            Some(ts) => record.due_at = Some(ts),
            None => stash(record, value),
        },
        "completed" | "completedat" => match timestamp_value(&value) {
            Some(ts) => record.completed_at = Some(ts),
            None => stash(record, value),
        },
        "eventstart" | "start" | "startdate" => match timestamp_value(&value) {
            Some(ts) => record.event_start = Some(ts),
            None => stash(record, value),
        },
        "eventend" | "end" | "enddate" => match timestamp_value(&value) {
            Some(ts) => record.event_end = Some(ts),
            None => stash(record, value),
        },
        "latitude" | "lat" => match float_value(&value) {
            Some(f) => record.latitude = Some(f),
            None => stash(record, value),
        },
        "longitude" | "lng" | "lon" => match float_value(&value) {
            Some(f) => record.longitude = Some(f),
            None => stash(record, value),
        },
        "location" | "locationname" => record.location_name = string_value(&value),
        "address" | "locationaddress" => record.location_address = string_value(&value),
        "url" | "link" | "sourceurl" => record.source_url = string_value(&value),
        "version" => match int_value(&value) {
            Some(n) if n >= 1 => record.version = n,
            _ => stash(record, value),
        },
        _ => stash(record, value),
    }
}

/// Guards the `created_at <= modified_at` invariant against sources whose
/// header dates and filesystem mtime disagree.
pub(crate) fn finalize_timestamps(record: &mut CanonicalRecord) {
    if record.modified_at < record.created_at {
        record.modified_at = record.created_at;
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect()
}

fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Tags arrive either as a list or as a comma-separated string. Order is
/// preserved; empty entries are dropped so the schema invariant holds.
fn tags_value(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(string_value)
                .collect(),
        ),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, and bare `YYYY-MM-DD`.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

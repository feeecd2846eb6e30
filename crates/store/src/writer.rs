//! The relational writer: maps canonical records onto the two-table storage
//! model. Each record becomes one `cards` row plus one `card_properties` row
//! per dynamic property, written under a single transaction scope so a card
//! is never persisted without its properties or vice versa.

use crate::error::Error;
use crate::{Result, DB};
use chrono::{DateTime, SecondsFormat, Utc};
use model::{CanonicalRecord, Value};
use rusqlite::types::Value as SqlValue;

/// The fixed, ordered column list of the `cards` table. Drives INSERT
/// construction and is the authority for which columns a facet may name.
pub const CARD_COLUMNS: [&str; 28] = [
    "id",
    "card_type",
    "name",
    "content",
    "summary",
    "latitude",
    "longitude",
    "location_name",
    "location_address",
    "created_at",
    "modified_at",
    "due_at",
    "completed_at",
    "event_start",
    "event_end",
    "folder",
    "tags",
    "status",
    "priority",
    "importance",
    "sort_order",
    "grid_x",
    "grid_y",
    "source",
    "source_id",
    "source_url",
    "deleted_at",
    "version",
];

lazy_static::lazy_static! {
    static ref INSERT_CARD_SQL: String = {
        let placeholders = vec!["?"; CARD_COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO cards ({}) VALUES ({})",
            CARD_COLUMNS.join(", "),
            placeholders
        )
    };
}

const INSERT_PROPERTY_SQL: &str = "INSERT OR REPLACE INTO card_properties \
    (id, card_id, key, value, value_type, value_string, value_number, value_boolean, value_json) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

#[derive(Debug, Clone)]
pub struct InsertOptions {
    /// When true (the default), the whole batch commits or rolls back as one
    /// unit. When false, each record is written independently and failures
    /// accumulate without stopping the loop.
    pub transaction: bool,
}

impl Default for InsertOptions {
    fn default() -> InsertOptions {
        InsertOptions { transaction: true }
    }
}

#[derive(Debug, Default)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub failed: usize,
    pub errors: Vec<Error>,
}

pub fn insert_canonical(
    db: &DB,
    records: &[CanonicalRecord],
    options: &InsertOptions,
) -> Result<InsertOutcome> {
    let outcome = if options.transaction {
        insert_transactional(db, records)?
    } else {
        insert_independent(db, records)?
    };
    tracing::debug!(
        inserted = outcome.inserted,
        failed = outcome.failed,
        transaction = options.transaction,
        "finished canonical insert"
    );
    Ok(outcome)
}

fn insert_transactional(db: &DB, records: &[CanonicalRecord]) -> Result<InsertOutcome> {
    db.execute_batch("BEGIN;")?;
    for record in records {
        if let Err(err) = insert_one(db, record) {
            db.execute_batch("ROLLBACK;")?;
            tracing::warn!(card_id = %record.id, error = %err, "batch rolled back");
            return Ok(InsertOutcome {
                inserted: 0,
                failed: records.len(),
                errors: vec![err],
            });
        }
    }
    db.execute_batch("COMMIT;")?;
    Ok(InsertOutcome {
        inserted: records.len(),
        failed: 0,
        errors: Vec::new(),
    })
}

fn insert_independent(db: &DB, records: &[CanonicalRecord]) -> Result<InsertOutcome> {
    let mut outcome = InsertOutcome::default();
    for record in records {
        db.execute_batch("BEGIN;")?;
        match insert_one(db, record) {
            Ok(()) => {
                db.execute_batch("COMMIT;")?;
                outcome.inserted += 1;
            }
            Err(err) => {
                db.execute_batch("ROLLBACK;")?;
                tracing::warn!(card_id = %record.id, error = %err, "record skipped");
                outcome.failed += 1;
                outcome.errors.push(err);
            }
        }
    }
    Ok(outcome)
}

fn insert_one(db: &DB, record: &CanonicalRecord) -> std::result::Result<(), Error> {
    let tags_json = if record.tags.is_empty() {
        SqlValue::Null
    } else {
        SqlValue::Text(serde_json::to_string(&record.tags)?)
    };

    let params: Vec<SqlValue> = vec![
        text(&record.id),
        text(record.node_type.card_type().as_str()),
        text(&record.name),
        opt_text(record.content.as_deref()),
        opt_text(record.summary.as_deref()),
        record.latitude.map(SqlValue::Real).unwrap_or(SqlValue::Null),
        record.longitude.map(SqlValue::Real).unwrap_or(SqlValue::Null),
        opt_text(record.location_name.as_deref()),
        opt_text(record.location_address.as_deref()),
        timestamp(&record.created_at),
        timestamp(&record.modified_at),
        opt_timestamp(record.due_at.as_ref()),
        opt_timestamp(record.completed_at.as_ref()),
        opt_timestamp(record.event_start.as_ref()),
        opt_timestamp(record.event_end.as_ref()),
        opt_text(record.folder.as_deref()),
        tags_json,
        opt_text(record.status.as_deref()),
        SqlValue::Integer(record.priority),
        SqlValue::Integer(record.importance),
        SqlValue::Integer(record.sort_order),
        record.grid_x.map(SqlValue::Integer).unwrap_or(SqlValue::Null),
        record.grid_y.map(SqlValue::Integer).unwrap_or(SqlValue::Null),
        opt_text(record.source.as_deref()),
        opt_text(record.source_id.as_deref()),
        opt_text(record.source_url.as_deref()),
        opt_timestamp(record.deleted_at.as_ref()),
        SqlValue::Integer(record.version),
    ];

    let mut card_stmt = db.prepare_cached(&INSERT_CARD_SQL)?;
    card_stmt
        .execute(rusqlite::params_from_iter(params))
        .map_err(|e| classify(&record.id, e))?;

    let mut prop_stmt = db.prepare_cached(INSERT_PROPERTY_SQL)?;
    for (key, value) in &record.properties {
        let encoded = serde_json::to_string(value)?;
        let typed = TypedColumns::of(value, &encoded);
        prop_stmt
            .execute(rusqlite::params![
                format!("prop-{}-{}", record.id, key),
                record.id,
                key,
                encoded,
                typed.value_type,
                typed.string,
                typed.number,
                typed.boolean,
                typed.json,
            ])
            .map_err(|e| classify(&record.id, e))?;
    }
    Ok(())
}

/// The selectively populated typed columns of one EAV row. The legacy `value`
/// column always carries the JSON encoding; exactly one typed column is
/// populated for scalar values, `value_json` for arrays and objects.
struct TypedColumns {
    value_type: &'static str,
    string: Option<String>,
    number: Option<f64>,
    boolean: Option<i64>,
    json: Option<String>,
}

impl TypedColumns {
    fn of(value: &Value, encoded: &str) -> TypedColumns {
        let mut typed = TypedColumns {
            value_type: "null",
            string: None,
            number: None,
            boolean: None,
            json: None,
        };
        match value {
            Value::Null => {}
            Value::String(s) => {
                typed.value_type = "string";
                typed.string = Some(s.clone());
            }
            Value::Number(n) => {
                typed.value_type = "number";
                typed.number = n.as_f64();
            }
            Value::Bool(b) => {
                typed.value_type = "boolean";
                typed.boolean = Some(*b as i64);
            }
            Value::Array(_) => {
                typed.value_type = "array";
                typed.json = Some(encoded.to_string());
            }
            Value::Object(_) => {
                typed.value_type = "object";
                typed.json = Some(encoded.to_string());
            }
        }
        typed
    }
}

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

fn opt_text(s: Option<&str>) -> SqlValue {
    s.map(text).unwrap_or(SqlValue::Null)
}

fn timestamp(ts: &DateTime<Utc>) -> SqlValue {
    SqlValue::Text(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn opt_timestamp(ts: Option<&DateTime<Utc>>) -> SqlValue {
    ts.map(timestamp).unwrap_or(SqlValue::Null)
}

/// Distinguishes uniqueness violations (primary key, or the partial unique
/// index on source identity) from other storage failures.
fn classify(card_id: &str, err: rusqlite::Error) -> Error {
    use rusqlite::ffi;

    match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::UniquenessViolation {
                card_id: card_id.to_string(),
                detail: message.clone().unwrap_or_else(|| code.to_string()),
            }
        }
        _ => Error::SQLite(err),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_sql_lists_every_column_once() {
        assert_eq!(
            CARD_COLUMNS.len(),
            INSERT_CARD_SQL.matches('?').count(),
        );
        for column in CARD_COLUMNS {
            assert!(INSERT_CARD_SQL.contains(column), "missing column {column}");
        }
    }

    #[test]
    fn typed_columns_dispatch_on_the_value_tag() {
        let cases = [
            (serde_json::json!("v"), "string"),
            (serde_json::json!(4.5), "number"),
            (serde_json::json!(true), "boolean"),
            (serde_json::json!(null), "null"),
            (serde_json::json!([1, 2]), "array"),
            (serde_json::json!({"k": 1}), "object"),
        ];
        for (value, expected) in cases {
            let encoded = serde_json::to_string(&value).unwrap();
            assert_eq!(expected, TypedColumns::of(&value, &encoded).value_type);
        }
    }
}

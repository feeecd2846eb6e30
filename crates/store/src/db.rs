//! Storage schema. The `cards` and `card_properties` tables are the core's
//! stable contract; `edges`, `facets`, `settings`, and `sync_state` exist for
//! collaborators (graph views, facet persistence, host sync) and are not
//! touched by the writer or query builder.

use crate::{Result, DB};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
    id               TEXT PRIMARY KEY NOT NULL,
    card_type        TEXT NOT NULL DEFAULT 'note',
    name             TEXT NOT NULL,
    content          TEXT,
    summary          TEXT,
    latitude         REAL,
    longitude        REAL,
    location_name    TEXT,
    location_address TEXT,
    created_at       TEXT NOT NULL,
    modified_at      TEXT NOT NULL,
    due_at           TEXT,
    completed_at     TEXT,
    event_start      TEXT,
    event_end        TEXT,
    folder           TEXT,
    -- JSON array as TEXT when non-empty, else NULL.
    tags             TEXT,
    status           TEXT,
    priority         INTEGER NOT NULL DEFAULT 0,
    importance       INTEGER NOT NULL DEFAULT 0,
    sort_order       INTEGER NOT NULL DEFAULT 0,
    grid_x           INTEGER,
    grid_y           INTEGER,
    source           TEXT,
    source_id        TEXT,
    source_url       TEXT,
    deleted_at       TEXT,
    version          INTEGER NOT NULL DEFAULT 1
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_cards_source_identity
    ON cards(source, source_id)
    WHERE source IS NOT NULL AND source_id IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_cards_card_type ON cards(card_type);
CREATE INDEX IF NOT EXISTS idx_cards_folder ON cards(folder);
CREATE INDEX IF NOT EXISTS idx_cards_deleted_at ON cards(deleted_at);

CREATE TABLE IF NOT EXISTS card_properties (
    id            TEXT PRIMARY KEY NOT NULL,
    card_id       TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    key           TEXT NOT NULL,
    value         TEXT,
    value_type    TEXT NOT NULL,
    value_string  TEXT,
    value_number  REAL,
    value_boolean INTEGER,
    value_json    TEXT,
    UNIQUE (card_id, key)
);

CREATE INDEX IF NOT EXISTS idx_card_properties_key ON card_properties(key);

CREATE TABLE IF NOT EXISTS edges (
    id         TEXT PRIMARY KEY NOT NULL,
    source_id  TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    target_id  TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    edge_type  TEXT NOT NULL DEFAULT 'related',
    weight     REAL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS facets (
    id            TEXT PRIMARY KEY NOT NULL,
    name          TEXT NOT NULL,
    axis          TEXT NOT NULL,
    source_column TEXT NOT NULL,
    data_type     TEXT NOT NULL,
    time_format   TEXT,
    options       TEXT,
    sort_order    TEXT NOT NULL DEFAULT 'asc'
);

CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT
);

CREATE TABLE IF NOT EXISTS sync_state (
    id             TEXT PRIMARY KEY NOT NULL,
    source         TEXT NOT NULL,
    last_synced_at TEXT,
    cursor         TEXT
);
"#;

pub fn init(db: &DB) -> Result<()> {
    db.execute_batch(SCHEMA)?;
    Ok(())
}

use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("workspace database error")]
    SQLite(#[from] rusqlite::Error),

    #[error("failed to encode JSON for storage")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp in storage")]
    Timestamp(#[from] chrono::ParseError),

    #[error("card '{card_id}' violates a uniqueness constraint: {detail}")]
    UniquenessViolation { card_id: String, detail: String },

    /// A malformed query request. This is a programmer error: facet ids and
    /// source columns come from code, never from user input.
    #[error("invalid query shape: {0}")]
    QueryShape(String),
}

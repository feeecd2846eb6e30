mod db;
mod dto;
mod error;
mod query;
mod row;
mod writer;

pub use dto::{load_card, CardDto};
pub use error::Error;
pub use query::{HeaderQuery, QueryFilter, QueryOptions};
pub use row::{run_header_query, HeaderRow};
pub use rusqlite::{params as sql_params, Connection as DB};
pub use writer::{insert_canonical, InsertOptions, InsertOutcome, CARD_COLUMNS};

pub type Result<T> = std::result::Result<T, Error>;

/// Create a new and empty workspace database, returning an open connection.
/// Any existing database at the given path is truncated. `":memory:"` opens
/// an in-memory database, which is what most tests use.
pub fn create(path: &str) -> Result<DB> {
    let c = if path == ":memory:" {
        DB::open_in_memory()?
    } else {
        // Create or truncate the database at |path|.
        std::fs::write(path, &[])?;
        DB::open(path)?
    };
    configure(&c)?;
    c.execute_batch("BEGIN;")?;
    db::init(&c)?;
    c.execute_batch("COMMIT;")?;
    Ok(c)
}

/// Open an existing workspace database. The schema must already be installed.
pub fn open(path: impl AsRef<std::path::Path>) -> Result<DB> {
    let c = DB::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE)?;
    configure(&c)?;
    Ok(c)
}

fn configure(c: &DB) -> Result<()> {
    // The properties sidecar cascades on card deletion, which only works with
    // foreign-key enforcement switched on for the connection.
    c.pragma_update(None, "foreign_keys", true)?;
    Ok(())
}

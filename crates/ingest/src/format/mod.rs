//! Per-format importers. Each sub-module handles one family of file
//! extensions and produces canonical records; the shared contract is the
//! object-safe [`Importer`] trait. Parsing failures are per-file: an importer
//! returns [`ParseError`] when its input is structurally unreadable, and an
//! empty sequence for inputs that are empty but well-formed.

pub mod character_separated;
pub mod docx;
mod fields;
pub mod html;
pub mod json;
pub mod markdown;
pub mod spreadsheet;

use chrono::{DateTime, Utc};
use model::CanonicalRecord;
use std::path::Path;

/// One file handed to the pipeline: a name (used for format detection, id
/// generation, and error reporting), raw bytes, and an optional filesystem
/// modification time used as a timestamp fallback.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub filename: String,
    pub content: Vec<u8>,
    pub modified: Option<DateTime<Utc>>,
}

impl FileSource {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> FileSource {
        FileSource {
            filename: filename.into(),
            content: content.into(),
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> FileSource {
        self.modified = Some(modified);
        self
    }

    /// The filename without directories or extension; the last-resort card
    /// name for sources that carry no title of their own.
    pub(crate) fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(self.filename.as_str())
    }
}

/// Importer is an object-safe trait for parsing one format into canonical
/// records. Implementations live in the sub-modules and are wired up by the
/// coordinator's registry.
pub trait Importer {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError>;
}

/// Error type returned by all importers when input is structurally
/// unreadable.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("failed to parse delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("document is not a readable archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to parse document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("{0}")]
    Structure(String),
}

/// The final lowercased extension of `filename`, if it has one.
pub(crate) fn final_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

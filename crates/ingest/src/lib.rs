mod coordinator;
mod format;

pub use self::coordinator::{BatchResult, FileError, ImportError, Registry};
pub use self::format::{
    character_separated, docx, html, json, markdown, spreadsheet, FileSource, Importer, ParseError,
};

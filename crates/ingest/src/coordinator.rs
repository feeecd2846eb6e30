//! The import coordinator: extension dispatch, per-record validation, and
//! batch accounting. A batch never aborts on a bad file; each failure is
//! recorded against its filename and the loop moves on.

use crate::format::{
    self, character_separated, docx, html, json, markdown, spreadsheet, FileSource, Importer,
    ParseError,
};
use model::CanonicalRecord;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("file '{0}' has no extension")]
    MissingExtension(String),

    #[error("unsupported format: '{0}'")]
    UnsupportedFormat(String),

    #[error("failed to parse '{file}': {detail}")]
    Parse {
        file: String,
        #[source]
        detail: ParseError,
    },

    #[error("Record {index} from {file} failed validation: {detail}")]
    Validation {
        index: usize,
        file: String,
        #[source]
        detail: model::SchemaError,
    },
}

/// One failed file within a batch.
#[derive(Debug)]
pub struct FileError {
    pub file: String,
    pub error: ImportError,
}

/// The accounting of one `import_files` call. `imported` and `skipped` count
/// files; the records of every successful file are concatenated in input
/// order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<FileError>,
    pub duration_ms: u64,
    pub records: Vec<CanonicalRecord>,
}

/// Maps lowercased file extensions to importers. Registration is idempotent
/// and last-wins, so a host can override a built-in importer by re-registering
/// its extensions.
pub struct Registry {
    importers: BTreeMap<String, Arc<dyn Importer>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            importers: BTreeMap::new(),
        }
    }

    /// A registry with every built-in importer wired to its extensions.
    pub fn with_defaults() -> Registry {
        let mut registry = Registry::new();
        registry.register(&["md", "markdown", "mdx"], markdown::new_importer());
        registry.register(&["json"], json::new_importer());
        registry.register(&["csv"], character_separated::new_csv_importer());
        registry.register(&["tsv"], character_separated::new_tsv_importer());
        registry.register(&["html", "htm"], html::new_importer());
        registry.register(&["docx"], docx::new_importer());
        registry.register(&["xlsx", "xls"], spreadsheet::new_importer());
        registry
    }

    pub fn register(&mut self, extensions: &[&str], importer: Arc<dyn Importer>) {
        for extension in extensions {
            let key = extension.trim().trim_start_matches('.').to_lowercase();
            if key.is_empty() {
                continue;
            }
            self.importers.insert(key, importer.clone());
        }
    }

    /// Resolves the format a filename will dispatch to, without importing.
    pub fn detect_format(&self, filename: &str) -> Result<String, ImportError> {
        let extension = format::final_extension(filename)
            .ok_or_else(|| ImportError::MissingExtension(filename.to_string()))?;
        if self.importers.contains_key(&extension) {
            Ok(extension)
        } else {
            Err(ImportError::UnsupportedFormat(extension))
        }
    }

    /// Imports one file and validates every record it produced. A single
    /// invalid record fails the whole file.
    pub fn import_file(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ImportError> {
        let extension = self.detect_format(&source.filename)?;
        let importer = &self.importers[&extension];

        let records = importer.import(source).map_err(|detail| ImportError::Parse {
            file: source.filename.clone(),
            detail,
        })?;

        let mut validated = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let record = record
                .validate()
                .map_err(|detail| ImportError::Validation {
                    index,
                    file: source.filename.clone(),
                    detail,
                })?;
            validated.push(record);
        }
        tracing::debug!(
            file = %source.filename,
            format = %extension,
            records = validated.len(),
            "imported file"
        );
        Ok(validated)
    }

    /// Imports a batch of files sequentially. Per-file failures are recorded
    /// and the batch continues; `duration_ms` is wall-clock time.
    #[tracing::instrument(skip_all, fields(files = sources.len()))]
    pub fn import_files(&self, sources: &[FileSource]) -> BatchResult {
        let started = Instant::now();
        let mut result = BatchResult::default();
        for source in sources {
            match self.import_file(source) {
                Ok(mut records) => {
                    result.imported += 1;
                    result.records.append(&mut records);
                }
                Err(error) => {
                    tracing::warn!(file = %source.filename, error = %error, "file skipped");
                    result.skipped += 1;
                    result.errors.push(FileError {
                        file: source.filename.clone(),
                        error,
                    });
                }
            }
        }
        result.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            imported = result.imported,
            skipped = result.skipped,
            records = result.records.len(),
            "finished batch"
        );
        result
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::with_defaults()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registration_normalizes_and_overwrites() {
        let mut registry = Registry::new();
        registry.register(&[".MD", "Markdown"], markdown::new_importer());
        assert_eq!("md", registry.detect_format("a.md").unwrap());
        assert_eq!("markdown", registry.detect_format("a.MARKDOWN").unwrap());

        // Re-registering the same extensions is idempotent.
        registry.register(&["md"], json::new_importer());
        assert_eq!("md", registry.detect_format("a.md").unwrap());
    }

    #[test]
    fn detect_format_distinguishes_missing_from_unsupported() {
        let registry = Registry::with_defaults();
        assert!(matches!(
            registry.detect_format("LICENSE"),
            Err(ImportError::MissingExtension(_))
        ));
        assert!(matches!(
            registry.detect_format("movie.mp4"),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn defaults_cover_the_known_extension_set() {
        let registry = Registry::with_defaults();
        for filename in [
            "a.md", "a.markdown", "a.mdx", "a.json", "a.csv", "a.tsv", "a.html", "a.htm",
            "a.docx", "a.xlsx", "a.xls",
        ] {
            assert!(registry.detect_format(filename).is_ok(), "{filename}");
        }
    }
}

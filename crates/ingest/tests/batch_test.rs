//! End-to-end batch behavior of the import coordinator across mixed formats.

use ingest::{FileSource, ImportError, Importer, ParseError, Registry};
use model::CanonicalRecord;
use std::sync::Arc;

const MARKDOWN: &str = "---\ntitle: Kickoff\ntags: [planning]\n---\n\nFirst note.\n";
const CSV: &str = "name,folder\nBudget,finance\nHiring,people\n";
const JSON: &str = r#"[{"title": "From json", "status": "open"}]"#;

#[test]
fn a_mixed_batch_imports_every_supported_file() {
    let registry = Registry::with_defaults();
    let sources = vec![
        FileSource::new("notes/kickoff.md", MARKDOWN),
        FileSource::new("sheets/plan.csv", CSV),
        FileSource::new("export/items.json", JSON),
    ];

    let result = registry.import_files(&sources);

    assert_eq!(3, result.imported);
    assert_eq!(0, result.skipped);
    assert!(result.errors.is_empty());
    assert_eq!(4, result.records.len());

    // Records arrive in file order, then emission order within a file.
    assert_eq!("Kickoff", result.records[0].name);
    assert_eq!("Budget", result.records[1].name);
    assert_eq!("Hiring", result.records[2].name);
    assert_eq!("From json", result.records[3].name);

    // Every record passed validation and carries provenance.
    for record in &result.records {
        assert!(record.source.is_some());
        assert_eq!(record.source_id.as_deref(), Some(record.id.as_str()));
    }
}

#[test]
fn bad_files_are_recorded_without_aborting_the_batch() {
    let registry = Registry::with_defaults();
    let sources = vec![
        FileSource::new("good.csv", CSV),
        FileSource::new("unreadable.json", "{nope"),
        FileSource::new("movie.mp4", ""),
        FileSource::new("noext", ""),
    ];

    let result = registry.import_files(&sources);

    assert_eq!(1, result.imported);
    assert_eq!(3, result.skipped);
    assert_eq!(3, result.errors.len());
    assert_eq!(2, result.records.len());
    assert!(matches!(result.errors[0].error, ImportError::Parse { .. }));
    assert!(matches!(
        result.errors[1].error,
        ImportError::UnsupportedFormat(_)
    ));
    assert!(matches!(
        result.errors[2].error,
        ImportError::MissingExtension(_)
    ));
}

struct BrokenImporter;

impl Importer for BrokenImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        // One good record, then one violating the tag invariant.
        let now = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        let good = CanonicalRecord::new("ok-1", source.filename.clone(), now, now);
        let mut bad = CanonicalRecord::new("bad-1", "Bad", now, now);
        bad.tags = vec![String::new()];
        Ok(vec![good, bad])
    }
}

#[test]
fn one_invalid_record_fails_the_whole_file_with_its_index() {
    let mut registry = Registry::new();
    registry.register(&["stub"], Arc::new(BrokenImporter));

    let result = registry.import_files(&[FileSource::new("data.stub", "")]);

    assert_eq!(0, result.imported);
    assert_eq!(1, result.skipped);
    match &result.errors[0].error {
        ImportError::Validation { index, file, .. } => {
            assert_eq!(1, *index);
            assert_eq!("data.stub", file);
        }
        other => panic!("expected a validation error, got {other}"),
    }
    let message = result.errors[0].error.to_string();
    assert!(message.starts_with("Record 1 from data.stub failed validation"));
}

#[test]
fn importing_the_same_batch_twice_produces_the_same_ids() {
    let registry = Registry::with_defaults();
    let sources = vec![
        FileSource::new("notes/kickoff.md", MARKDOWN),
        FileSource::new("sheets/plan.csv", CSV),
    ];

    let first: Vec<String> = registry
        .import_files(&sources)
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();
    let second: Vec<String> = registry
        .import_files(&sources)
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(first, second);
}

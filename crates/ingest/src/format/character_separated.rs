//! Importer for character-separated formats: comma-separated for `.csv`,
//! tab-separated for `.tsv`. The first row names the columns; every data row
//! becomes one record.

use super::{fields, FileSource, Importer, ParseError};
use model::{CanonicalRecord, Value};
use serde_json::Map;
use std::sync::Arc;

pub fn new_csv_importer() -> Arc<dyn Importer> {
    Arc::new(DelimitedImporter {
        delimiter: b',',
        source: "csv",
    })
}

pub fn new_tsv_importer() -> Arc<dyn Importer> {
    Arc::new(DelimitedImporter {
        delimiter: b'\t',
        source: "tsv",
    })
}

struct DelimitedImporter {
    delimiter: u8,
    source: &'static str,
}

impl Importer for DelimitedImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        if source.content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            // Allow ragged rows; cells beyond the header row are dropped.
            .flexible(true)
            .from_reader(source.content.as_slice());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let mut map = Map::new();
            for (i, cell) in row.iter().enumerate().take(headers.len()) {
                if !cell.is_empty() && !headers[i].is_empty() {
                    map.insert(headers[i].clone(), Value::String(cell.to_string()));
                }
            }
            if map.is_empty() {
                continue;
            }

            // The row index participates in identity so that rows without any
            // id/name/title column of their own still get distinct cards.
            let mut id_header = map.clone();
            id_header.insert("row".to_string(), Value::from(index));
            let id = model::source_id(&source.filename, &id_header, self.source, None);

            records.push(fields::build_record(source, map, id, self.source));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn import_csv(content: &str) -> Vec<CanonicalRecord> {
        DelimitedImporter {
            delimiter: b',',
            source: "csv",
        }
        .import(&FileSource::new("sheets/tasks.csv", content))
        .unwrap()
    }

    #[test]
    fn each_data_row_becomes_a_record() {
        let records = import_csv(
            "name,status,priority,owner\n\
             Draft spec,open,2,sam\n\
             Review spec,done,1,kim\n",
        );
        assert_eq!(2, records.len());
        assert_eq!("Draft spec", records[0].name);
        assert_eq!(Some("open".to_string()), records[0].status);
        assert_eq!(2, records[0].priority);
        assert_eq!(serde_json::json!("sam"), records[0].properties["owner"]);
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn identical_rows_stay_distinct() {
        let records = import_csv("name\nTwin\nTwin\n");
        assert_eq!(2, records.len());
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let records = import_csv("name,status\nOnly,open\n,\n");
        assert_eq!(1, records.len());
    }

    #[test]
    fn empty_and_header_only_input_import_nothing() {
        assert!(import_csv("").is_empty());
        assert!(import_csv("name,status\n").is_empty());
    }

    #[test]
    fn tabs_separate_tsv_columns() {
        let records = DelimitedImporter {
            delimiter: b'\t',
            source: "tsv",
        }
        .import(&FileSource::new("t.tsv", "name\tfolder\nA card\tWork\n"))
        .unwrap();
        assert_eq!("A card", records[0].name);
        assert_eq!(Some("Work".to_string()), records[0].folder);
    }
}

//! Importer for workbook spreadsheets. Every non-empty sheet contributes
//! records: row 1 names the columns, each following row becomes one record.
//! Legacy binary .xls files share the extension registration but are not a
//! zip container, so they surface as a per-file parse error.

use super::{fields, FileSource, Importer, ParseError};
use model::{CanonicalRecord, Value};
use serde_json::Map;
use std::sync::Arc;

const SOURCE: &str = "spreadsheet";

pub fn new_importer() -> Arc<dyn Importer> {
    Arc::new(SpreadsheetImporter)
}

struct SpreadsheetImporter;

impl Importer for SpreadsheetImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        if source.content.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = std::io::Cursor::new(source.content.as_slice());
        let book = umya_spreadsheet::reader::xlsx::read_reader(cursor, true)
            .map_err(|err| ParseError::Spreadsheet(format!("{err:?}")))?;

        let sheets = book.get_sheet_collection();
        let lone_default_sheet = sheets.len() == 1;

        let mut records = Vec::new();
        for sheet in sheets {
            let sheet_name = sheet.get_name().to_string();
            let highest_row = sheet.get_highest_row();
            let highest_column = sheet.get_highest_column();
            if highest_row < 2 || highest_column == 0 {
                continue;
            }

            let headers: Vec<String> = (1..=highest_column)
                .map(|column| sheet.get_value((column, 1)).trim().to_string())
                .collect();

            for row in 2..=highest_row {
                let mut map = Map::new();
                for (i, header) in headers.iter().enumerate() {
                    if header.is_empty() {
                        continue;
                    }
                    let cell = sheet.get_value((i as u32 + 1, row));
                    let cell = cell.trim();
                    if !cell.is_empty() {
                        map.insert(header.clone(), Value::String(cell.to_string()));
                    }
                }
                if map.is_empty() {
                    continue;
                }

                // Sheet and row participate in identity so that look-alike
                // rows on different sheets stay distinct cards.
                let mut id_header = map.clone();
                id_header.insert("sheet".to_string(), Value::String(sheet_name.clone()));
                id_header.insert("row".to_string(), Value::from(row));
                let id = model::source_id(&source.filename, &id_header, SOURCE, None);

                let mut record = fields::build_record(source, map, id, SOURCE);
                if record.folder.is_none() && !lone_default_sheet {
                    record.folder = Some(sheet_name.clone());
                }
                records.push(record);
            }
        }
        Ok(records)
    }
}

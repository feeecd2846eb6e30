//! Importer for JSON files: a top-level array of objects yields one record
//! per element, a top-level object yields a single record.

use super::{fields, FileSource, Importer, ParseError};
use model::{CanonicalRecord, Value};
use serde_json::Map;
use std::sync::Arc;

const SOURCE: &str = "json";

pub fn new_importer() -> Arc<dyn Importer> {
    Arc::new(JsonImporter)
}

struct JsonImporter;

impl Importer for JsonImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        let text = std::str::from_utf8(&source.content)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_str(text)?;
        let objects: Vec<Map<String, Value>> = match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(ParseError::Structure(format!(
                        "array element is {}, expected an object",
                        type_name(&other)
                    ))),
                })
                .collect::<Result<_, _>>()?,
            Value::Object(map) => vec![map],
            other => {
                return Err(ParseError::Structure(format!(
                    "top-level JSON is {}, expected an object or array of objects",
                    type_name(&other)
                )))
            }
        };

        let records = objects
            .into_iter()
            .map(|map| {
                let id = model::source_id(&source.filename, &map, SOURCE, None);
                fields::build_record(source, map, id, SOURCE)
            })
            .collect();
        Ok(records)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

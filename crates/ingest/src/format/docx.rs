//! Importer for Word documents. A .docx file is a zip container: paragraph
//! text is streamed out of `word/document.xml`, and `docProps/core.xml`
//! contributes the title and lifecycle dates when present.

use super::{fields, FileSource, Importer, ParseError};
use model::{CanonicalRecord, Value};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Map;
use std::io::Read;
use std::sync::Arc;

const SOURCE: &str = "docx";

pub fn new_importer() -> Arc<dyn Importer> {
    Arc::new(DocxImporter)
}

struct DocxImporter;

impl Importer for DocxImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        if source.content.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = std::io::Cursor::new(source.content.as_slice());
        let mut archive = zip::ZipArchive::new(cursor)?;

        let document_xml = read_entry(&mut archive, "word/document.xml")?.ok_or_else(|| {
            ParseError::Structure("archive has no word/document.xml".to_string())
        })?;
        let paragraphs = extract_paragraphs(&document_xml)?;

        let mut header = Map::new();
        if let Some(core_xml) = read_entry(&mut archive, "docProps/core.xml")? {
            for (key, value) in extract_core_properties(&core_xml)? {
                header.insert(key, Value::String(value));
            }
        }

        let id = model::source_id(&source.filename, &header, SOURCE, Some(&source.content));
        let mut record = fields::build_record(source, header, id, SOURCE);

        if record.name == source.stem() {
            if let Some(first) = paragraphs.first() {
                record.name = first.clone();
            }
        }
        if !paragraphs.is_empty() {
            record.summary = record.summary.or_else(|| Some(paragraphs[0].clone()));
            record.content = Some(paragraphs.join("\n\n"));
        }
        Ok(vec![record])
    }
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ParseError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|err| ParseError::Structure(format!("unreadable archive entry {name}: {err}")))?;
    Ok(Some(content))
}

/// Collects the text runs of each `w:p` paragraph, dropping empty ones.
fn extract_paragraphs(xml: &str) -> Result<Vec<String>, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.trim().is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect())
}

/// Pulls title/created/modified out of the core-properties part. Dates are
/// W3CDTF, which the shared timestamp parsing already accepts.
fn extract_core_properties(xml: &str) -> Result<Vec<(String, String)>, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut properties = Vec::new();
    let mut capture: Option<&'static str> = None;
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                capture = match e.name().as_ref() {
                    b"dc:title" => Some("title"),
                    b"dc:creator" => Some("author"),
                    b"dcterms:created" => Some("created"),
                    b"dcterms:modified" => Some("modified"),
                    _ => None,
                };
                text.clear();
            }
            Event::Text(t) if capture.is_some() => text.push_str(&t.unescape()?),
            Event::End(_) => {
                if let Some(key) = capture.take() {
                    let value = text.trim();
                    if !value.is_empty() {
                        properties.push((key.to_string(), value.to_string()));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(properties)
}

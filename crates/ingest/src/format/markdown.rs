//! Importer for Markdown documents. YAML front matter supplies the header;
//! the body becomes the card content, with the first heading and first
//! paragraph standing in for a missing title and summary.

use super::{fields, FileSource, Importer, ParseError};
use model::{CanonicalRecord, Value};
use pulldown_cmark::{Event, Parser, Tag};
use serde_json::Map;
use std::sync::Arc;

const SOURCE: &str = "markdown";

pub fn new_importer() -> Arc<dyn Importer> {
    Arc::new(MarkdownImporter)
}

struct MarkdownImporter;

impl Importer for MarkdownImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        let text = std::str::from_utf8(&source.content)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let (front_matter, body) = split_front_matter(text);
        let header = match front_matter {
            Some(yaml) => match serde_yaml::from_str::<Value>(yaml)? {
                Value::Object(map) => map,
                // Scalar or sequence front matter carries no fields we can
                // name; treat it as absent.
                _ => Map::new(),
            },
            None => Map::new(),
        };

        let heading = first_heading(body);

        // The heading participates in identity when the front matter names no
        // title of its own.
        let mut id_header = header.clone();
        if !id_header.contains_key("title") && !id_header.contains_key("name") {
            if let Some(h) = &heading {
                id_header.insert("title".to_string(), Value::String(h.clone()));
            }
        }
        let id = model::source_id(&source.filename, &id_header, SOURCE, Some(&source.content));

        let mut record = fields::build_record(source, header, id, SOURCE);
        if record.name == source.stem() {
            if let Some(h) = heading {
                record.name = h;
            }
        }
        let body = body.trim();
        if !body.is_empty() {
            record.content = Some(body.to_string());
        }
        if record.summary.is_none() {
            record.summary = first_paragraph(body);
        }
        Ok(vec![record])
    }
}

/// Splits a leading `---` fenced YAML block from the document body. Returns
/// the body untouched when no well-formed fence pair is present.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let after = match text.strip_prefix("---") {
        Some(rest) => rest,
        None => return (None, text),
    };
    let after = match after.strip_prefix("\r\n").or_else(|| after.strip_prefix('\n')) {
        Some(rest) => rest,
        None => return (None, text),
    };

    let mut search = 0;
    while let Some(pos) = after[search..].find("\n---") {
        let fence_start = search + pos + 1;
        let fence_end = fence_start + 3;
        let tail = &after[fence_end..];
        if tail.is_empty() || tail.starts_with('\n') || tail.starts_with("\r\n") {
            let front = &after[..fence_start];
            let body = tail
                .strip_prefix("\r\n")
                .or_else(|| tail.strip_prefix('\n'))
                .unwrap_or(tail);
            return (Some(front), body);
        }
        search = fence_end;
    }
    (None, text)
}

fn first_heading(body: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();
    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::Heading(..)) => in_heading = true,
            Event::End(Tag::Heading(..)) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_heading = false;
                text.clear();
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            _ => {}
        }
    }
    None
}

fn first_paragraph(body: &str) -> Option<String> {
    let mut in_paragraph = false;
    let mut text = String::new();
    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::Paragraph) => in_paragraph = true,
            Event::End(Tag::Paragraph) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_paragraph = false;
                text.clear();
            }
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }
    None
}

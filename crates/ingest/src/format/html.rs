//! Importer for HTML pages: the title (or first h1) names the card, standard
//! meta tags fill summary and tags, and the visible body text becomes the
//! content.

use super::{fields, FileSource, Importer, ParseError};
use model::{CanonicalRecord, Value};
use scraper::{Html, Selector};
use serde_json::Map;
use std::sync::Arc;

const SOURCE: &str = "html";

lazy_static::lazy_static! {
    static ref TITLE: Selector = selector("title");
    static ref H1: Selector = selector("h1");
    static ref META: Selector = selector("meta[name][content]");
    static ref BODY: Selector = selector("body");
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

pub fn new_importer() -> Arc<dyn Importer> {
    Arc::new(HtmlImporter)
}

struct HtmlImporter;

impl Importer for HtmlImporter {
    fn import(&self, source: &FileSource) -> Result<Vec<CanonicalRecord>, ParseError> {
        let text = std::str::from_utf8(&source.content)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document = Html::parse_document(text);

        let title = element_text(&document, &TITLE).or_else(|| element_text(&document, &H1));

        let mut header = Map::new();
        if let Some(title) = &title {
            header.insert("title".to_string(), Value::String(title.clone()));
        }
        for element in document.select(&META) {
            let (name, content) = match (
                element.value().attr("name"),
                element.value().attr("content"),
            ) {
                (Some(n), Some(c)) if !c.trim().is_empty() => (n.to_lowercase(), c.trim()),
                _ => continue,
            };
            match name.as_str() {
                "description" | "keywords" | "author" | "created" | "modified" => {
                    header.insert(name, Value::String(content.to_string()));
                }
                _ => {}
            }
        }

        let id = model::source_id(&source.filename, &header, SOURCE, Some(&source.content));

        let mut record = fields::build_record(source, header, id, SOURCE);
        if let Some(body) = document.select(&BODY).next() {
            let content: Vec<&str> = body.text().collect();
            let content = content.join(" ");
            let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
            if !content.is_empty() {
                record.content = Some(content);
            }
        }
        Ok(vec![record])
    }
}

fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().and_then(|el| {
        let text: Vec<&str> = el.text().collect();
        let text = text.join(" ");
        let trimmed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

//! The row abstraction over header-discovery results. Query results are keyed
//! by dynamic facet ids plus a fixed `card_count`, so callers get accessor
//! methods rather than raw column tuples.

use crate::{HeaderQuery, Result, DB};
use rusqlite::types::Value as SqlValue;
use std::collections::BTreeMap;

/// One grouped row of a header-discovery query: a string value per facet id
/// and the aggregated card count. NULL group values surface as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    values: BTreeMap<String, String>,
    count: i64,
}

impl HeaderRow {
    /// Fabricates a row, mainly for tests and for callers that synthesize
    /// header data outside the store.
    pub fn from_pairs(pairs: &[(&str, &str)], count: i64) -> HeaderRow {
        HeaderRow {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            count,
        }
    }

    pub fn get_string(&self, facet_id: &str) -> &str {
        self.values.get(facet_id).map(String::as_str).unwrap_or("")
    }

    pub fn get_count(&self) -> i64 {
        self.count
    }

    /// Iterates `(facet_id, value)` pairs in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn run_header_query(db: &DB, query: &HeaderQuery) -> Result<Vec<HeaderRow>> {
    let mut stmt = db.prepare(&query.sql)?;
    let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();

    let mut out = Vec::new();
    let mut rows = stmt.query(rusqlite::params_from_iter(query.params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut values = BTreeMap::new();
        let mut count = 0i64;
        for (i, name) in names.iter().enumerate() {
            if name == "card_count" {
                count = row.get(i)?;
            } else {
                let value: SqlValue = row.get(i)?;
                values.insert(name.clone(), stringify(value));
            }
        }
        out.push(HeaderRow { values, count });
    }
    tracing::debug!(rows = out.len(), "header query returned");
    Ok(out)
}

/// Grouped values are compared and displayed as strings; numeric group keys
/// keep their SQLite text rendering.
fn stringify(value: SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(r) => r.to_string(),
        SqlValue::Text(s) => s,
        SqlValue::Blob(_) => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_facets_read_as_empty() {
        let row = HeaderRow::from_pairs(&[("folder", "Work")], 3);
        assert_eq!("Work", row.get_string("folder"));
        assert_eq!("", row.get_string("status"));
        assert_eq!(3, row.get_count());
    }

    #[test]
    fn iteration_order_is_stable() {
        let row = HeaderRow::from_pairs(&[("b", "2"), ("a", "1")], 0);
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(vec!["a", "b"], keys);
    }
}

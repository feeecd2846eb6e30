//! Builds the single grouped-aggregation query that discovers header values
//! for both pivot axes in one pass over the live cards table. User values are
//! always bound positionally; facet ids and column names come from code and
//! are still validated against the fixed column list before interpolation.

use crate::writer::CARD_COLUMNS;
use crate::{Error, Result};
use model::{CardType, DataType, Facet};
use rusqlite::types::Value as SqlValue;

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Include soft-deleted rows. Off by default, which appends
    /// `deleted_at IS NULL`.
    pub include_deleted: bool,
    pub limit: Option<u32>,
    /// Closed-set filter on the stored card type. Empty means all types.
    pub card_types: Vec<CardType>,
}

/// An `IN`-list filter on one cards column.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub column: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HeaderQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
    /// Facet ids in projection order, rows then columns.
    pub facet_ids: Vec<String>,
}

impl HeaderQuery {
    pub fn build(
        row_facets: &[Facet],
        col_facets: &[Facet],
        filters: &[QueryFilter],
        options: &QueryOptions,
    ) -> Result<HeaderQuery> {
        let facets: Vec<&Facet> = row_facets.iter().chain(col_facets.iter()).collect();
        if facets.is_empty() {
            return Err(Error::QueryShape(
                "header discovery requires at least one facet on some axis".to_string(),
            ));
        }

        let mut select = Vec::with_capacity(facets.len() + 1);
        for facet in &facets {
            ensure_known_column(&facet.source_column)?;
            ensure_identifier(&facet.id)?;
            let projection = match (facet.data_type, facet.time_format) {
                (DataType::Date, Some(tf)) => format!(
                    "strftime('{}', {}) AS \"{}\"",
                    tf.strftime(),
                    facet.source_column,
                    facet.id
                ),
                _ => format!("{} AS \"{}\"", facet.source_column, facet.id),
            };
            select.push(projection);
        }
        select.push("COUNT(*) AS card_count".to_string());

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if !options.include_deleted {
            clauses.push("deleted_at IS NULL".to_string());
        }
        if !options.card_types.is_empty() {
            clauses.push(format!(
                "card_type IN ({})",
                placeholders(options.card_types.len())
            ));
            params.extend(
                options
                    .card_types
                    .iter()
                    .map(|t| SqlValue::Text(t.as_str().to_string())),
            );
        }
        for filter in filters {
            ensure_known_column(&filter.column)?;
            if filter.values.is_empty() {
                return Err(Error::QueryShape(format!(
                    "filter on '{}' has no values",
                    filter.column
                )));
            }
            clauses.push(format!(
                "{} IN ({})",
                filter.column,
                placeholders(filter.values.len())
            ));
            params.extend(filter.values.iter().map(|v| SqlValue::Text(v.clone())));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        // Group and order by projection position so strftime projections and
        // plain columns are treated uniformly.
        let positions: Vec<String> = (1..=facets.len()).map(|i| i.to_string()).collect();
        let positions = positions.join(", ");

        let mut sql = format!(
            "SELECT {} FROM cards{} GROUP BY {} ORDER BY {}",
            select.join(", "),
            where_sql,
            positions,
            positions
        );
        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::Integer(i64::from(limit)));
        }

        Ok(HeaderQuery {
            sql,
            params,
            facet_ids: facets.iter().map(|f| f.id.clone()).collect(),
        })
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn ensure_known_column(column: &str) -> Result<()> {
    if CARD_COLUMNS.contains(&column) {
        Ok(())
    } else {
        Err(Error::QueryShape(format!(
            "'{column}' is not a cards column"
        )))
    }
}

fn ensure_identifier(id: &str) -> Result<()> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::QueryShape(format!("'{id}' is not a valid facet id")))
    }
}

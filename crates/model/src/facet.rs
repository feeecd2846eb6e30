//! Facets: the addressable attributes a pivot can group by. Every facet names
//! exactly one storage column (or a strftime projection of one) and carries
//! its LATCH axis, data type, and sort order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five-axis classification of a card attribute: Location, Alphabet,
/// Time, Category, Hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Axis {
    #[serde(rename = "L")]
    Location,
    #[serde(rename = "A")]
    Alphabet,
    #[serde(rename = "T")]
    Time,
    #[serde(rename = "C")]
    Category,
    #[serde(rename = "H")]
    Hierarchy,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::Location => "L",
            Axis::Alphabet => "A",
            Axis::Time => "T",
            Axis::Category => "C",
            Axis::Hierarchy => "H",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Date,
    Select,
    MultiSelect,
}

/// Granularity of a temporal facet. Maps to a strftime projection of the
/// underlying timestamp column; quarter shares the month projection and is
/// distinguished at label-formatting time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    Year,
    Quarter,
    Month,
    Week,
    Day,
}

impl TimeFormat {
    pub fn strftime(&self) -> &'static str {
        match self {
            TimeFormat::Year => "%Y",
            TimeFormat::Quarter | TimeFormat::Month => "%m",
            TimeFormat::Week => "%W",
            TimeFormat::Day => "%Y-%m-%d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
    Custom,
}

impl Default for SortOrder {
    fn default() -> SortOrder {
        SortOrder::Asc
    }
}

/// One addressable grouping dimension over the cards table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    pub id: String,
    pub name: String,
    pub axis: Axis,
    pub source_column: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<TimeFormat>,
    /// Explicit value ordering for `SortOrder::Custom`. Values absent from
    /// this list sort to the end, preserving their incoming order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Facet {
    pub fn text(id: &str, name: &str, axis: Axis, source_column: &str) -> Facet {
        Facet {
            id: id.to_string(),
            name: name.to_string(),
            axis,
            source_column: source_column.to_string(),
            data_type: DataType::Text,
            time_format: None,
            options: Vec::new(),
            sort_order: SortOrder::Asc,
        }
    }

    pub fn number(id: &str, name: &str, source_column: &str) -> Facet {
        Facet {
            data_type: DataType::Number,
            ..Facet::text(id, name, Axis::Hierarchy, source_column)
        }
    }

    pub fn date(id: &str, name: &str, source_column: &str, time_format: TimeFormat) -> Facet {
        Facet {
            data_type: DataType::Date,
            time_format: Some(time_format),
            ..Facet::text(id, name, Axis::Time, source_column)
        }
    }

    pub fn select(id: &str, name: &str, source_column: &str, options: &[&str]) -> Facet {
        Facet {
            data_type: DataType::Select,
            options: options.iter().map(|o| o.to_string()).collect(),
            sort_order: SortOrder::Custom,
            ..Facet::text(id, name, Axis::Category, source_column)
        }
    }

    pub fn with_sort(mut self, sort_order: SortOrder) -> Facet {
        self.sort_order = sort_order;
        self
    }
}

/// The built-in facet catalog: one ready-made facet per commonly pivoted
/// column, spanning all five LATCH axes.
pub fn builtin_catalog() -> Vec<Facet> {
    vec![
        Facet::text("folder", "Folder", Axis::Category, "folder"),
        Facet::text("status", "Status", Axis::Category, "status"),
        Facet::select(
            "card_type",
            "Type",
            "card_type",
            &["note", "person", "event", "resource"],
        ),
        Facet::text("location", "Location", Axis::Location, "location_name"),
        Facet::text("name", "Name", Axis::Alphabet, "name"),
        Facet::number("priority", "Priority", "priority"),
        Facet::number("importance", "Importance", "importance"),
        Facet::date("created_year", "Year Created", "created_at", TimeFormat::Year),
        Facet::date("created_quarter", "Quarter Created", "created_at", TimeFormat::Quarter),
        Facet::date("created_month", "Month Created", "created_at", TimeFormat::Month),
        Facet::date("created_week", "Week Created", "created_at", TimeFormat::Week),
        Facet::date("modified_month", "Month Modified", "modified_at", TimeFormat::Month),
        Facet::date("due_day", "Due Date", "due_at", TimeFormat::Day),
    ]
}

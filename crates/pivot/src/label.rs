//! Header label formatting. Temporal group values come out of the query as
//! strftime output; labels render them the way the headers display them.

use model::{Facet, TimeFormat};

pub fn format_label(facet: &Facet, value: &str) -> String {
    match facet.time_format {
        Some(TimeFormat::Month) => month_label(value),
        Some(TimeFormat::Quarter) => quarter_label(value),
        Some(TimeFormat::Week) => week_label(value),
        _ => value.to_string(),
    }
}

fn month_label(value: &str) -> String {
    let name = match value {
        "01" => "Jan",
        "02" => "Feb",
        "03" => "Mar",
        "04" => "Apr",
        "05" => "May",
        "06" => "Jun",
        "07" => "Jul",
        "08" => "Aug",
        "09" => "Sep",
        "10" => "Oct",
        "11" => "Nov",
        "12" => "Dec",
        other => return other.to_string(),
    };
    name.to_string()
}

/// Quarter facets group on the month projection; the label folds the month
/// into its quarter.
fn quarter_label(value: &str) -> String {
    match value.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => format!("Q{}", (month + 2) / 3),
        _ => value.to_string(),
    }
}

fn week_label(value: &str) -> String {
    match value.parse::<u32>() {
        Ok(week) => format!("W{week}"),
        Err(_) => value.to_string(),
    }
}

// src/pipeline/reshape.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::decode::RawTable;
use crate::pipeline::{canonicalize, Metric, Observation};

/// A column carries year data when its name is purely numeric, optionally
/// with a trailing year-unit marker. Anything else (국가, 성별, 항목, …)
/// must never be melted into the value axis.
static YEAR_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:년)?\s*$").expect("year column pattern"));

/// Parse a column name into a year, if the name denotes one.
pub fn parse_year_column(name: &str) -> Option<i32> {
    YEAR_COLUMN
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
}

/// Column names for a long-layout source.
pub struct LongColumns<'a> {
    pub year: &'a str,
    pub sex: &'a str,
    pub category: &'a str,
    pub value: &'a str,
}

/// Melt a wide table (one column per year) into long observations: one per
/// retained row and year column. Value cells that do not parse as a number
/// become 0.0, keeping the eventual matrix dense without a separate fill
/// pass.
pub fn melt_years(
    table: &RawTable,
    sex_column: &str,
    category_column: &str,
    metric: Metric,
) -> Vec<Observation> {
    let year_columns: Vec<(usize, i32)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| parse_year_column(name).map(|year| (idx, year)))
        .collect();
    if year_columns.is_empty() {
        warn!("no year columns found; nothing to melt");
        return Vec::new();
    }

    let (Some(sex_idx), Some(category_idx)) = (
        table.column_index(sex_column),
        table.column_index(category_column),
    ) else {
        warn!(sex_column, category_column, "id column missing; nothing to melt");
        return Vec::new();
    };

    let mut out = Vec::with_capacity(table.rows.len() * year_columns.len());
    for row in &table.rows {
        let sex = canonicalize::classify_sex(row.get(sex_idx).map(String::as_str).unwrap_or(""));
        let category = row
            .get(category_idx)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        for &(idx, year) in &year_columns {
            out.push(Observation {
                metric,
                year,
                sex,
                category: category.clone(),
                value: parse_value(row.get(idx).map(String::as_str)),
            });
        }
    }
    debug!(
        rows = table.rows.len(),
        years = year_columns.len(),
        observations = out.len(),
        "melted wide table"
    );
    out
}

/// Collect observations from a long table (year already a data value). Rows
/// whose year cell is not numeric are dropped: the raw export carries
/// footnote rows below the data.
pub fn collect_long(table: &RawTable, columns: &LongColumns, metric: Metric) -> Vec<Observation> {
    let (Some(year_idx), Some(sex_idx), Some(category_idx), Some(value_idx)) = (
        table.column_index(columns.year),
        table.column_index(columns.sex),
        table.column_index(columns.category),
        table.column_index(columns.value),
    ) else {
        warn!("contract column missing from long table; nothing to collect");
        return Vec::new();
    };

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(year) = row
            .get(year_idx)
            .and_then(|c| c.trim().parse::<i32>().ok())
        else {
            continue;
        };
        let sex = canonicalize::classify_sex(row.get(sex_idx).map(String::as_str).unwrap_or(""));
        let category = row
            .get(category_idx)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        out.push(Observation {
            metric,
            year,
            sex,
            category,
            value: parse_value(row.get(value_idx).map(String::as_str)),
        });
    }
    out
}

/// Unparsable cells coerce to zero rather than dropping the observation.
fn parse_value(cell: Option<&str>) -> f64 {
    cell.and_then(|c| c.trim().parse::<f64>().ok()).unwrap_or(0.0)
}

// src/pipeline/canonicalize.rs

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::decode::RawTable;
use crate::pipeline::Sex;

/// Sex tokens, matched by substring containment: the two sources format the
/// field differently (bare 남/여 vs suffixed 남자/여자), so exact matching
/// would misclassify one of them. Broadest class first: compound both-sex
/// labels contain the single-sex tokens, and "female" contains "male".
const BOTH_TOKENS: &[&str] = &["남녀", "양성", "계", "both", "total"];
const FEMALE_TOKENS: &[&str] = &["여", "female"];
const MALE_TOKENS: &[&str] = &["남", "male"];

/// Classify a raw sex label. Latin tokens match case-insensitively.
pub fn classify_sex(raw: &str) -> Sex {
    let label = raw.trim().to_lowercase();
    if label.is_empty() {
        return Sex::Unknown;
    }
    if BOTH_TOKENS.iter().any(|t| label.contains(t)) {
        Sex::Both
    } else if FEMALE_TOKENS.iter().any(|t| label.contains(t)) {
        Sex::Female
    } else if MALE_TOKENS.iter().any(|t| label.contains(t)) {
        Sex::Male
    } else {
        Sex::Unknown
    }
}

/// Replace the raw label column with canonical labels, dropping rows whose
/// trimmed label has no mapping entry. Lookup is exact-match only; labels
/// outside the mapping are outside the comparison scope by definition, so
/// the drop is silent.
pub fn map_categories(
    table: &RawTable,
    mapping: &BTreeMap<String, String>,
    column: &str,
) -> RawTable {
    let Some(idx) = table.column_index(column) else {
        warn!(column, "category column missing; dropping all rows");
        return RawTable {
            headers: table.headers.clone(),
            rows: Vec::new(),
        };
    };

    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;
    for row in &table.rows {
        let raw = row.get(idx).map(|c| c.trim()).unwrap_or("");
        match mapping.get(raw) {
            Some(canonical) => {
                let mut out = row.clone();
                out[idx] = canonical.clone();
                rows.push(out);
            }
            None => dropped += 1,
        }
    }
    debug!(kept = rows.len(), dropped, column, "applied category mapping");

    RawTable {
        headers: table.headers.clone(),
        rows,
    }
}

/// Keep only the designated all-ages stratum. The incidence export carries
/// one row per age band per (year, sex, category); keeping more than the
/// aggregate stratum would multiply every downstream total.
pub fn retain_age_aggregate(table: &RawTable, column: &str, label: &str) -> RawTable {
    let Some(idx) = table.column_index(column) else {
        warn!(column, "age column missing; dropping all rows");
        return RawTable {
            headers: table.headers.clone(),
            rows: Vec::new(),
        };
    };
    retain_rows(table, idx, |cell| cell.trim() == label)
}

/// Keep rows whose country cell contains any of the variant substrings.
/// A table without the country column passes through unchanged; a
/// single-country export simply omits it.
pub fn retain_country(table: &RawTable, column: &str, variants: &[String]) -> RawTable {
    let Some(idx) = table.column_index(column) else {
        return table.clone();
    };
    retain_rows(table, idx, |cell| {
        variants.iter().any(|v| cell.contains(v.as_str()))
    })
}

fn retain_rows(table: &RawTable, idx: usize, keep: impl Fn(&str) -> bool) -> RawTable {
    let rows = table
        .rows
        .iter()
        .filter(|row| row.get(idx).map(|c| keep(c)).unwrap_or(false))
        .cloned()
        .collect();
    RawTable {
        headers: table.headers.clone(),
        rows,
    }
}

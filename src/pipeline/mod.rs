// src/pipeline/mod.rs

pub mod aggregate;
pub mod canonicalize;
pub mod matrix;
pub mod reshape;

pub use aggregate::sum_duplicates;
pub use matrix::{write_matrices_json, DenseMatrix};

use serde::Serialize;

use crate::config::{IncidenceSource, MortalitySource};
use crate::decode::RawTable;

/// Which reconciled series an observation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Incidence,
    Mortality,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Incidence => "incidence",
            Metric::Mortality => "mortality",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Both,
    Unknown,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Both => "both",
            Sex::Unknown => "unknown",
        }
    }
}

/// One normalized data point. By the time an observation leaves
/// `sum_duplicates`, `category` is always a canonical label; raw source
/// labels never escape the canonicalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: Metric,
    pub year: i32,
    pub sex: Sex,
    pub category: String,
    pub value: f64,
}

/// Run the incidence pipeline on a decoded table: canonicalize the category
/// labels, keep only the all-ages stratum, collect long rows, sum
/// duplicates.
pub fn incidence_observations(table: &RawTable, src: &IncidenceSource) -> Vec<Observation> {
    let mapped = canonicalize::map_categories(table, &src.mapping, &src.category_column);
    let all_ages =
        canonicalize::retain_age_aggregate(&mapped, &src.age_column, &src.age_aggregate);
    let observations = reshape::collect_long(
        &all_ages,
        &reshape::LongColumns {
            year: &src.year_column,
            sex: &src.sex_column,
            category: &src.category_column,
            value: &src.value_column,
        },
        Metric::Incidence,
    );
    aggregate::sum_duplicates(observations)
}

/// Run the mortality pipeline on a decoded table: keep the target country's
/// rows, canonicalize the category labels, melt the year columns, sum
/// duplicates.
pub fn mortality_observations(table: &RawTable, src: &MortalitySource) -> Vec<Observation> {
    let domestic =
        canonicalize::retain_country(table, &src.country_column, &src.country_variants);
    let mapped = canonicalize::map_categories(&domestic, &src.mapping, &src.category_column);
    let observations = reshape::melt_years(
        &mapped,
        &src.sex_column,
        &src.category_column,
        Metric::Mortality,
    );
    aggregate::sum_duplicates(observations)
}

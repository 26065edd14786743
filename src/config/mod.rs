// src/config/mod.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Inclusive, contiguous run of years. Both matrices are laid out against
/// this axis no matter which years the source files actually contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Column index of `year` on the axis, or None when it falls outside.
    pub fn index_of(&self, year: i32) -> Option<usize> {
        self.contains(year).then(|| (year - self.start) as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    pub fn to_vec(&self) -> Vec<i32> {
        self.iter().collect()
    }
}

/// Column contract and label mapping for the incidence export (long layout:
/// one row per year/sex/category/age-band, value already in its own column).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidenceSource {
    pub path: PathBuf,
    pub year_column: String,
    pub sex_column: String,
    pub category_column: String,
    pub age_column: String,
    pub value_column: String,
    /// The single age stratum kept; every other age band is a sub-stratum
    /// whose inclusion would multiply totals.
    pub age_aggregate: String,
    pub mapping: BTreeMap<String, String>,
}

/// Column contract and label mapping for the mortality export (wide layout:
/// one row per country/sex/category with one column per year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalitySource {
    pub path: PathBuf,
    pub country_column: String,
    pub sex_column: String,
    pub category_column: String,
    /// Substring variants identifying the target country's rows.
    pub country_variants: Vec<String>,
    pub mapping: BTreeMap<String, String>,
}

/// Process-wide configuration: the canonical category list (in display
/// order), the fixed year axis, and one contract per source. Loaded once
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vocabulary: Vec<String>,
    pub years: YearRange,
    pub incidence: IncidenceSource,
    pub mortality: MortalitySource,
}

impl Config {
    /// Load a full configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vocabulary.is_empty() {
            anyhow::bail!("vocabulary must not be empty");
        }
        if self.years.is_empty() {
            anyhow::bail!(
                "year range {}..={} is empty",
                self.years.start,
                self.years.end
            );
        }
        Ok(())
    }
}

fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect()
}

impl Default for Config {
    /// Compiled-in contract for the Korean national statistics exports,
    /// so the tool runs without a config file. Vocabulary order follows
    /// domestic case frequency.
    fn default() -> Self {
        let vocabulary = [
            "위암",
            "대장암",
            "폐암",
            "간암",
            "유방암",
            "자궁경부암",
            "전립선암",
            "췌장암",
            "백혈병",
            "방광암",
            "난소암",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let incidence = IncidenceSource {
            path: PathBuf::from("data_incidence.csv"),
            year_column: "발생연도".into(),
            sex_column: "성별".into(),
            category_column: "암종".into(),
            age_column: "연령군".into(),
            value_column: "조발생률".into(),
            age_aggregate: "연령전체".into(),
            mapping: mapping(&[
                ("위", "위암"),
                ("대장", "대장암"),
                ("폐", "폐암"),
                ("간", "간암"),
                ("유방", "유방암"),
                ("자궁경부", "자궁경부암"),
                ("전립선", "전립선암"),
                ("췌장", "췌장암"),
                ("백혈병", "백혈병"),
                ("방광", "방광암"),
                ("난소", "난소암"),
                // Maps cleanly but sits outside the vocabulary; the matrix
                // builder discards it.
                ("갑상선", "갑상선암"),
            ]),
        };

        let mortality = MortalitySource {
            path: PathBuf::from("data_death.csv"),
            country_column: "국가".into(),
            sex_column: "성별".into(),
            category_column: "항목".into(),
            country_variants: vec!["한국".into(), "대한민국".into()],
            mapping: mapping(&[
                ("위암", "위암"),
                ("대장·직장·항문암", "대장암"),
                ("기관·기관지·폐암", "폐암"),
                ("간암", "간암"),
                // The mortality export labels the female series explicitly.
                ("여성 유방암", "유방암"),
                ("자궁경부암", "자궁경부암"),
                ("전립선암", "전립선암"),
                ("췌장암", "췌장암"),
                ("백혈병", "백혈병"),
                ("방광암", "방광암"),
                ("난소암", "난소암"),
            ]),
        };

        Config {
            vocabulary,
            years: YearRange::new(1999, 2023),
            incidence,
            mortality,
        }
    }
}

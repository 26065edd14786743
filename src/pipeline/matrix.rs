// src/pipeline/matrix.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::config::YearRange;
use crate::pipeline::{Metric, Observation, Sex};

/// A fully populated category × year grid for one (metric, sex) slice.
///
/// Rows follow the vocabulary order and columns the year axis, regardless
/// of what the observations contain; absent cells are zero. Two matrices
/// built against the same configuration therefore always share shape and
/// row identity, which is what makes them comparable cell-for-cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseMatrix {
    pub metric: Metric,
    pub sex: Sex,
    categories: Vec<String>,
    years: Vec<i32>,
    /// Row-major values, `categories.len() * years.len()` cells.
    values: Vec<f64>,
}

impl DenseMatrix {
    /// Pivot aggregated observations onto the fixed axes. Observations for
    /// another sex or metric, categories outside the vocabulary, and years
    /// outside the range are discarded; the axes are the contract, not the
    /// data's own extent. Values land additively, so unaggregated input is
    /// still summed correctly.
    pub fn build(
        observations: &[Observation],
        metric: Metric,
        sex: Sex,
        vocabulary: &[String],
        years: &YearRange,
    ) -> DenseMatrix {
        let year_axis = years.to_vec();
        let mut values = vec![0.0; vocabulary.len() * year_axis.len()];

        let mut placed = 0usize;
        for obs in observations {
            if obs.metric != metric || obs.sex != sex {
                continue;
            }
            let Some(row) = vocabulary.iter().position(|c| c == &obs.category) else {
                continue;
            };
            let Some(col) = years.index_of(obs.year) else {
                continue;
            };
            values[row * year_axis.len() + col] += obs.value;
            placed += 1;
        }
        debug!(
            metric = metric.as_str(),
            sex = sex.as_str(),
            placed,
            discarded = observations.len() - placed,
            "built matrix"
        );

        DenseMatrix {
            metric,
            sex,
            categories: vocabulary.to_vec(),
            years: year_axis,
            values,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn num_rows(&self) -> usize {
        self.categories.len()
    }

    pub fn num_cols(&self) -> usize {
        self.years.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.years.len() + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let width = self.years.len();
        &self.values[row * width..(row + 1) * width]
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().cloned().fold(0.0, f64::max)
    }
}

/// Write matrices as pretty-printed JSON, atomically: serialize to a tmp
/// file next to the target, then rename over it.
pub fn write_matrices_json<P: AsRef<Path>>(path: P, matrices: &[DenseMatrix]) -> Result<()> {
    let path = path.as_ref();
    let tmp_path: PathBuf = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => path.with_file_name(format!(".{}.tmp", name)),
        None => anyhow::bail!("export path {} has no file name", path.display()),
    };

    let mut tmp = fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    serde_json::to_writer_pretty(&mut tmp, matrices).context("serializing matrices")?;
    tmp.write_all(b"\n")?;

    fs::rename(&tmp_path, path).with_context(|| {
        format!("renaming {} -> {}", tmp_path.display(), path.display())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vec<String> {
        vec!["위암".to_string(), "대장암".to_string(), "폐암".to_string()]
    }

    fn obs(metric: Metric, year: i32, sex: Sex, category: &str, value: f64) -> Observation {
        Observation {
            metric,
            year,
            sex,
            category: category.to_string(),
            value,
        }
    }

    #[test]
    fn empty_input_yields_full_zero_matrix() {
        let years = YearRange::new(1999, 2003);
        let m = DenseMatrix::build(&[], Metric::Incidence, Sex::Male, &vocab(), &years);

        assert_eq!(m.num_rows(), 3);
        assert_eq!(m.num_cols(), 5);
        for row in 0..m.num_rows() {
            for col in 0..m.num_cols() {
                assert_eq!(m.get(row, col), 0.0);
            }
        }
    }

    #[test]
    fn places_observations_on_fixed_axes() {
        let years = YearRange::new(1999, 2003);
        let input = vec![
            obs(Metric::Mortality, 1999, Sex::Male, "위암", 24.1),
            obs(Metric::Mortality, 2001, Sex::Male, "폐암", 30.5),
        ];
        let m = DenseMatrix::build(&input, Metric::Mortality, Sex::Male, &vocab(), &years);

        assert_eq!(m.get(0, 0), 24.1);
        assert_eq!(m.get(2, 2), 30.5);
        assert_eq!(m.get(1, 0), 0.0);
    }

    #[test]
    fn discards_out_of_axis_observations() {
        let years = YearRange::new(1999, 2003);
        let input = vec![
            // Canonical but outside the vocabulary.
            obs(Metric::Incidence, 2000, Sex::Male, "갑상선암", 99.0),
            // Outside the year range.
            obs(Metric::Incidence, 1990, Sex::Male, "위암", 50.0),
            // Wrong sex slice.
            obs(Metric::Incidence, 2000, Sex::Female, "위암", 40.0),
        ];
        let m = DenseMatrix::build(&input, Metric::Incidence, Sex::Male, &vocab(), &years);

        assert_eq!(m.max_value(), 0.0);
        assert_eq!(m.num_rows(), 3);
    }

    #[test]
    fn same_cell_sums_on_unaggregated_input() {
        let years = YearRange::new(1999, 2003);
        let input = vec![
            obs(Metric::Mortality, 2000, Sex::Female, "대장암", 3.0),
            obs(Metric::Mortality, 2000, Sex::Female, "대장암", 4.0),
        ];
        let m = DenseMatrix::build(&input, Metric::Mortality, Sex::Female, &vocab(), &years);
        assert_eq!(m.get(1, 1), 7.0);
    }

    #[test]
    fn row_slices_match_cells() {
        let years = YearRange::new(1999, 2000);
        let input = vec![obs(Metric::Incidence, 2000, Sex::Male, "위암", 5.0)];
        let m = DenseMatrix::build(&input, Metric::Incidence, Sex::Male, &vocab(), &years);
        assert_eq!(m.row(0), &[0.0, 5.0]);
        assert_eq!(m.row(1), &[0.0, 0.0]);
    }

    #[test]
    fn export_writes_json_array() {
        let years = YearRange::new(1999, 2000);
        let m = DenseMatrix::build(&[], Metric::Incidence, Sex::Male, &vocab(), &years);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrices.json");
        write_matrices_json(&path, &[m]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let entry = &parsed.as_array().unwrap()[0];
        assert_eq!(entry["metric"], "incidence");
        assert_eq!(entry["sex"], "male");
        assert_eq!(entry["categories"].as_array().unwrap().len(), 3);
        assert_eq!(entry["values"].as_array().unwrap().len(), 6);
    }
}

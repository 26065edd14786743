// src/pipeline/aggregate.rs

use std::collections::BTreeMap;

use crate::pipeline::{Metric, Observation, Sex};

/// Collapse duplicate observations by summing values per
/// (metric, year, sex, category).
///
/// Duplicates are expected: mapping tables are not injective, so several
/// raw labels can land on one canonical label, each representing a disjoint
/// sub-population of that bucket. Summation is therefore the only correct
/// collision rule. The accumulator is a BTreeMap, so output order is
/// deterministic and independent of input order, and re-running on already
/// aggregated observations is a no-op.
pub fn sum_duplicates(observations: Vec<Observation>) -> Vec<Observation> {
    let mut acc: BTreeMap<(Metric, i32, Sex, String), f64> = BTreeMap::new();
    for obs in observations {
        *acc.entry((obs.metric, obs.year, obs.sex, obs.category))
            .or_insert(0.0) += obs.value;
    }
    acc.into_iter()
        .map(|((metric, year, sex, category), value)| Observation {
            metric,
            year,
            sex,
            category,
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(year: i32, sex: Sex, category: &str, value: f64) -> Observation {
        Observation {
            metric: Metric::Mortality,
            year,
            sex,
            category: category.to_string(),
            value,
        }
    }

    #[test]
    fn sums_colliding_observations() {
        // Two raw labels mapped onto the same canonical category for the
        // same (year, sex) must collapse to one summed value.
        let input = vec![
            obs(2000, Sex::Male, "대장암", 10.0),
            obs(2000, Sex::Male, "대장암", 2.5),
        ];
        let out = sum_duplicates(input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, 12.5);
    }

    #[test]
    fn distinct_triples_stay_distinct() {
        let input = vec![
            obs(2000, Sex::Male, "위암", 1.0),
            obs(2001, Sex::Male, "위암", 2.0),
            obs(2000, Sex::Female, "위암", 3.0),
            obs(2000, Sex::Male, "간암", 4.0),
        ];
        let out = sum_duplicates(input);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn order_independent() {
        let a = vec![
            obs(2000, Sex::Male, "위암", 1.0),
            obs(2001, Sex::Female, "간암", 2.0),
            obs(2000, Sex::Male, "위암", 3.0),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(sum_duplicates(a), sum_duplicates(b));
    }

    #[test]
    fn idempotent_on_aggregated_input() {
        let input = vec![
            obs(2000, Sex::Male, "위암", 1.0),
            obs(2000, Sex::Male, "위암", 2.0),
            obs(2001, Sex::Female, "간암", 5.0),
        ];
        let once = sum_duplicates(input);
        let twice = sum_duplicates(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn metrics_never_merge() {
        let mut input = vec![obs(2000, Sex::Male, "위암", 1.0)];
        input.push(Observation {
            metric: Metric::Incidence,
            ..obs(2000, Sex::Male, "위암", 2.0)
        });
        assert_eq!(sum_duplicates(input).len(), 2);
    }
}

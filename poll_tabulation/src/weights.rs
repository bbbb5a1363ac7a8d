use log::{debug, info};
use snafu::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::*;
use crate::dataset::Column;

/// One weight per respondent, aligned by row with the dataset.
///
/// Immutable once computed.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Weights(Vec<f64>);

impl Weights {
    pub fn new(values: Vec<f64>) -> Weights {
        Weights(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Uniform weights, used for the unweighted view of the data.
    pub fn uniform(respondents: usize) -> Weights {
        Weights(vec![1.0; respondents])
    }

    pub(crate) fn check_len(&self, respondents: usize) -> SurveyResult<()> {
        ensure!(
            self.0.len() == respondents,
            WeightCountMismatchSnafu {
                weights: self.0.len(),
                respondents,
            }
        );
        Ok(())
    }
}

// A weighting bucket. Ordered with the IEEE total order so that buckets can key a map.
#[derive(Debug, Clone, Copy)]
struct Bucket(f64);

impl PartialEq for Bucket {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Bucket {}

impl PartialOrd for Bucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Computes post-stratification weights so that every bucket of the
/// stratifying variable carries the same total weight.
///
/// With `truncate`, values are floored to integer buckets after the class
/// year remap (see [`WeightingRules::class_years`]).
pub fn compute_weights(column: &Column, truncate: bool) -> SurveyResult<Weights> {
    compute_weights_with_rules(column, &WeightingRules::with_truncation(truncate))
}

/// Computes the weights with an explicit bucketing policy.
///
/// The target distribution is uniform over the `k` observed buckets, and the
/// weight of a respondent is `(1/k) / frequency(bucket)`.
pub fn compute_weights_with_rules(
    column: &Column,
    rules: &WeightingRules,
) -> SurveyResult<Weights> {
    ensure!(!column.is_empty(), EmptyDatasetSnafu {});

    let mut buckets: Vec<Bucket> = Vec::with_capacity(column.len());
    for (row, cell) in column.cells.iter().enumerate() {
        buckets.push(bucket_of(column, row, cell, rules)?);
    }

    let mut counts: BTreeMap<Bucket, usize> = BTreeMap::new();
    for b in buckets.iter() {
        *counts.entry(*b).or_insert(0) += 1;
    }

    let num_respondents = buckets.len() as f64;
    // Assume the optimal distribution of the weighting variable is uniform.
    let optimal_portion = 1.0 / counts.len() as f64;
    let bucket_weights: BTreeMap<Bucket, f64> = counts
        .iter()
        .map(|(b, count)| {
            let frequency = *count as f64 / num_respondents;
            let weight = optimal_portion / frequency;
            debug!(
                "compute_weights: bucket {} frequency {:.4} weight {:.4}",
                b.0, frequency, weight
            );
            (*b, weight)
        })
        .collect();
    info!(
        "Weighting on {:?}: {} respondents in {} buckets",
        column.name,
        buckets.len(),
        bucket_weights.len()
    );

    let weights: Vec<f64> = buckets
        .iter()
        .map(|b| bucket_weights.get(b).cloned().unwrap_or(0.0))
        .collect();
    Ok(Weights(weights))
}

fn bucket_of(
    column: &Column,
    row: usize,
    cell: &CellValue,
    rules: &WeightingRules,
) -> SurveyResult<Bucket> {
    ensure!(
        !cell.is_missing(),
        MissingStratumSnafu {
            column: column.name.clone(),
            row,
        }
    );
    let raw = cell.as_number().context(NonNumericStratumSnafu {
        column: column.name.clone(),
        row,
        content: format!("{:?}", cell),
    })?;
    let remapped = rules
        .bucket_remap
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
        .unwrap_or(raw);
    let value = if rules.truncate {
        remapped.floor()
    } else {
        remapped
    };
    // Collapse -0.0 onto 0.0 so both land in the same bucket.
    Ok(Bucket(value + 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbers(name: &str, xs: &[f64]) -> Column {
        Column::new(name, xs.iter().map(|x| CellValue::Number(*x)).collect())
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn uneven_buckets() {
        let col = numbers("strata", &[1.0, 1.0, 1.0, 2.0, 2.0, 3.0]);
        let w = compute_weights(&col, false).unwrap();
        let expected = [2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 1.0, 1.0, 2.0];
        for (a, b) in w.as_slice().iter().zip(expected.iter()) {
            assert_close(*a, *b);
        }
        assert_close(w.sum(), 6.0);
    }

    #[test]
    fn class_years_are_truncated_and_remapped() {
        let col = numbers("Class", &[2022.5, 2023.0, 2024.0, 2024.5]);
        let w = compute_weights(&col, true).unwrap();
        // Buckets: 2023 (x2), 2024 (x2).
        for x in w.as_slice() {
            assert_close(*x, 1.0);
        }

        // Without the remap, 2022.5 floors into its own bucket.
        let rules = WeightingRules {
            truncate: true,
            bucket_remap: vec![],
        };
        let w = compute_weights_with_rules(&col, &rules).unwrap();
        assert_close(w.as_slice()[0], (1.0 / 3.0) / 0.25);
        assert_close(w.as_slice()[2], (1.0 / 3.0) / 0.5);
    }

    #[test]
    fn numeric_text_is_accepted() {
        let col = Column::new("Class", vec!["2024".into(), "2025".into()]);
        let w = compute_weights(&col, false).unwrap();
        assert_eq!(w.as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn missing_values_fail() {
        let col = Column::new("Class", vec![CellValue::Missing, CellValue::Missing]);
        let err = compute_weights(&col, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err, SurveyError::MissingStratum { row: 0, .. }));

        let col = Column::new("Class", vec!["senior".into()]);
        assert!(matches!(
            compute_weights(&col, false),
            Err(SurveyError::NonNumericStratum { .. })
        ));
    }

    #[test]
    fn empty_dataset_fails() {
        let col = numbers("Class", &[]);
        assert!(matches!(
            compute_weights(&col, false),
            Err(SurveyError::EmptyDataset {})
        ));
    }

    proptest! {
        #[test]
        fn weights_rebalance_buckets(codes in proptest::collection::vec(0u8..5, 1..60)) {
            let col = numbers("strata", &codes.iter().map(|c| *c as f64).collect::<Vec<_>>());
            let w = compute_weights(&col, false).unwrap();
            let mut totals: BTreeMap<u8, f64> = BTreeMap::new();
            let mut seen: BTreeMap<u8, f64> = BTreeMap::new();
            for (c, x) in codes.iter().zip(w.as_slice()) {
                prop_assert!(*x > 0.0);
                let first = *seen.entry(*c).or_insert(*x);
                prop_assert!((first - x).abs() < 1e-12);
                *totals.entry(*c).or_insert(0.0) += x;
            }
            let n = codes.len() as f64;
            let k = totals.len() as f64;
            for total in totals.values() {
                prop_assert!((total / n - 1.0 / k).abs() < 1e-9);
            }
        }
    }
}

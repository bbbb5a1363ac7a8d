use log::debug;

use crate::config::*;
use crate::question::*;
use crate::weights::Weights;

/// A weighted joint distribution between two questions.
///
/// Rows are the categories of the "crosstab" question, columns the categories
/// of the "by" question. Each column holds shares conditional on its "by"
/// category, rounded to 2 decimals. Empty conditioning groups are all zeros.
#[derive(PartialEq, Debug, Clone)]
pub struct CrossTab {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `cells[row][column]`
    pub cells: Vec<Vec<f64>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == column)?;
        self.cells.get(r).and_then(|cs| cs.get(c)).cloned()
    }

    pub fn column_sum(&self, column: &str) -> Option<f64> {
        let c = self.column_labels.iter().position(|l| l == column)?;
        Some(self.cells.iter().filter_map(|cs| cs.get(c)).sum())
    }

    // Builds the table from per-column vectors.
    fn from_columns(
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> CrossTab {
        let cells = (0..row_labels.len())
            .map(|r| {
                columns
                    .iter()
                    .map(|col| round2(col.get(r).cloned().unwrap_or(0.0)))
                    .collect()
            })
            .collect();
        CrossTab {
            row_labels,
            column_labels,
            cells,
        }
    }
}

/// Rounds to 2 decimals. Undefined values (empty groups) are reported as 0.
pub(crate) fn round2(x: f64) -> f64 {
    if x.is_finite() {
        // + 0.0 turns -0.0 into 0.0
        (x * 100.0).round() / 100.0 + 0.0
    } else {
        0.0
    }
}

/// Weighted share of each category among the respondents selected by `mask`.
pub(crate) fn weighted_distribution(
    values: &[String],
    categories: &[String],
    weights: &[f64],
    mask: impl Fn(usize) -> bool,
) -> Vec<f64> {
    let mut totals = vec![0.0; categories.len()];
    let mut group_total = 0.0;
    for (idx, (value, w)) in values.iter().zip(weights).enumerate() {
        if !mask(idx) {
            continue;
        }
        group_total += w;
        if let Some(pos) = categories.iter().position(|c| c == value) {
            totals[pos] += w;
        }
    }
    totals.iter().map(|t| safe_ratio(*t, group_total)).collect()
}

/// Weighted mean of each indicator among the respondents selected by `mask`.
pub(crate) fn weighted_shares(
    indicators: &[Indicator],
    weights: &[f64],
    mask: impl Fn(usize) -> bool,
) -> Vec<f64> {
    let group_total: f64 = weights
        .iter()
        .enumerate()
        .filter(|(idx, _)| mask(*idx))
        .map(|(_, w)| *w)
        .sum();
    indicators
        .iter()
        .map(|ind| {
            let selected: f64 = ind
                .values
                .iter()
                .zip(weights)
                .enumerate()
                .filter(|(idx, _)| mask(*idx))
                .map(|(_, (x, w))| *x as f64 * w)
                .sum();
            safe_ratio(selected, group_total)
        })
        .collect()
}

fn safe_ratio(num: f64, denom: f64) -> f64 {
    if denom > 0.0 {
        num / denom
    } else {
        0.0
    }
}

fn categories_of(m: &MultiSelectResponses) -> Vec<String> {
    m.indicators.iter().map(|i| i.category.clone()).collect()
}

/// Cross-tabulates `crosstab_q` by `by_q`.
///
/// Multi-select categories are labelled by category name alone, without the
/// `"<question>: "` prefix of their indicator columns.
pub fn crosstab(
    crosstab_q: &RecodedQuestion,
    by_q: &RecodedQuestion,
    weights: &Weights,
) -> SurveyResult<CrossTab> {
    weights.check_len(crosstab_q.num_respondents())?;
    weights.check_len(by_q.num_respondents())?;
    let w = weights.as_slice();
    debug!(
        "crosstab: {:?} ({}) by {:?} ({})",
        crosstab_q.name(),
        crosstab_q.question_type(),
        by_q.name(),
        by_q.question_type()
    );

    let res = match (crosstab_q, by_q) {
        (RecodedQuestion::Categorical(a), RecodedQuestion::Categorical(b)) => {
            // Weighted contingency table, normalized within each column.
            let rows = a.categories();
            let cols = b.categories();
            let columns = cols
                .iter()
                .map(|bv| weighted_distribution(&a.values, &rows, w, |i| b.values[i] == *bv))
                .collect();
            CrossTab::from_columns(rows, cols, columns)
        }
        (RecodedQuestion::Categorical(a), RecodedQuestion::MultiSelect(b)) => {
            let rows = a.categories();
            let columns = b
                .indicators
                .iter()
                .map(|ind| weighted_distribution(&a.values, &rows, w, |i| ind.values[i] == 1))
                .collect();
            CrossTab::from_columns(rows, categories_of(b), columns)
        }
        (RecodedQuestion::MultiSelect(a), RecodedQuestion::Categorical(b)) => {
            let cols = b.categories();
            let columns = cols
                .iter()
                .map(|bv| weighted_shares(&a.indicators, w, |i| b.values[i] == *bv))
                .collect();
            CrossTab::from_columns(categories_of(a), cols, columns)
        }
        (RecodedQuestion::MultiSelect(a), RecodedQuestion::MultiSelect(b)) => {
            let columns = b
                .indicators
                .iter()
                .map(|ind| weighted_shares(&a.indicators, w, |i| ind.values[i] == 1))
                .collect();
            CrossTab::from_columns(categories_of(a), categories_of(b), columns)
        }
    };
    Ok(res)
}

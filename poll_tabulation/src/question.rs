use log::debug;
use snafu::prelude::*;
use std::collections::BTreeSet;

use crate::config::*;
use crate::dataset::Column;

/// Label of the category that collects every answer outside the display values.
pub const OTHER_CATEGORY: &str = "Other";

/// Separator between the selected labels of a multi-select cell.
pub const DEFAULT_DELIMITER: &str = ";";

/// Name of the indicator column emitted for `category` of a multi-select question.
///
/// This is the naming contract between the recoders and everything reading
/// the combined table: `"<question>: <category>"`.
pub fn indicator_column_name(question: &str, category: &str) -> String {
    format!("{}: {}", question, category)
}

/// Inverse of [`indicator_column_name`]. Returns the name unchanged if it does
/// not belong to `question`.
pub fn strip_indicator_prefix<'a>(question: &str, column_name: &'a str) -> &'a str {
    column_name
        .strip_prefix(question)
        .and_then(|rest| rest.strip_prefix(": "))
        .unwrap_or(column_name)
}

/// A validated single-answer question.
#[derive(PartialEq, Debug, Clone)]
pub struct CategoricalResponses {
    pub question: String,
    pub values: Vec<String>,
}

impl CategoricalResponses {
    /// The distinct answers, sorted.
    pub fn categories(&self) -> Vec<String> {
        let s: BTreeSet<&String> = self.values.iter().collect();
        s.into_iter().cloned().collect()
    }
}

/// A 0/1 column for one category of a multi-select question.
#[derive(PartialEq, Debug, Clone)]
pub struct Indicator {
    pub category: String,
    pub values: Vec<u8>,
}

/// A multi-select question expanded into indicator columns.
///
/// Indicators are sorted by category, with the "Other" indicator (if any) last.
#[derive(PartialEq, Debug, Clone)]
pub struct MultiSelectResponses {
    pub question: String,
    pub indicators: Vec<Indicator>,
    // Kept separately: a question may have no indicator at all.
    pub(crate) num_respondents: usize,
}

impl MultiSelectResponses {
    pub fn indicator(&self, category: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.category == category)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.indicators
            .iter()
            .map(|i| indicator_column_name(&self.question, &i.category))
            .collect()
    }

    /// The categories a respondent selected, according to the indicators.
    pub fn selected(&self, row: usize) -> BTreeSet<&str> {
        self.indicators
            .iter()
            .filter(|i| i.values.get(row) == Some(&1))
            .map(|i| i.category.as_str())
            .collect()
    }
}

/// The analysis-ready form of one question.
#[derive(PartialEq, Debug, Clone)]
pub enum RecodedQuestion {
    Categorical(CategoricalResponses),
    MultiSelect(MultiSelectResponses),
}

impl RecodedQuestion {
    pub fn name(&self) -> &str {
        match self {
            RecodedQuestion::Categorical(c) => &c.question,
            RecodedQuestion::MultiSelect(m) => &m.question,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            RecodedQuestion::Categorical(_) => QuestionType::Categorical,
            RecodedQuestion::MultiSelect(_) => QuestionType::MultiSelect,
        }
    }

    pub fn num_respondents(&self) -> usize {
        match self {
            RecodedQuestion::Categorical(c) => c.values.len(),
            RecodedQuestion::MultiSelect(m) => m.num_respondents,
        }
    }
}

/// Turns one raw column into its recoded form.
pub trait Recoder {
    /// Fails with a validation error if any cell of the column is missing.
    fn recode(
        &self,
        column: &Column,
        display_values: Option<&DisplayValues>,
    ) -> SurveyResult<RecodedQuestion>;
}

/// Recoder for single-answer questions.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct CategoricalQuestion;

impl Recoder for CategoricalQuestion {
    /// Values outside `display_values` are replaced by "Other".
    fn recode(
        &self,
        column: &Column,
        display_values: Option<&DisplayValues>,
    ) -> SurveyResult<RecodedQuestion> {
        let mut values: Vec<String> = Vec::with_capacity(column.len());
        for (row, cell) in column.cells.iter().enumerate() {
            let label = cell.as_label().context(MissingResponseSnafu {
                question: column.name.clone(),
                row,
            })?;
            let label = match display_values {
                Some(dv) if !dv.contains(&label) => OTHER_CATEGORY.to_string(),
                _ => label,
            };
            values.push(label);
        }
        Ok(RecodedQuestion::Categorical(CategoricalResponses {
            question: column.name.clone(),
            values,
        }))
    }
}

/// Recoder for "select all that apply" questions.
///
/// The delimiter may span several characters, as in the `", "` of Google
/// Forms exports.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MultiSelectQuestion {
    pub delimiter: String,
}

impl Default for MultiSelectQuestion {
    fn default() -> Self {
        MultiSelectQuestion {
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl MultiSelectQuestion {
    pub fn new(delimiter: &str) -> MultiSelectQuestion {
        MultiSelectQuestion {
            delimiter: delimiter.to_string(),
        }
    }

    // Empty segments (an empty cell, or a trailing delimiter) are not selections.
    // An empty delimiter makes the whole cell a single label.
    fn split_selections(&self, cell: &str) -> BTreeSet<String> {
        if self.delimiter.is_empty() {
            let mut whole = BTreeSet::new();
            if !cell.is_empty() {
                whole.insert(cell.to_string());
            }
            return whole;
        }
        cell.split(self.delimiter.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

impl Recoder for MultiSelectQuestion {
    /// Emits one indicator per observed category. With `display_values`, only
    /// the observed categories in that set are kept, and an extra "Other"
    /// indicator flags the respondents who selected anything outside of it.
    fn recode(
        &self,
        column: &Column,
        display_values: Option<&DisplayValues>,
    ) -> SurveyResult<RecodedQuestion> {
        let mut selections: Vec<BTreeSet<String>> = Vec::with_capacity(column.len());
        for (row, cell) in column.cells.iter().enumerate() {
            let raw = cell.as_label().context(MissingResponseSnafu {
                question: column.name.clone(),
                row,
            })?;
            selections.push(self.split_selections(&raw));
        }

        let observed: BTreeSet<&String> = selections.iter().flatten().collect();
        let retained: Vec<&String> = match display_values {
            Some(dv) => observed.into_iter().filter(|c| dv.contains(*c)).collect(),
            None => observed.into_iter().collect(),
        };
        debug!(
            "MultiSelectQuestion::recode: {:?}: retained categories {:?}",
            column.name, retained
        );

        let mut indicators: Vec<Indicator> = retained
            .iter()
            .map(|category| Indicator {
                category: category.to_string(),
                values: selections
                    .iter()
                    .map(|s| s.contains(*category) as u8)
                    .collect(),
            })
            .collect();

        if let Some(dv) = display_values {
            let other: Vec<u8> = selections
                .iter()
                .map(|s| s.iter().any(|label| !dv.contains(label)) as u8)
                .collect();
            // "Other" may itself be a display value: merge rather than emit a second column.
            if let Some(pos) = indicators
                .iter()
                .position(|i| i.category == OTHER_CATEGORY)
            {
                let mut existing = indicators.remove(pos);
                for (x, o) in existing.values.iter_mut().zip(other) {
                    *x |= o;
                }
                indicators.push(existing);
            } else {
                indicators.push(Indicator {
                    category: OTHER_CATEGORY.to_string(),
                    values: other,
                });
            }
        }

        Ok(RecodedQuestion::MultiSelect(MultiSelectResponses {
            question: column.name.clone(),
            indicators,
            num_respondents: selections.len(),
        }))
    }
}

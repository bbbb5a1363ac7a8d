use log::{debug, info, warn};
use snafu::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::crosstab::{crosstab, CrossTab};
use crate::dataset::{Column, Dataset};
use crate::moe::margin_of_error;
use crate::question::*;
use crate::summary::{summarize, ResponseDistribution};
use crate::weights::{compute_weights_with_rules, Weights};

/// A raw poll together with the declared type of each question.
///
/// Columns without a declared type are excluded from the analysis.
#[derive(Debug, Clone)]
pub struct SurveyDataset {
    dataset: Dataset,
    question_types: QuestionTypeMap,
    display_values: DisplayValuesMap,
    delimiter: String,
}

impl SurveyDataset {
    pub fn new(dataset: Dataset, question_types: QuestionTypeMap) -> SurveyDataset {
        for name in question_types.keys() {
            if dataset.column(name).is_none() {
                warn!("Question {:?} is declared but not present in the data", name);
            }
        }
        SurveyDataset {
            dataset,
            question_types,
            display_values: DisplayValuesMap::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    /// Restricts some questions to the given canonical answers.
    pub fn with_display_values(self, display_values: DisplayValuesMap) -> SurveyDataset {
        SurveyDataset {
            display_values,
            ..self
        }
    }

    /// Separator used by the multi-select cells of this poll.
    pub fn with_delimiter(self, delimiter: &str) -> SurveyDataset {
        SurveyDataset {
            delimiter: delimiter.to_string(),
            ..self
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn num_respondents(&self) -> usize {
        self.dataset.num_respondents()
    }

    /// The declared columns, in dataset order.
    pub fn question_columns(&self) -> Vec<&Column> {
        self.dataset
            .columns()
            .iter()
            .filter(|c| {
                let declared = self.question_types.contains_key(&c.name);
                if !declared {
                    debug!("question_columns: skipping undeclared column {:?}", c.name);
                }
                declared
            })
            .collect()
    }

    /// Computes the weights from one column of the dataset.
    pub fn compute_weights(&self, variable: &str, rules: &WeightingRules) -> SurveyResult<Weights> {
        let column = self.dataset.column(variable).context(MissingColumnSnafu {
            column: variable.to_string(),
        })?;
        compute_weights_with_rules(column, rules)
    }

    /// Recodes every declared question, in dataset order.
    pub fn recode(&self) -> SurveyResult<RecodedSurvey> {
        let categorical = CategoricalQuestion;
        let multi_select = MultiSelectQuestion::new(&self.delimiter);

        let mut questions: Vec<RecodedQuestion> = Vec::new();
        for column in self.question_columns() {
            let question_type = self.question_types[&column.name];
            let recoder: &dyn Recoder = match question_type {
                QuestionType::Categorical => &categorical,
                QuestionType::MultiSelect => &multi_select,
            };
            let display_values = self.display_values.get(&column.name);
            debug!(
                "recode: {:?} as {} (display values: {:?})",
                column.name, question_type, display_values
            );
            questions.push(recoder.recode(column, display_values)?);
        }
        info!(
            "Recoded {} questions for {} respondents",
            questions.len(),
            self.num_respondents()
        );
        RecodedSurvey::new(
            self.question_types.clone(),
            questions,
            self.num_respondents(),
        )
    }
}

/// The values of one column of the combined recoded table.
#[derive(PartialEq, Debug, Clone)]
pub enum RecodedValues {
    Labels(Vec<String>),
    Indicators(Vec<u8>),
}

impl RecodedValues {
    pub fn len(&self) -> usize {
        match self {
            RecodedValues::Labels(v) => v.len(),
            RecodedValues::Indicators(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text form of one cell, as written to files.
    pub fn render(&self, row: usize) -> String {
        match self {
            RecodedValues::Labels(v) => v.get(row).cloned().unwrap_or_default(),
            RecodedValues::Indicators(v) => v.get(row).map(|x| x.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct RecodedColumn {
    pub name: String,
    pub values: RecodedValues,
}

/// The wide table: every recoded question side by side, rows aligned with the dataset.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RecodedTable {
    pub columns: Vec<RecodedColumn>,
}

impl RecodedTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RecodedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// The same table without the given columns.
    pub fn without(&self, names: &[String]) -> RecodedTable {
        RecodedTable {
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name))
                .cloned()
                .collect(),
        }
    }
}

fn columns_of(q: &RecodedQuestion) -> Vec<RecodedColumn> {
    match q {
        RecodedQuestion::Categorical(c) => vec![RecodedColumn {
            name: c.question.clone(),
            values: RecodedValues::Labels(c.values.clone()),
        }],
        RecodedQuestion::MultiSelect(m) => m
            .indicators
            .iter()
            .map(|i| RecodedColumn {
                name: indicator_column_name(&m.question, &i.category),
                values: RecodedValues::Indicators(i.values.clone()),
            })
            .collect(),
    }
}

/// The outcome of recoding a survey: one entry per declared question.
#[derive(PartialEq, Debug, Clone)]
pub struct RecodedSurvey {
    question_types: QuestionTypeMap,
    questions: Vec<RecodedQuestion>,
    index: HashMap<String, usize>,
    num_respondents: usize,
}

impl RecodedSurvey {
    fn new(
        question_types: QuestionTypeMap,
        questions: Vec<RecodedQuestion>,
        num_respondents: usize,
    ) -> SurveyResult<RecodedSurvey> {
        // Indicator columns are namespaced, but a categorical question may still
        // be named like one of them.
        let mut seen: HashSet<String> = HashSet::new();
        for q in questions.iter() {
            for c in columns_of(q) {
                ensure!(
                    !seen.contains(&c.name),
                    DuplicateColumnSnafu { column: c.name }
                );
                seen.insert(c.name);
            }
        }
        let index = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.name().to_string(), idx))
            .collect();
        Ok(RecodedSurvey {
            question_types,
            questions,
            index,
            num_respondents,
        })
    }

    pub fn questions(&self) -> &[RecodedQuestion] {
        &self.questions
    }

    pub fn num_respondents(&self) -> usize {
        self.num_respondents
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty() || self.num_respondents == 0
    }

    /// Looks up a recoded question by name.
    pub fn question(&self, name: &str) -> SurveyResult<&RecodedQuestion> {
        ensure!(
            self.question_types.contains_key(name),
            UnknownQuestionSnafu { question: name }
        );
        let idx = self.index.get(name).context(QuestionNotRecodedSnafu {
            question: name,
        })?;
        Ok(&self.questions[*idx])
    }

    /// Column-wise concatenation of every recoded question.
    pub fn combined(&self) -> RecodedTable {
        RecodedTable {
            columns: self.questions.iter().flat_map(columns_of).collect(),
        }
    }

    /// Weighted cross-tabulation of `crosstab_question` by `by_question`.
    pub fn crosstab(
        &self,
        crosstab_question: &str,
        by_question: &str,
        weights: &Weights,
    ) -> SurveyResult<CrossTab> {
        let a = self.question(crosstab_question)?;
        let b = self.question(by_question)?;
        crosstab(a, b, weights)
    }

    /// Overall margin of error of the poll.
    ///
    /// Requires both the weights and at least one recoded question.
    pub fn margin_of_error(&self, weights: &Weights, critical_value: f64) -> SurveyResult<f64> {
        ensure!(!weights.is_empty(), MissingWeightsSnafu {});
        ensure!(!self.is_empty(), NotRecodedSnafu {});
        margin_of_error(weights, self.num_respondents, critical_value)
    }

    /// Weighted and unweighted distributions of every question.
    pub fn distributions(
        &self,
        weights: &Weights,
    ) -> SurveyResult<Vec<(ResponseDistribution, ResponseDistribution)>> {
        self.questions
            .iter()
            .map(|q| -> SurveyResult<_> {
                Ok((summarize(q, Some(weights))?, summarize(q, None)?))
            })
            .collect()
    }
}

// ********* Input data structures ***********

use snafu::Snafu;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::str::FromStr;

/// One cell of a raw poll export.
///
/// Readers decide how their native cell types map onto these three states.
/// A `Number` holding NaN is considered missing.
#[derive(PartialEq, Debug, Clone)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Number(n) => n.is_nan(),
            CellValue::Text(_) => false,
        }
    }

    /// The answer as a label. Numbers use their shortest decimal form, so
    /// `2023.0` becomes `"2023"` and `2022.5` stays `"2022.5"`.
    pub fn as_label(&self) -> Option<String> {
        match self {
            _ if self.is_missing() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Missing => None,
        }
    }

    /// The numeric value of the cell. Text is accepted when it parses as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            _ if self.is_missing() => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|x| !x.is_nan()),
            CellValue::Missing => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> CellValue {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(x: f64) -> CellValue {
        CellValue::Number(x)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(x: Option<T>) -> CellValue {
        x.map(|v| v.into()).unwrap_or(CellValue::Missing)
    }
}

/// The kind of survey item a column holds.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QuestionType {
    /// Single answer ("multiple choice").
    Categorical,
    /// "Select all that apply", stored as delimiter-joined labels.
    MultiSelect,
}

impl FromStr for QuestionType {
    type Err = SurveyError;

    /// Accepts the labels used by poll configuration files: `MC` or
    /// `categorical`, and `Checkbox` or `multiSelect`.
    fn from_str(s: &str) -> SurveyResult<QuestionType> {
        match s {
            "MC" | "categorical" | "Categorical" => Ok(QuestionType::Categorical),
            "Checkbox" | "multiSelect" | "MultiSelect" => Ok(QuestionType::MultiSelect),
            x => UnsupportedQuestionTypeSnafu {
                declared: x.to_string(),
            }
            .fail(),
        }
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Categorical => write!(f, "categorical"),
            QuestionType::MultiSelect => write!(f, "multi-select"),
        }
    }
}

/// The canonical answers to keep for one question. Anything else is
/// collapsed into the "Other" category.
pub type DisplayValues = BTreeSet<String>;

/// Declared type of every column that takes part in the analysis.
/// Columns missing from this map are left out of the recoding.
pub type QuestionTypeMap = HashMap<String, QuestionType>;

pub type DisplayValuesMap = HashMap<String, DisplayValues>;

// ********* Configuration **********

/// Stratum remapping used for class-year weighting: the combined
/// mid-year cohort is coded 2022.5 and counts with the class of 2023.
pub const CLASS_YEAR_REMAP: [(f64, f64); 1] = [(2022.5, 2023.0)];

/// Controls how stratifying values are turned into weighting buckets.
#[derive(PartialEq, Debug, Clone)]
pub struct WeightingRules {
    /// Floor every value to an integer bucket.
    pub truncate: bool,
    /// Exact value substitutions applied before flooring.
    pub bucket_remap: Vec<(f64, f64)>,
}

impl WeightingRules {
    /// Every distinct value is its own bucket.
    pub const RAW: WeightingRules = WeightingRules {
        truncate: false,
        bucket_remap: Vec::new(),
    };

    /// Class-year weighting: fractional codes are floored after the
    /// cohort remap in [`CLASS_YEAR_REMAP`].
    pub fn class_years() -> WeightingRules {
        WeightingRules {
            truncate: true,
            bucket_remap: CLASS_YEAR_REMAP.to_vec(),
        }
    }

    pub fn with_truncation(truncate: bool) -> WeightingRules {
        if truncate {
            WeightingRules::class_years()
        } else {
            WeightingRules::RAW
        }
    }
}

impl Default for WeightingRules {
    fn default() -> Self {
        WeightingRules::RAW
    }
}

// ******** Errors *********

/// The broad families of failures. All of them are fatal to the requested
/// operation; the caller decides whether to skip a question or abort.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// Missing or malformed cell data.
    Validation,
    /// Unsupported declared question type.
    Configuration,
    /// An operation was called before its inputs exist.
    Precondition,
    /// A question name does not resolve to recoded data.
    Lookup,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SurveyError {
    #[snafu(display("Question \"{question}\" contains at least one missing response (row {row})"))]
    MissingResponse { question: String, row: usize },

    #[snafu(display("Weighting variable \"{column}\" is missing a value at row {row}"))]
    MissingStratum { column: String, row: usize },

    #[snafu(display("Weighting variable \"{column}\" has a non-numeric value {content:?} at row {row}"))]
    NonNumericStratum {
        column: String,
        row: usize,
        content: String,
    },

    #[snafu(display("Cannot compute weights on an empty dataset"))]
    EmptyDataset {},

    #[snafu(display("Column \"{column}\" has {found} values, expected {expected}"))]
    UnequalColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[snafu(display("Row {row} has {found} cells, expected {expected}"))]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[snafu(display("Column \"{column}\" appears more than once"))]
    DuplicateColumn { column: String },

    #[snafu(display(
        "Unsupported question type {declared:?}. Valid question types are MC and Checkbox."
    ))]
    UnsupportedQuestionType { declared: String },

    #[snafu(display("You must calculate weights before calculating the margin of error."))]
    MissingWeights {},

    #[snafu(display("You must recode the data before calculating the margin of error."))]
    NotRecoded {},

    #[snafu(display("{weights} weights were provided for {respondents} respondents"))]
    WeightCountMismatch { weights: usize, respondents: usize },

    #[snafu(display("\"{question}\" is not a question in the survey"))]
    UnknownQuestion { question: String },

    #[snafu(display("Question \"{question}\" has no recoded data"))]
    QuestionNotRecoded { question: String },

    #[snafu(display("Column \"{column}\" is not in the dataset"))]
    MissingColumn { column: String },
}

impl SurveyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SurveyError::MissingResponse { .. }
            | SurveyError::MissingStratum { .. }
            | SurveyError::NonNumericStratum { .. }
            | SurveyError::EmptyDataset {}
            | SurveyError::UnequalColumnLength { .. }
            | SurveyError::RowLength { .. }
            | SurveyError::DuplicateColumn { .. } => ErrorKind::Validation,
            SurveyError::UnsupportedQuestionType { .. } => ErrorKind::Configuration,
            SurveyError::MissingWeights {}
            | SurveyError::NotRecoded {}
            | SurveyError::WeightCountMismatch { .. }
            | SurveyError::UnknownQuestion { .. } => ErrorKind::Precondition,
            SurveyError::QuestionNotRecoded { .. } | SurveyError::MissingColumn { .. } => {
                ErrorKind::Lookup
            }
        }
    }
}

pub type SurveyResult<T> = Result<T, SurveyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_for_numbers_use_shortest_form() {
        assert_eq!(CellValue::Number(2023.0).as_label(), Some("2023".to_string()));
        assert_eq!(CellValue::Number(2022.5).as_label(), Some("2022.5".to_string()));
        assert_eq!(CellValue::Number(f64::NAN).as_label(), None);
        assert_eq!(CellValue::Missing.as_label(), None);
    }

    #[test]
    fn text_cells_parse_as_numbers() {
        assert_eq!(CellValue::from(" 2024 ").as_number(), Some(2024.0));
        assert_eq!(CellValue::from("senior").as_number(), None);
        assert_eq!(CellValue::from(None::<&str>), CellValue::Missing);
    }

    #[test]
    fn question_types_parse() {
        assert_eq!("MC".parse::<QuestionType>().unwrap(), QuestionType::Categorical);
        assert_eq!(
            "Checkbox".parse::<QuestionType>().unwrap(),
            QuestionType::MultiSelect
        );
        let err = "Ranking".parse::<QuestionType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn truncation_brings_the_class_year_remap() {
        assert_eq!(WeightingRules::with_truncation(false), WeightingRules::RAW);
        let rules = WeightingRules::with_truncation(true);
        assert!(rules.truncate);
        assert_eq!(rules.bucket_remap, vec![(2022.5, 2023.0)]);
    }
}

/*!
Weighting, recoding and cross-tabulation of survey polls.

The entry point is [`SurveyDataset`]: a loaded poll plus the declared type of
each question. From it you derive post-stratification [`Weights`] and a
[`RecodedSurvey`], which answers cross-tabs, response distributions and the
overall margin of error.

```
use poll_tabulation::*;
# use poll_tabulation::SurveyError;

let mut builder = DatasetBuilder::new(&["Class", "Hall", "Sports"]);
builder.add_row(&[2023.0.into(), "Ratty".into(), "Tennis;Golf".into()])?;
builder.add_row(&[2024.0.into(), "Andrews".into(), "Golf".into()])?;
builder.add_row(&[2024.0.into(), "Ratty".into(), "".into()])?;

let types: QuestionTypeMap = [
    ("Hall".to_string(), QuestionType::Categorical),
    ("Sports".to_string(), QuestionType::MultiSelect),
]
.into_iter()
.collect();
let survey = SurveyDataset::new(builder.build()?, types);

let weights = survey.compute_weights("Class", &WeightingRules::class_years())?;
let recoded = survey.recode()?;
let table = recoded.crosstab("Hall", "Sports", &weights)?;
assert_eq!(table.get("Ratty", "Tennis"), Some(1.0));

let moe = recoded.margin_of_error(&weights, DEFAULT_CRITICAL_VALUE)?;
assert!(moe > 0.0);
# Ok::<(), SurveyError>(())
```

See the [manual] for the conventions used by the recoders.
*/

mod config;
pub mod crosstab;
pub mod dataset;
pub mod manual;
pub mod moe;
pub mod question;
pub mod summary;
pub mod survey;
pub mod weights;

pub use crate::config::*;
pub use crate::crosstab::{crosstab, CrossTab};
pub use crate::dataset::{Column, Dataset, DatasetBuilder};
pub use crate::moe::{design_effect, margin_of_error, DEFAULT_CRITICAL_VALUE};
pub use crate::question::{
    indicator_column_name, strip_indicator_prefix, CategoricalQuestion, CategoricalResponses,
    Indicator, MultiSelectQuestion, MultiSelectResponses, RecodedQuestion, Recoder,
    DEFAULT_DELIMITER, OTHER_CATEGORY,
};
pub use crate::summary::{summarize, ResponseDistribution};
pub use crate::survey::{
    RecodedColumn, RecodedSurvey, RecodedTable, RecodedValues, SurveyDataset,
};
pub use crate::weights::{compute_weights, compute_weights_with_rules, Weights};

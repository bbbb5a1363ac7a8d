use crate::poll::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::str::FromStr;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "pollName")]
    pub poll_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "recodedFileName")]
    pub recoded_file_name: Option<String>,
    pub sanitize: Option<Vec<String>>,
}

impl OutputSettings {
    pub fn recoded_file_name(&self) -> String {
        self.recoded_file_name
            .clone()
            .unwrap_or_else(|| "poll_recoded.csv".to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "multiSelectDelimiter")]
    pub multi_select_delimiter: Option<String>,
}

impl DataSource {
    /// The multi-select separator. It may be several characters long, but
    /// not empty.
    pub fn delimiter(&self) -> PollResult<String> {
        match self.multi_select_delimiter.as_deref() {
            None => Ok(DEFAULT_DELIMITER.to_string()),
            Some("") => InvalidDelimiterSnafu { delimiter: "" }.fail(),
            Some(s) => Ok(s.to_string()),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct QuestionConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(rename = "displayValues")]
    pub display_values: Option<Vec<String>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BucketRemap {
    pub from: f64,
    pub to: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct WeightingConfig {
    pub variable: String,
    #[serde(default)]
    pub truncate: bool,
    #[serde(rename = "bucketRemap")]
    pub bucket_remap: Option<Vec<BucketRemap>>,
    #[serde(rename = "criticalValue")]
    pub critical_value: Option<f64>,
}

impl WeightingConfig {
    /// The bucketing rules. Truncated class years get the default remap
    /// unless the configuration provides its own table.
    pub fn rules(&self) -> WeightingRules {
        let mut rules = WeightingRules::with_truncation(self.truncate);
        if let Some(remap) = self.bucket_remap.as_ref() {
            rules.bucket_remap = remap.iter().map(|r| (r.from, r.to)).collect();
        }
        rules
    }

    pub fn critical_value(&self) -> f64 {
        self.critical_value.unwrap_or(DEFAULT_CRITICAL_VALUE)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CrosstabConfig {
    pub crosstab: String,
    pub by: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource")]
    pub data_source: DataSource,
    pub questions: Vec<QuestionConfig>,
    pub weighting: WeightingConfig,
    pub crosstabs: Option<Vec<CrosstabConfig>>,
}

impl PollConfig {
    pub fn question_types(&self) -> SurveyResult<QuestionTypeMap> {
        let mut res = QuestionTypeMap::new();
        for q in self.questions.iter() {
            res.insert(q.name.clone(), QuestionType::from_str(&q.question_type)?);
        }
        Ok(res)
    }

    pub fn display_values(&self) -> DisplayValuesMap {
        self.questions
            .iter()
            .filter_map(|q| {
                q.display_values
                    .as_ref()
                    .map(|dv| (q.name.clone(), dv.iter().cloned().collect::<DisplayValues>()))
            })
            .collect()
    }
}

pub fn read_config(path: &str) -> PollResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PollConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> PollResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

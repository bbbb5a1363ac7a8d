use log::{debug, info, warn};

use poll_tabulation::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::poll::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name:?} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The spreadsheet {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Error reading file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}: {source}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}: {source}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}: {source}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown input provider {provider:?}: expected csv or xlsx"))]
    UnknownProvider { provider: String },
    #[snafu(display("Invalid multi-select delimiter {delimiter:?}: it must not be empty"))]
    InvalidDelimiter { delimiter: String },
    #[snafu(display("Cannot sanitize column {column:?}: it is not in the recoded data"))]
    UnknownSanitizeColumn { column: String },
    #[snafu(display("{source}"))]
    Survey { source: SurveyError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollResult<T> = Result<T, PollError>;

pub type BPollResult<T> = Result<T, Box<PollError>>;

// ******** Summary output *********

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub poll: String,
    pub respondents: String,
    #[serde(rename = "weightingVariable")]
    pub weighting_variable: String,
    #[serde(rename = "marginOfError")]
    pub margin_of_error: String,
}

fn distribution_to_json(d: &ResponseDistribution) -> Vec<JSValue> {
    d.entries
        .iter()
        .map(|(label, percent)| json!({"label": label, "percent": percent.to_string()}))
        .collect()
}

fn crosstab_to_json(spec: &CrosstabConfig, ct: &CrossTab) -> JSValue {
    let rows: Vec<JSValue> = ct
        .row_labels
        .iter()
        .zip(ct.cells.iter())
        .map(|(label, cells)| {
            let values: Vec<String> = cells.iter().map(|x| x.to_string()).collect();
            json!({"label": label, "values": values})
        })
        .collect();
    json!({
        "crosstab": spec.crosstab,
        "by": spec.by,
        "columns": ct.column_labels,
        "rows": rows
    })
}

fn build_summary_js(
    config: &PollConfig,
    recoded: &RecodedSurvey,
    moe: f64,
    distributions: &[(ResponseDistribution, ResponseDistribution)],
    crosstabs: &[(CrosstabConfig, CrossTab)],
) -> JSValue {
    let c = OutputConfig {
        poll: config.output_settings.poll_name.clone(),
        respondents: recoded.num_respondents().to_string(),
        weighting_variable: config.weighting.variable.clone(),
        margin_of_error: format!("{:.4}", moe),
    };
    let results: Vec<JSValue> = recoded
        .questions()
        .iter()
        .zip(distributions.iter())
        .map(|(q, (weighted, unweighted))| {
            json!({
                "question": q.name(),
                "type": q.question_type().to_string(),
                "weighted": distribution_to_json(weighted),
                "unweighted": distribution_to_json(unweighted)
            })
        })
        .collect();
    let tabs: Vec<JSValue> = crosstabs
        .iter()
        .map(|(spec, ct)| crosstab_to_json(spec, ct))
        .collect();
    json!({
        "config": c,
        "results": results,
        "crosstabs": tabs
    })
}

// ******** Pipeline *********

fn read_responses(
    root_path: &Path,
    source: &DataSource,
    override_input: Option<&str>,
    override_input_type: Option<&str>,
) -> BPollResult<Dataset> {
    let p: PathBuf = match override_input {
        Some(input) => PathBuf::from(input),
        None => root_path.join(&source.file_path),
    };
    let path = p.as_path().display().to_string();
    let provider = override_input_type.unwrap_or(source.provider.as_str());
    info!("Attempting to read responses file {:?} ({})", path, provider);
    match provider {
        "csv" => io_csv::read_csv_responses(&path),
        "xlsx" | "excel" => {
            io_excel::read_excel_responses(&path, source.excel_worksheet_name.as_deref())
        }
        x => Err(Box::new(PollError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

fn build_survey(config: &PollConfig, dataset: Dataset) -> BPollResult<SurveyDataset> {
    let question_types = config.question_types().context(SurveySnafu {})?;
    let survey = SurveyDataset::new(dataset, question_types)
        .with_display_values(config.display_values())
        .with_delimiter(&config.data_source.delimiter()?);
    Ok(survey)
}

/// Writes the combined recoded table, without the sanitized columns.
pub fn write_recoded_csv(
    table: &RecodedTable,
    sanitize: &[String],
    path: &Path,
) -> BPollResult<()> {
    let path_s = path.display().to_string();
    for column in sanitize.iter() {
        if table.column(column).is_none() {
            return Err(Box::new(PollError::UnknownSanitizeColumn {
                column: column.clone(),
            }));
        }
    }
    let kept = table.without(sanitize);
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu {
        path: path_s.clone(),
    })?;
    wtr.write_record(kept.column_names())
        .context(CsvWriteSnafu {
            path: path_s.clone(),
        })?;
    for row in 0..kept.num_rows() {
        let record: Vec<String> = kept.columns.iter().map(|c| c.values.render(row)).collect();
        wtr.write_record(&record).context(CsvWriteSnafu {
            path: path_s.clone(),
        })?;
    }
    wtr.flush().context(WritingFileSnafu { path: path_s })?;
    info!("Wrote recoded data to {:?}", path);
    Ok(())
}

fn write_summary(pretty_js: &str, out: &str) -> BPollResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
    } else {
        fs::write(out, pretty_js).context(WritingFileSnafu { path: out })?;
        info!("Wrote summary to {:?}", out);
    }
    Ok(())
}

fn check_reference(pretty_js_stats: &str, summary_path: &str) -> PollResult<()> {
    let summary_ref = read_summary(summary_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("Summary matches the reference {:?}", summary_path);
    Ok(())
}

/// Runs the whole poll: reads the responses, weights, recodes, tabulates and
/// writes the outputs.
pub fn run_poll(
    config_path: &str,
    check_summary_path: Option<&str>,
    override_out: Option<&str>,
    override_input: Option<&str>,
    override_input_type: Option<&str>,
) -> BPollResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root_p = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;

    let dataset = read_responses(
        root_p,
        &config.data_source,
        override_input,
        override_input_type,
    )?;
    info!(
        "Read {} respondents and {} columns",
        dataset.num_respondents(),
        dataset.columns().len()
    );

    let survey = build_survey(&config, dataset)?;
    let weights = survey
        .compute_weights(&config.weighting.variable, &config.weighting.rules())
        .context(SurveySnafu {})?;
    let recoded = survey.recode().context(SurveySnafu {})?;
    let moe = recoded
        .margin_of_error(&weights, config.weighting.critical_value())
        .context(SurveySnafu {})?;
    info!("Margin of error: {:.4}", moe);

    let distributions = recoded.distributions(&weights).context(SurveySnafu {})?;
    let mut crosstabs: Vec<(CrosstabConfig, CrossTab)> = Vec::new();
    for spec in config.crosstabs.iter().flatten() {
        let ct = recoded
            .crosstab(&spec.crosstab, &spec.by, &weights)
            .context(SurveySnafu {})?;
        debug!("crosstab {:?} by {:?}: {:?}", spec.crosstab, spec.by, ct);
        crosstabs.push((spec.clone(), ct));
    }

    if let Some(dir) = config.output_settings.output_directory.as_ref() {
        let out_dir = root_p.join(dir);
        fs::create_dir_all(&out_dir).context(WritingFileSnafu {
            path: out_dir.display().to_string(),
        })?;
        let file_name = config.output_settings.recoded_file_name();
        let sanitize = config.output_settings.sanitize.clone().unwrap_or_default();
        write_recoded_csv(&recoded.combined(), &sanitize, &out_dir.join(file_name))?;
    } else {
        info!("No output directory configured, the recoded data is not written");
    }

    let result_js = build_summary_js(&config, &recoded, moe, &distributions, &crosstabs);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    if let Some(out) = override_out {
        write_summary(&pretty_js_stats, out)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(&pretty_js_stats, summary_p)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(test_name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name)
    }

    fn run_poll_test(test_name: &str) -> BPollResult<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = test_dir(test_name);
        info!("Running test {}", test_name);
        run_poll(
            &format!("{}/{}_config.json", dir, test_name),
            Some(&format!("{}/{}_expected_summary.json", dir, test_name)),
            None,
            None,
            None,
        )
    }

    fn test_wrapper(test_name: &str) {
        if let Err(e) = run_poll_test(test_name) {
            panic!("test {} failed: {}", test_name, e);
        }
    }

    #[test]
    fn class_year_poll() {
        test_wrapper("class_year_poll");
    }

    #[test]
    fn unweighted_strata_poll() {
        test_wrapper("unweighted_strata_poll");
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let dir = test_dir("class_year_poll");
        let res = run_poll(
            &format!("{}/class_year_poll_config.json", dir),
            Some(&format!("{}/unweighted_strata_poll_expected_summary.json", test_dir("unweighted_strata_poll"))),
            None,
            None,
            None,
        );
        assert!(matches!(res.map_err(|e| *e), Err(PollError::Whatever { .. })));
    }

    #[test]
    fn missing_multi_select_answer_fails() {
        let dir = test_dir("missing_answer_poll");
        let res = run_poll(
            &format!("{}/missing_answer_poll_config.json", dir),
            None,
            None,
            None,
            None,
        );
        match res.map_err(|e| *e) {
            Err(PollError::Survey { source }) => {
                assert_eq!(source.kind(), ErrorKind::Validation)
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn unknown_provider_fails() {
        let dir = test_dir("class_year_poll");
        let res = run_poll(
            &format!("{}/class_year_poll_config.json", dir),
            None,
            None,
            None,
            Some("sav"),
        );
        assert!(matches!(
            res.map_err(|e| *e),
            Err(PollError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn google_forms_delimiter() {
        let config: PollConfig = serde_json::from_str(
            r#"{
                "outputSettings": { "pollName": "Forms export" },
                "dataSource": {
                    "provider": "csv",
                    "filePath": "responses.csv",
                    "multiSelectDelimiter": ", "
                },
                "questions": [{ "name": "Sports", "type": "Checkbox" }],
                "weighting": { "variable": "Class", "truncate": true }
            }"#,
        )
        .unwrap();
        let mut b = DatasetBuilder::new(&["Class", "Sports"]);
        b.add_row(&["2023".into(), "Tennis, Golf".into()]).unwrap();
        b.add_row(&["2024".into(), "Golf".into()]).unwrap();
        let recoded = build_survey(&config, b.build().unwrap())
            .unwrap()
            .recode()
            .unwrap();
        assert_eq!(
            recoded.combined().column_names(),
            vec!["Sports: Golf", "Sports: Tennis"]
        );
    }

    #[test]
    fn recoded_csv_is_sanitized() {
        let mut b = DatasetBuilder::new(&["Hall", "Sports", "GPA"]);
        b.add_row(&["Ratty".into(), "Tennis;Golf".into(), 3.9.into()])
            .unwrap();
        b.add_row(&["Andrews".into(), "Golf".into(), 3.5.into()])
            .unwrap();
        let types: QuestionTypeMap = [
            ("Hall".to_string(), QuestionType::Categorical),
            ("Sports".to_string(), QuestionType::MultiSelect),
            ("GPA".to_string(), QuestionType::Categorical),
        ]
        .into_iter()
        .collect();
        let recoded = SurveyDataset::new(b.build().unwrap(), types)
            .recode()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recoded.csv");
        write_recoded_csv(&recoded.combined(), &["GPA".to_string()], &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Hall,Sports: Golf,Sports: Tennis\nRatty,1,1\nAndrews,1,0\n"
        );

        let err = write_recoded_csv(&recoded.combined(), &["Age".to_string()], &path)
            .unwrap_err();
        assert!(matches!(*err, PollError::UnknownSanitizeColumn { .. }));
    }
}

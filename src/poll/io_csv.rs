// Primitives for reading CSV files.

use crate::poll::io_common::{cell_from_text, simplify_file_name};
use crate::poll::*;

/// Reads a CSV export with a header row. Short rows are padded with missing
/// answers.
pub fn read_csv_responses(path: &str) -> BPollResult<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_responses: headers: {:?}", headers);

    let mut builder = DatasetBuilder::new(&headers);
    for (idx, line_r) in rdr.records().enumerate() {
        // Line 1 is the header
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<CellValue> = line.iter().map(cell_from_text).collect();
        debug!("read_csv_responses: lineno: {:?} row: {:?}", lineno, cells);
        builder.add_partial_row(&cells).context(SurveySnafu {})?;
    }
    let dataset = builder.build().context(SurveySnafu {})?;
    info!(
        "read_csv_responses: {}: {} respondents",
        simplify_file_name(path),
        dataset.num_respondents()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_header_and_cells() {
        let f = write_tmp("Class,Sports,Comments\n2024,Tennis;Golf,\n2022.5,\"Golf\",\"a, b\"\n2025\n");
        let ds = read_csv_responses(f.path().to_str().unwrap()).unwrap();
        assert_eq!(ds.num_respondents(), 3);
        assert_eq!(ds.column_names(), vec!["Class", "Sports", "Comments"]);
        let class = ds.column("Class").unwrap();
        assert_eq!(class.cells[1], CellValue::Text("2022.5".to_string()));
        assert_eq!(class.cells[1].as_number(), Some(2022.5));
        let comments = ds.column("Comments").unwrap();
        assert_eq!(comments.cells[0], CellValue::Missing);
        assert_eq!(comments.cells[1], CellValue::Text("a, b".to_string()));
        assert_eq!(comments.cells[2], CellValue::Missing);
    }

    #[test]
    fn numeric_looking_answers_keep_their_spelling() {
        let f = write_tmp("Class,What is your GPA?\n2023,4.0\n2024,007\n2025,Prefer not to say\n");
        let ds = read_csv_responses(f.path().to_str().unwrap()).unwrap();
        let gpa = ds.column("What is your GPA?").unwrap();
        let recoded = CategoricalQuestion.recode(gpa, None).unwrap();
        match recoded {
            RecodedQuestion::Categorical(c) => {
                assert_eq!(c.values, vec!["4.0", "007", "Prefer not to say"])
            }
            x => panic!("unexpected recoding {:?}", x),
        }

        let dv: DisplayValues = ["4.0".to_string()].into_iter().collect();
        let recoded = CategoricalQuestion.recode(gpa, Some(&dv)).unwrap();
        match recoded {
            RecodedQuestion::Categorical(c) => {
                assert_eq!(c.values, vec!["4.0", "Other", "Other"])
            }
            x => panic!("unexpected recoding {:?}", x),
        }

        // The strata still weight as numbers.
        let weights =
            compute_weights(ds.column("Class").unwrap(), true).unwrap();
        assert_eq!(weights.as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn long_rows_are_rejected() {
        let f = write_tmp("Class,Sports\n2024,Golf,extra\n");
        let err = read_csv_responses(f.path().to_str().unwrap()).unwrap_err();
        match *err {
            PollError::Survey { source } => assert_eq!(source.kind(), ErrorKind::Validation),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn missing_file() {
        let err = read_csv_responses("/nonexistent/responses.csv").unwrap_err();
        assert!(matches!(*err, PollError::CsvOpen { .. }));
    }
}

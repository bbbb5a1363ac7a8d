use log::debug;
use snafu::prelude::*;
use std::collections::HashSet;

use crate::config::*;

/// One named column of raw responses.
#[derive(PartialEq, Debug, Clone)]
pub struct Column {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    pub fn new(name: &str, cells: Vec<CellValue>) -> Column {
        Column {
            name: name.to_string(),
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A fully loaded poll export: ordered named columns, one row per respondent.
///
/// Invariant: all the columns have the same length and distinct names.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> SurveyResult<Dataset> {
        let mut seen: HashSet<&str> = HashSet::new();
        let expected = columns.first().map(|c| c.len()).unwrap_or(0);
        for c in columns.iter() {
            ensure!(
                seen.insert(c.name.as_str()),
                DuplicateColumnSnafu {
                    column: c.name.clone()
                }
            );
            ensure!(
                c.len() == expected,
                UnequalColumnLengthSnafu {
                    column: c.name.clone(),
                    expected,
                    found: c.len(),
                }
            );
        }
        debug!(
            "Dataset::new: {} columns, {} respondents",
            columns.len(),
            expected
        );
        Ok(Dataset { columns })
    }

    pub fn num_respondents(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.num_respondents() == 0
    }
}

/// Row-oriented construction of a [`Dataset`], as the file readers produce it.
///
/// ```
/// use poll_tabulation::{CellValue, DatasetBuilder};
/// # use poll_tabulation::SurveyError;
///
/// let mut builder = DatasetBuilder::new(&["Class", "Hobbies"]);
/// builder.add_row(&[CellValue::Number(2024.0), "Music;Sports".into()])?;
/// builder.add_row(&[CellValue::Number(2025.0), "Music".into()])?;
/// let dataset = builder.build()?;
/// assert_eq!(dataset.num_respondents(), 2);
///
/// # Ok::<(), SurveyError>(())
/// ```
pub struct DatasetBuilder {
    names: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DatasetBuilder {
    pub fn new<S: AsRef<str>>(names: &[S]) -> DatasetBuilder {
        DatasetBuilder {
            names: names.iter().map(|s| s.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Adds the answers of one respondent, in column order.
    pub fn add_row(&mut self, cells: &[CellValue]) -> SurveyResult<()> {
        ensure!(
            cells.len() == self.names.len(),
            RowLengthSnafu {
                row: self.rows.len(),
                expected: self.names.len(),
                found: cells.len(),
            }
        );
        self.rows.push(cells.to_vec());
        Ok(())
    }

    /// Adds a row that may be shorter than the header. The remaining cells are missing.
    pub fn add_partial_row(&mut self, cells: &[CellValue]) -> SurveyResult<()> {
        let mut row = cells.to_vec();
        if row.len() < self.names.len() {
            row.resize(self.names.len(), CellValue::Missing);
        }
        self.add_row(&row)
    }

    pub fn build(self) -> SurveyResult<Dataset> {
        let mut columns: Vec<Column> = self
            .names
            .iter()
            .map(|name| Column {
                name: name.clone(),
                cells: Vec::with_capacity(self.rows.len()),
            })
            .collect();
        for row in self.rows {
            for (col, cell) in columns.iter_mut().zip(row) {
                col.cells.push(cell);
            }
        }
        Dataset::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unequal_columns_are_rejected() {
        let res = Dataset::new(vec![
            Column::new("a", vec!["x".into(), "y".into()]),
            Column::new("b", vec!["x".into()]),
        ]);
        let err = res.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(err, SurveyError::UnequalColumnLength { found: 1, .. }));
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let res = Dataset::new(vec![
            Column::new("a", vec!["x".into()]),
            Column::new("a", vec!["y".into()]),
        ]);
        assert!(matches!(res, Err(SurveyError::DuplicateColumn { .. })));
    }

    #[test]
    fn builder_pads_partial_rows() {
        let mut builder = DatasetBuilder::new(&["a", "b"]);
        builder.add_partial_row(&["x".into()]).unwrap();
        assert!(builder.add_row(&["x".into()]).is_err());
        let ds = builder.build().unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert_eq!(ds.column("b").unwrap().cells, vec![CellValue::Missing]);
    }

    #[test]
    fn empty_dataset() {
        let ds = Dataset::new(vec![]).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.num_respondents(), 0);
    }
}

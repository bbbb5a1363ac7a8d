// Primitives for reading Excel exports.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::poll::io_common::simplify_file_name;
use crate::poll::*;

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> BPollResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_responses: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match worksheet_name_o {
        Some(worksheet_name) => workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name,
                path,
            })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

fn header_name(idx: usize, cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => format!("Unnamed: {}", idx),
        x => x.to_string(),
    }
}

pub(crate) fn read_cell(cell: &DataType) -> CellValue {
    match cell {
        DataType::Empty => CellValue::Missing,
        DataType::String(s) if s.is_empty() => CellValue::Missing,
        DataType::String(s) => CellValue::Text(s.clone()),
        DataType::Float(f) => CellValue::Number(*f),
        DataType::Int(i) => CellValue::Number(*i as f64),
        DataType::Error(e) => {
            warn!("read_excel_responses: error cell {:?} read as missing", e);
            CellValue::Missing
        }
        x => CellValue::Text(x.to_string()),
    }
}

/// Reads the first worksheet (or the named one). The first row holds the
/// question texts; blank rows are skipped.
pub fn read_excel_responses(path: &str, worksheet_name_o: Option<&str>) -> BPollResult<Dataset> {
    let wrange = get_range(path, worksheet_name_o)?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path })?;
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(idx, cell))
        .collect();
    debug!("read_excel_responses: header: {:?}", names);

    let mut builder = DatasetBuilder::new(&names);
    for (idx, row) in iter.enumerate() {
        if row.iter().all(|c| *c == DataType::Empty) {
            debug!("read_excel_responses: idx: {:?} blank row", idx);
            continue;
        }
        let cells: Vec<CellValue> = row.iter().map(read_cell).collect();
        debug!("read_excel_responses: idx: {:?} row: {:?}", idx, cells);
        builder.add_partial_row(&cells).context(SurveySnafu {})?;
    }
    let dataset = builder.build().context(SurveySnafu {})?;
    info!(
        "read_excel_responses: {}: {} respondents",
        simplify_file_name(path),
        dataset.num_respondents()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Empty), CellValue::Missing);
        assert_eq!(read_cell(&DataType::String(String::new())), CellValue::Missing);
        assert_eq!(
            read_cell(&DataType::String("Tennis;Golf".to_string())),
            CellValue::Text("Tennis;Golf".to_string())
        );
        assert_eq!(read_cell(&DataType::Float(2022.5)), CellValue::Number(2022.5));
        assert_eq!(read_cell(&DataType::Int(2024)), CellValue::Number(2024.0));
        assert_eq!(
            read_cell(&DataType::Bool(true)),
            CellValue::Text("true".to_string())
        );
    }

    #[test]
    fn headers() {
        assert_eq!(header_name(0, &DataType::String("Class".to_string())), "Class");
        assert_eq!(header_name(3, &DataType::Empty), "Unnamed: 3");
        assert_eq!(header_name(1, &DataType::Int(7)), "7");
    }

    #[test]
    fn missing_file() {
        let err = read_excel_responses("/nonexistent/responses.xlsx", None).unwrap_err();
        assert!(matches!(*err, PollError::OpeningExcel { .. }));
    }
}

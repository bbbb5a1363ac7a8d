use std::path::Path;

use poll_tabulation::CellValue;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Interprets one text cell: empty is a missing answer, anything else is
/// kept exactly as typed. Numeric strata are parsed later by the weighting,
/// so answers such as `007` or `4.0` keep their spelling.
pub fn cell_from_text(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Missing
    } else {
        CellValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_cells() {
        assert_eq!(cell_from_text(""), CellValue::Missing);
        assert_eq!(cell_from_text("2022.5"), CellValue::Text("2022.5".to_string()));
        assert_eq!(cell_from_text("2022.5").as_number(), Some(2022.5));
        assert_eq!(cell_from_text("007"), CellValue::Text("007".to_string()));
        assert_eq!(cell_from_text("4.0").as_label(), Some("4.0".to_string()));
        assert_eq!(cell_from_text("Tennis;Golf"), CellValue::Text("Tennis;Golf".to_string()));
        assert_eq!(cell_from_text(" "), CellValue::Text(" ".to_string()));
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/poll/responses.csv"), "responses.csv");
        assert_eq!(simplify_file_name("responses.csv"), "responses.csv");
    }
}

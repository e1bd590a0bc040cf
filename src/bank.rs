//! Question bank import from CSV and Excel files

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use log::info;
#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::questions::{Level, SqlQuestion};

/// Parse a question file (Excel or CSV) for the given level
pub fn parse_file(file_path: &str, level: Level) -> Result<Vec<SqlQuestion>, String> {
    let path = Path::new(file_path);
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let questions = match extension.as_str() {
        "xlsx" | "xls" => parse_excel(file_path, level),
        "csv" => parse_csv(file_path, level),
        _ => Err(format!("Unsupported file format: .{}", extension)),
    }?;

    info!("imported {} questions for {} from {}", questions.len(), level, file_path);
    Ok(questions)
}

/// Column index mapping
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub id: Option<usize>,
    pub task: usize,
    pub answer: usize,
}

/// Detect column indices from header names
fn detect_columns(headers: &[String]) -> Result<ColumnMapping, String> {
    let mut id = None;
    let mut task = None;
    let mut answer = None;

    for (i, header) in headers.iter().enumerate() {
        match header.trim().to_lowercase().as_str() {
            "id" | "number" | "#" => id = Some(i),
            "task" | "question" | "prompt" => task = Some(i),
            "answer" | "solution" | "sql" => answer = Some(i),
            _ => {} // Unknown columns ignored
        }
    }

    let task = task.ok_or("Missing required 'Task' column in file header")?;
    let answer = answer.ok_or("Missing required 'Answer' column in file header")?;

    Ok(ColumnMapping { id, task, answer })
}

/// Build questions from header-mapped rows; ids default to the row number
fn rows_to_questions<I>(rows: I, mapping: &ColumnMapping, level: Level) -> Vec<SqlQuestion>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(n, row)| {
            let row_number = n as i64 + 1;
            let id = mapping.id
                .map(|i| cell(&row, i))
                .and_then(|s| parse_id(&s))
                .unwrap_or(row_number);
            let question = SqlQuestion::new(id, cell(&row, mapping.task), cell(&row, mapping.answer), level);
            question.is_playable().then_some(question)
        })
        .collect()
}

fn cell(row: &[String], i: usize) -> String {
    row.get(i).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .filter(|id| *id != 0)
}

/// Parse the first sheet of an Excel workbook
pub fn parse_excel(file_path: &str, level: Level) -> Result<Vec<SqlQuestion>, String> {
    let mut workbook = open_workbook_auto(file_path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_name = workbook.sheet_names().first()
        .ok_or("No sheets found in Excel file")?
        .clone();

    let range = workbook.worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet: {}", e))?;

    let mut rows = range.rows().map(|row| row.iter().map(get_cell_string).collect::<Vec<_>>());

    let headers = rows.next().ok_or("Empty file - no header row")?;
    let mapping = detect_columns(&headers)?;

    Ok(rows_to_questions(rows, &mapping, level))
}

/// Parse a CSV file with a header row
pub fn parse_csv(file_path: &str, level: Level) -> Result<Vec<SqlQuestion>, String> {
    let file = std::fs::File::open(file_path)
        .map_err(|e| format!("Failed to open CSV file: {}", e))?;
    parse_csv_reader(file, level)
}

pub fn parse_csv_reader<R: Read>(source: R, level: Level) -> Result<Vec<SqlQuestion>, String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()
        .map_err(|e| format!("Failed to read CSV headers: {}", e))?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mapping = detect_columns(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("Failed to read CSV row: {}", e))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(rows_to_questions(rows, &mapping, level))
}

/// Helper to extract string from Excel cell
fn get_cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
        Data::Empty => String::new(),
    }
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "parse_question_file")]
pub fn py_parse_question_file(file_path: &str, level: Option<u8>) -> PyResult<Vec<SqlQuestion>> {
    let level = Level::from_number(level.unwrap_or(1))
        .ok_or_else(|| pyo3::exceptions::PyValueError::new_err("Unknown level"))?;
    parse_file(file_path, level)
        .map_err(pyo3::exceptions::PyRuntimeError::new_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_aliased_headers() {
        let data = "Number,Question,SQL,Notes\n\
                    3,List users,SELECT * FROM users,easy\n\
                    ,Adults,\"SELECT name, age FROM users WHERE age > 18\",\n\
                    5,No answer,,\n";
        let questions = parse_csv_reader(data.as_bytes(), Level::Two).unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0], SqlQuestion::new(3, "List users", "SELECT * FROM users", Level::Two));
        // missing id falls back to the row number
        assert_eq!(questions[1].id, 2);
        assert_eq!(questions[1].answer, "SELECT name, age FROM users WHERE age > 18");
    }

    #[test]
    fn csv_without_answer_column_is_rejected() {
        let err = parse_csv_reader("task,notes\nx,y\n".as_bytes(), Level::One).unwrap_err();
        assert!(err.contains("Answer"));
    }

    #[test]
    fn header_detection() {
        let headers: Vec<String> = ["ID", " Prompt ", "Solution"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            detect_columns(&headers).unwrap(),
            ColumnMapping { id: Some(0), task: 1, answer: 2 }
        );
    }

    #[test]
    fn float_ids_from_spreadsheets() {
        assert_eq!(parse_id("4"), Some(4));
        assert_eq!(parse_id("4.0"), Some(4));
        assert_eq!(parse_id("4.5"), None);
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("abc"), None);
    }

    #[test]
    fn unsupported_extension() {
        let err = parse_file("questions.pdf", Level::One).unwrap_err();
        assert_eq!(err, "Unsupported file format: .pdf");
    }
}

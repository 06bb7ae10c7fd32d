// src/import.rs

//! Reading question banks uploaded as spreadsheets.
//!
//! The first worksheet of an `.xlsx` workbook is read as a grid of cells with
//! the header row first. Columns are found by header name (`question`,
//! `option_a`..`option_d`, `correct`), case-insensitively, so their order in
//! the sheet does not matter.

use std::{io::Cursor, sync::LazyLock};

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use regex::Regex;
use serde_json::Value;

use crate::error::AppError;

pub const QUESTION_COLUMN: &str = "question";
pub const OPTION_COLUMNS: [&str; 4] = ["option_a", "option_b", "option_c", "option_d"];
pub const CORRECT_COLUMN: &str = "correct";

static CORRECT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:option_)?([1-4a-d])$").expect("correct marker pattern is valid")
});

/// One question read from a sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedQuestion {
    pub text: String,
    pub options: [String; 4],
    pub correct_option: String,
}

/// Spreadsheet cells come through as JSON scalars; whole numbers read back
/// without a fractional part.
fn cell_text(cell: Option<&Option<Value>>) -> String {
    match cell.and_then(Option::as_ref) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        other => Some(Value::String(other.to_string())),
    }
}

/// Reads the first worksheet of an uploaded workbook into rows of cells.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<Option<Value>>>, AppError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::ImportFailed(format!("not an xlsx workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(AppError::ImportFailed("workbook has no sheets".to_string()))?
        .map_err(|e| AppError::ImportFailed(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

/// Maps `1`..`4`, `a`..`d` or `option_a`..`option_d` to "1".."4".
pub fn normalize_correct(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let caps = CORRECT_MARKER.captures(&lowered)?;
    let marker = caps.get(1)?.as_str();

    let digit = match marker {
        "a" => "1",
        "b" => "2",
        "c" => "3",
        "d" => "4",
        digit => digit,
    };
    Some(digit.to_string())
}

/// Parses the whole sheet. Any malformed row fails the import so that
/// nothing from a bad file is committed.
pub fn parse_sheet(rows: &[Vec<Option<Value>>]) -> Result<Vec<ImportedQuestion>, AppError> {
    let (header, body) = rows
        .split_first()
        .ok_or(AppError::ImportFailed("sheet is empty".to_string()))?;

    let headers: Vec<String> = header
        .iter()
        .map(|cell| cell_text(Some(cell)).to_lowercase())
        .collect();

    let column = |name: &str| -> Result<usize, AppError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(AppError::ImportFailed(format!("column '{name}' not found")))
    };

    let question_idx = column(QUESTION_COLUMN)?;
    let option_idx = [
        column(OPTION_COLUMNS[0])?,
        column(OPTION_COLUMNS[1])?,
        column(OPTION_COLUMNS[2])?,
        column(OPTION_COLUMNS[3])?,
    ];
    let correct_idx = column(CORRECT_COLUMN)?;

    let mut questions = Vec::new();
    for (line, row) in body.iter().enumerate() {
        let text = cell_text(row.get(question_idx));
        if text.is_empty() {
            continue;
        }

        let raw_correct = cell_text(row.get(correct_idx));
        let correct_option = normalize_correct(&raw_correct).ok_or(AppError::ImportFailed(
            format!("row {}: invalid correct option '{}'", line + 2, raw_correct),
        ))?;

        questions.push(ImportedQuestion {
            text,
            options: option_idx.map(|idx| cell_text(row.get(idx))),
            correct_option,
        });
    }

    Ok(questions)
}

// src/services/transform.rs

//! Turns raw spreadsheet rows into validated [`Question`] records.
//!
//! Expected columns: question, four option cells, correct answer
//! (index or option text), weightage (number or difficulty label).

use serde_json::Value;
use validator::Validate;

use crate::models::question::Question;
use crate::sheets::Row;

const MIN_CELLS: usize = 6;
const OPTION_COLUMNS: std::ops::Range<usize> = 1..5;
const ANSWER_COLUMN: usize = 5;
const WEIGHTAGE_COLUMN: usize = 6;

pub const DEFAULT_WEIGHTAGE: i64 = 10;

/// Converts rows into questions, dropping every row that does not yield a
/// complete, valid record. Ids follow row position, not output position.
pub fn transform(rows: &[Row]) -> Vec<Question> {
    let data = match rows.first() {
        Some(first) if is_header(first) => &rows[1..],
        _ => rows,
    };

    data.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let id = (index + 1) as u32;
            match parse_row(id, row) {
                Ok(question) => Some(question),
                Err(reason) => {
                    tracing::debug!("Skipping question row {}: {}", id, reason);
                    None
                }
            }
        })
        .collect()
}

fn is_header(row: &Row) -> bool {
    row.first()
        .map(|cell| cell_text(Some(cell)).to_lowercase().contains("question"))
        .unwrap_or(false)
}

fn parse_row(id: u32, row: &Row) -> Result<Question, String> {
    if row.len() < MIN_CELLS {
        return Err(format!("expected at least {} cells, got {}", MIN_CELLS, row.len()));
    }

    let question = cell_text(row.first());

    let options: Vec<String> = OPTION_COLUMNS
        .map(|i| cell_text(row.get(i)))
        .filter(|o| !o.is_empty())
        .collect();

    let correct_answer = resolve_correct_answer(&cell_text(row.get(ANSWER_COLUMN)), &options)
        .ok_or_else(|| "negative answer index".to_string())?;

    let weightage = resolve_weightage(&cell_text(row.get(WEIGHTAGE_COLUMN)));
    let weightage = u32::try_from(weightage)
        .map_err(|_| format!("weightage {} out of range", weightage))?;

    let record = Question {
        id,
        question,
        options,
        correct_answer,
        weightage,
    };
    record.validate().map_err(|e| e.to_string())?;
    Ok(record)
}

/// Index literal, or case-insensitive match against the options.
/// Text that matches nothing falls back to the first option.
fn resolve_correct_answer(cell: &str, options: &[String]) -> Option<usize> {
    if let Ok(index) = cell.parse::<i64>() {
        return usize::try_from(index).ok();
    }

    let wanted = cell.to_lowercase();
    Some(
        options
            .iter()
            .position(|o| o.to_lowercase() == wanted)
            .unwrap_or(0),
    )
}

/// Literal number, else difficulty label, else the default.
fn resolve_weightage(cell: &str) -> i64 {
    if let Ok(value) = cell.parse::<i64>() {
        return value;
    }

    match cell.to_lowercase().as_str() {
        "easy" => 5,
        "medium" => 10,
        "hard" => 20,
        _ => DEFAULT_WEIGHTAGE,
    }
}

/// Trimmed text of a cell. Integral numbers render without a fraction so
/// that unformatted reads (`1.0`) behave like formatted ones (`"1"`).
fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

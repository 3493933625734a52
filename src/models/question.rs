// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A multiple-choice question served to quiz clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_correct_answer))]
pub struct Question {
    /// Position of the source row after the header, starting at 1.
    pub id: u32,

    #[validate(length(min = 1))]
    pub question: String,

    #[validate(length(min = 2, max = 4))]
    pub options: Vec<String>,

    /// Zero-based index into `options`.
    pub correct_answer: usize,

    #[validate(range(min = 1))]
    pub weightage: u32,
}

fn validate_correct_answer(question: &Question) -> Result<(), validator::ValidationError> {
    if question.correct_answer >= question.options.len() {
        return Err(validator::ValidationError::new("correct_answer_out_of_range"));
    }
    Ok(())
}

/// Per-weightage counts reported by `GET /questions/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightageBreakdown {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    /// Questions whose weightage is a literal number outside 5/10/20.
    pub other: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    pub total: usize,
    pub by_weightage: WeightageBreakdown,
    pub last_refresh: Option<chrono::DateTime<chrono::Utc>>,
}

// src/models/submission.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Quiz result posted by a client. Every field is optional and loosely
/// typed: numbers may arrive as JSON numbers or numeric strings, and
/// missing or unusable values are filled in when the row is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    pub timestamp: Option<Value>,
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub score: Option<Value>,
    pub total_questions: Option<Value>,
    pub correct_answers: Option<Value>,
    pub percentage: Option<Value>,
    /// Answer sheet as sent by the client; stored as JSON text.
    pub answers: Option<Value>,
}

impl Submission {
    /// Accepts any JSON document. Non-object bodies carry no fields and
    /// yield an all-default submission.
    pub fn from_json(body: Value) -> Self {
        if !body.is_object() {
            tracing::warn!("Submission body is not a JSON object; recording defaults");
            return Self::default();
        }
        serde_json::from_value(body).unwrap_or_default()
    }

    pub fn display_name(&self) -> String {
        text(&self.name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string())
    }

    /// Builds the row appended to the results sheet.
    ///
    /// Column order: timestamp, name, email, score, totalQuestions,
    /// correctAnswers, percentage, answers.
    pub fn to_row(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<Value> {
        let timestamp = text(&self.timestamp)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true));
        let email = text(&self.email).unwrap_or_default();
        let answers = self
            .answers
            .as_ref()
            .filter(|a| !a.is_null())
            .map(|a| a.to_string())
            .unwrap_or_else(|| "[]".to_string());

        vec![
            timestamp.into(),
            self.display_name().into(),
            email.into(),
            number(&self.score),
            number(&self.total_questions),
            number(&self.correct_answers),
            number(&self.percentage),
            answers.into(),
        ]
    }
}

/// Trimmed text of a scalar; `None` for null, arrays and objects.
fn text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers pass through, numeric strings are converted, anything else is 0.
fn number(value: &Option<Value>) -> Value {
    match value {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return i.into();
            }
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| 0.into())
        }
        _ => 0.into(),
    }
}

/// Outcome of recording a submission. Recording never fails the request;
/// a write that did not reach the spreadsheet is reported through `warning`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Ack {
    pub fn persisted() -> Self {
        Self {
            persisted: true,
            warning: None,
        }
    }

    pub fn not_persisted(warning: impl Into<String>) -> Self {
        Self {
            persisted: false,
            warning: Some(warning.into()),
        }
    }
}

use serde_json::json;
use thiserror::Error;

use crate::calc::Term;

/// Failures of a single grade computation. Nothing here is retried: the
/// calculator is deterministic, so the same input reproduces the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("invalid grading schema: {message}")]
    InvalidSchema { message: String, sum: Option<f64> },

    #[error("invalid score for {component}: {value}")]
    InvalidScore { component: &'static str, value: f64 },

    #[error("grade is incomplete: {}", describe_missing(.missing))]
    IncompleteGrade { missing: Vec<Term> },

    #[error("numeric grade out of range: {value}")]
    OutOfRange { value: f64 },
}

fn describe_missing(missing: &[Term]) -> String {
    let names: Vec<&str> = missing.iter().map(|t| t.as_str()).collect();
    format!("missing {}", names.join(", "))
}

impl GradeError {
    pub fn invalid_schema(message: impl Into<String>, sum: Option<f64>) -> Self {
        GradeError::InvalidSchema {
            message: message.into(),
            sum,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GradeError::InvalidSchema { .. } => "invalid_schema",
            GradeError::InvalidScore { .. } => "invalid_score",
            GradeError::IncompleteGrade { .. } => "incomplete_grade",
            GradeError::OutOfRange { .. } => "out_of_range",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            GradeError::InvalidSchema { sum: Some(s), .. } => Some(json!({ "sum": s })),
            GradeError::InvalidSchema { sum: None, .. } => None,
            GradeError::InvalidScore { component, value } => Some(json!({
                "component": component,
                "value": value,
            })),
            GradeError::IncompleteGrade { missing } => Some(json!({
                "missingTerms": missing.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                "remarks": "Incomplete",
            })),
            GradeError::OutOfRange { value } => Some(json!({ "value": value })),
        }
    }
}

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calc::{
    compute_grade_record, ComponentScoreSet, GradeRecord, GradingSchema, RecordStatus,
    TermWeights,
};
use crate::scale::GradeScale;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub student_id: String,
    #[serde(default)]
    pub midterm: Option<ComponentScoreSet>,
    #[serde(default)]
    pub final_term: Option<ComponentScoreSet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub student_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<GradeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchFailure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub unrecorded: usize,
    pub failed: usize,
}

fn recalculate_one(
    schema: &GradingSchema,
    entry: &BatchEntry,
    term_weights: &TermWeights,
    scale: &GradeScale,
) -> BatchOutcome {
    match compute_grade_record(
        schema,
        entry.midterm.as_ref(),
        entry.final_term.as_ref(),
        term_weights,
        scale,
    ) {
        Ok(record) => BatchOutcome {
            student_id: entry.student_id.clone(),
            ok: true,
            record: Some(record),
            error: None,
        },
        Err(e) => BatchOutcome {
            student_id: entry.student_id.clone(),
            ok: false,
            record: None,
            error: Some(BatchFailure {
                code: e.code(),
                message: e.to_string(),
                details: e.details(),
            }),
        },
    }
}

/// Recomputes every entry independently. A failing entry is reported in its
/// own outcome and never affects the others; output order matches input.
pub fn recalculate_batch(
    schema: &GradingSchema,
    entries: &[BatchEntry],
    term_weights: &TermWeights,
    scale: &GradeScale,
) -> (Vec<BatchOutcome>, BatchSummary) {
    let outcomes: Vec<BatchOutcome> = entries
        .par_iter()
        .map(|e| recalculate_one(schema, e, term_weights, scale))
        .collect();

    let mut summary = BatchSummary {
        total: outcomes.len(),
        ..BatchSummary::default()
    };
    for o in &outcomes {
        match o.record.as_ref().map(|r| r.status()) {
            Some(RecordStatus::Complete) => summary.complete += 1,
            Some(RecordStatus::Partial) => summary.partial += 1,
            Some(RecordStatus::Unrecorded) => summary.unrecorded += 1,
            None => summary.failed += 1,
        }
    }

    tracing::info!(
        total = summary.total,
        complete = summary.complete,
        partial = summary.partial,
        unrecorded = summary.unrecorded,
        failed = summary.failed,
        scale = scale.version,
        "batch recalculated"
    );
    (outcomes, summary)
}

use crate::batch::{recalculate_batch, BatchEntry};
use crate::calc::{
    compute_final_grade, compute_grade_record, compute_term_grade, map_to_equivalent,
    ComponentScoreSet, GradingSchema, TermWeights,
};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{optional_param, required_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const BATCH_MAX_ENTRIES: usize = 10_000;

fn respond(req: &Request, out: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match out {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

fn term_weights(state: &AppState, req: &Request) -> Result<TermWeights, HandlerErr> {
    Ok(optional_param(&req.params, "termWeights")?.unwrap_or(state.policy.term_weights))
}

fn compute_term(req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let schema: GradingSchema = required_param(&req.params, "schema")?;
    let scores: ComponentScoreSet = required_param(&req.params, "scores")?;
    let term_grade = compute_term_grade(&scores, &schema)?;
    Ok(json!({ "termGrade": term_grade }))
}

fn compute_final(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let midterm: Option<f64> = optional_param(&req.params, "midtermGrade")?;
    let final_term: Option<f64> = optional_param(&req.params, "finalTermGrade")?;
    let weights = term_weights(state, req)?;
    let final_grade = compute_final_grade(midterm, final_term, &weights)?;
    Ok(json!({ "finalGradeNumeric": final_grade }))
}

fn map_equivalent(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let numeric: f64 = required_param(&req.params, "numericGrade")?;
    let eq = map_to_equivalent(numeric, state.scale)?;
    Ok(json!({
        "equivalentGrade": eq.equivalent_grade,
        "remarks": eq.remarks,
        "scaleVersion": state.scale.version,
    }))
}

fn compute_record(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let schema: GradingSchema = required_param(&req.params, "schema")?;
    let midterm: Option<ComponentScoreSet> = optional_param(&req.params, "midterm")?;
    let final_term: Option<ComponentScoreSet> = optional_param(&req.params, "finalTerm")?;
    let weights = term_weights(state, req)?;
    let record = compute_grade_record(
        &schema,
        midterm.as_ref(),
        final_term.as_ref(),
        &weights,
        state.scale,
    )?;
    Ok(json!({ "record": record }))
}

fn recalculate(state: &AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let schema: GradingSchema = required_param(&req.params, "schema")?;
    let entries: Vec<BatchEntry> = required_param(&req.params, "entries")?;
    if entries.len() > BATCH_MAX_ENTRIES {
        return Err(HandlerErr {
            code: "bad_params",
            message: format!("entries exceeds limit of {}", BATCH_MAX_ENTRIES),
            details: Some(json!({ "count": entries.len(), "limit": BATCH_MAX_ENTRIES })),
        });
    }
    let weights = term_weights(state, req)?;
    let (outcomes, summary) = recalculate_batch(&schema, &entries, &weights, state.scale);
    Ok(json!({
        "outcomes": outcomes,
        "summary": summary,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "grades.computeTerm" => compute_term(req),
        "grades.computeFinal" => compute_final(state, req),
        "grades.mapEquivalent" => map_equivalent(state, req),
        "grades.computeRecord" => compute_record(state, req),
        "grades.recalculateBatch" => recalculate(state, req),
        _ => return None,
    };
    Some(respond(req, out))
}

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::scale::GradeScale;
use serde_json::json;

fn handle_scale_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scale = match req.params.get("version").and_then(|v| v.as_str()) {
        None => state.scale,
        Some(v) => match GradeScale::by_version(v) {
            Ok(s) => s,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
    };
    let available: Vec<&str> = GradeScale::built_in().iter().map(|s| s.version).collect();

    ok(
        &req.id,
        json!({
            "version": scale.version,
            "fingerprint": scale.fingerprint(),
            "passingEquivalent": scale.passing_equivalent,
            "bands": scale.bands,
            "active": scale.version == state.scale.version,
            "available": available,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scale.get" => Some(handle_scale_get(state, req)),
        _ => None,
    }
}

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "scaleVersion": state.scale.version,
            "policyPath": state.policy_path.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_policy_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match state.select_policy(&path) {
        Ok(()) => {
            tracing::info!(
                path = %path.to_string_lossy(),
                scale = state.scale.version,
                "policy selected"
            );
            ok(&req.id, json!({ "policy": state.policy }))
        }
        Err(e) => {
            tracing::warn!(path = %path.to_string_lossy(), error = %format!("{e:#}"), "policy rejected");
            err(&req.id, "policy_load_failed", format!("{e:#}"), None)
        }
    }
}

fn handle_policy_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "policy": state.policy,
            "policyPath": state.policy_path.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "policy.select" => Some(handle_policy_select(state, req)),
        "policy.get" => Some(handle_policy_get(state, req)),
        _ => None,
    }
}

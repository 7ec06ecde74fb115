mod batch;
mod calc;
mod error;
mod ipc;
mod policy;
mod scale;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::policy::{Policy, POLICY_ENV};
use crate::scale::STD_5PT_V1;

// stdout carries responses, so logs go to stderr.
fn init_logger() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("GRADINGD_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .init();
}

fn initial_state() -> ipc::AppState {
    let mut state = ipc::AppState::new(Policy::default(), &STD_5PT_V1);

    // Best-effort: a bad policy file must not keep the process from starting.
    if let Some(path) = std::env::var_os(POLICY_ENV).map(PathBuf::from) {
        match state.select_policy(&path) {
            Ok(()) => tracing::info!(
                path = %path.to_string_lossy(),
                scale = state.scale.version,
                "policy loaded"
            ),
            Err(e) => tracing::warn!(
                path = %path.to_string_lossy(),
                error = %format!("{e:#}"),
                "policy load failed; using defaults"
            ),
        }
    }
    state
}

fn main() {
    init_logger();
    let mut state = initial_state();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}

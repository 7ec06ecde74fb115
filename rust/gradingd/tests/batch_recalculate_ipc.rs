use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradingd");
    let mut child = Command::new(exe)
        .env_remove("GRADINGD_POLICY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradingd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn batch_isolates_failures_and_keeps_order() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.recalculateBatch",
        json!({
            "schema": { "classStanding": 60, "laboratory": 0, "majorOutput": 40, "hasLaboratory": false },
            "entries": [
                {
                    "studentId": "stu-a",
                    "midterm": { "classStanding": 90, "majorOutput": 95 },
                    "finalTerm": { "classStanding": 88, "majorOutput": 92 }
                },
                {
                    "studentId": "stu-b",
                    "midterm": { "classStanding": 180, "majorOutput": 95 },
                    "finalTerm": { "classStanding": 88, "majorOutput": 92 }
                },
                {
                    "studentId": "stu-c",
                    "midterm": { "classStanding": 70, "majorOutput": 72 }
                },
                { "studentId": "stu-d" },
                {
                    "studentId": "stu-e",
                    "midterm": { "classStanding": 60, "laboratory": 100, "majorOutput": 65 },
                    "finalTerm": { "classStanding": 70, "laboratory": 100, "majorOutput": 68 }
                }
            ]
        }),
    );

    let outcomes = res["outcomes"].as_array().cloned().unwrap_or_default();
    let ids: Vec<&str> = outcomes
        .iter()
        .map(|o| o["studentId"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(ids, vec!["stu-a", "stu-b", "stu-c", "stu-d", "stu-e"]);

    // a: mid 54 + 38 = 92, fin 52.8 + 36.8 = 89.6, final 90.8
    assert_eq!(outcomes[0]["ok"], true);
    assert_eq!(outcomes[0]["record"]["finalGradeNumeric"], 90.8);
    assert_eq!(outcomes[0]["record"]["equivalentGrade"], 1.75);
    assert_eq!(outcomes[0]["record"]["hasLaboratory"], false);

    assert_eq!(outcomes[1]["ok"], false);
    assert_eq!(outcomes[1]["error"]["code"], "invalid_score");
    assert!(outcomes[1].get("record").is_none());

    assert_eq!(outcomes[2]["record"]["status"], "partial");
    assert_eq!(outcomes[2]["record"]["remarks"], "Incomplete");
    assert_eq!(outcomes[3]["record"]["status"], "unrecorded");

    // e: mid 36 + 26 = 62, fin 42 + 27.2 = 69.2, final 65.6; lab ignored
    assert_eq!(outcomes[4]["record"]["finalGradeNumeric"], 65.6);
    assert_eq!(outcomes[4]["record"]["finalGrade"], "5.00");
    assert_eq!(outcomes[4]["record"]["remarks"], "Failed");

    assert_eq!(
        res["summary"],
        json!({ "total": 5, "complete": 2, "partial": 1, "unrecorded": 1, "failed": 1 })
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn batch_honours_explicit_term_weights() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.recalculateBatch",
        json!({
            "schema": { "classStanding": 100, "laboratory": 0, "majorOutput": 0 },
            "termWeights": { "midterm": 30, "finalTerm": 70 },
            "entries": [
                {
                    "studentId": "x",
                    "midterm": { "classStanding": 70 },
                    "finalTerm": { "classStanding": 90 }
                }
            ]
        }),
    );
    assert_eq!(res["outcomes"][0]["record"]["finalGradeNumeric"], 84.0);

    let bad = request(
        &mut stdin,
        &mut reader,
        "2",
        "grades.recalculateBatch",
        json!({
            "schema": { "classStanding": 100, "laboratory": 0, "majorOutput": 0 },
            "termWeights": { "midterm": 30, "finalTerm": 60 },
            "entries": [ { "studentId": "x" } ]
        }),
    );
    assert_eq!(bad["ok"], true);
    assert_eq!(bad["result"]["outcomes"][0]["error"]["code"], "invalid_schema");

    let bad = request(
        &mut stdin,
        &mut reader,
        "3",
        "grades.recalculateBatch",
        json!({ "schema": { "classStanding": 100, "laboratory": 0, "majorOutput": 0 } }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

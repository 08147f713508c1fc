use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_studyd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn studyd");
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
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
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

/// Three weeks, three assignment policies: open until 2030, past-due but
/// accepting late work at a 10% penalty, and past-due with late work
/// rejected. Returns the assignment ids keyed by week order.
fn setup(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) -> (String, String, String) {
    let _ = request_ok(
        stdin,
        reader,
        "setup-1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "setup-2",
        "catalog.load",
        json!({ "course": {
            "slug": "projects",
            "title": "Project Course",
            "durationWeeks": 3,
            "weeks": [
                {
                    "weekNumber": 1,
                    "title": "Open",
                    "assignment": {
                        "title": "Open project",
                        "dueDate": "2030-01-01T00:00:00Z",
                        "maxScore": 100.0,
                        "passingScore": 60.0
                    }
                },
                {
                    "weekNumber": 2,
                    "title": "Late allowed",
                    "assignment": {
                        "title": "Late-friendly project",
                        "dueDate": "2020-01-01T00:00:00Z",
                        "maxScore": 100.0,
                        "passingScore": 60.0,
                        "allowLate": true,
                        "latePenalty": 10.0
                    }
                },
                {
                    "weekNumber": 3,
                    "title": "Strict",
                    "assignment": {
                        "title": "Strict project",
                        "dueDate": "2020-01-01T00:00:00Z",
                        "maxScore": 100.0,
                        "passingScore": 60.0,
                        "allowLate": false
                    }
                }
            ]
        }}),
    );

    let db = rusqlite::Connection::open(workspace.join("studyd.sqlite3")).expect("open db");
    let mut stmt = db
        .prepare(
            "SELECT a.id FROM assignments a JOIN weeks w ON w.id = a.week_id
             ORDER BY w.week_number",
        )
        .expect("stmt");
    let ids: Vec<String> = stmt
        .query_map([], |r| r.get(0))
        .expect("rows")
        .collect::<Result<Vec<_>, _>>()
        .expect("ids");
    assert_eq!(ids.len(), 3);
    (ids[0].clone(), ids[1].clone(), ids[2].clone())
}

#[test]
fn on_time_submissions_pass_or_fail_on_the_raw_score() {
    let workspace = temp_dir("studyd-assign-ontime");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (open_id, _, _) = setup(&mut stdin, &mut reader, &workspace);

    let passing = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "assignments.submit",
        json!({
            "studentId": "s1",
            "assignmentId": open_id,
            "content": "my project",
            "score": 80.0
        }),
    );
    let sub = passing.get("submission").expect("submission");
    assert_eq!(sub.get("status").and_then(|v| v.as_str()), Some("PASSED"));
    assert_eq!(sub.get("score").and_then(|v| v.as_f64()), Some(80.0));
    assert_eq!(sub.get("percentage").and_then(|v| v.as_f64()), Some(80.0));
    assert_eq!(sub.get("isLate").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(sub.get("attemptNumber").and_then(|v| v.as_i64()), Some(1));

    let failing = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.submit",
        json!({
            "studentId": "s1",
            "assignmentId": open_id,
            "content": "second try, worse",
            "score": 50.0
        }),
    );
    let sub2 = failing.get("submission").expect("submission");
    assert_eq!(sub2.get("status").and_then(|v| v.as_str()), Some("FAILED"));
    assert_eq!(sub2.get("attemptNumber").and_then(|v| v.as_i64()), Some(2));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn late_submission_takes_the_penalty_before_the_pass_decision() {
    let workspace = temp_dir("studyd-assign-late");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (_, late_ok_id, _) = setup(&mut stdin, &mut reader, &workspace);

    // 80 minus the 10% penalty is 72: still above the 60 bar.
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "assignments.submit",
        json!({
            "studentId": "s1",
            "assignmentId": late_ok_id,
            "content": "late but done",
            "score": 80.0
        }),
    );
    let sub = res.get("submission").expect("submission");
    assert_eq!(sub.get("status").and_then(|v| v.as_str()), Some("PASSED"));
    assert_eq!(sub.get("isLate").and_then(|v| v.as_bool()), Some(true));
    let score = sub.get("score").and_then(|v| v.as_f64()).expect("score");
    assert!((score - 72.0).abs() < 1e-9, "penalized score was {}", score);

    // 65 shrinks to 58.5 and drops below the bar.
    let res2 = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.submit",
        json!({
            "studentId": "s1",
            "assignmentId": late_ok_id,
            "content": "late and borderline",
            "score": 65.0
        }),
    );
    let sub2 = res2.get("submission").expect("submission");
    assert_eq!(sub2.get("status").and_then(|v| v.as_str()), Some("FAILED"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn late_submission_is_rejected_when_late_work_is_not_accepted() {
    let workspace = temp_dir("studyd-assign-strict");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (_, _, strict_id) = setup(&mut stdin, &mut reader, &workspace);

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "assignments.submit",
        json!({
            "studentId": "s1",
            "assignmentId": strict_id,
            "content": "too late",
            "score": 95.0
        }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.pointer("/error/code").and_then(|v| v.as_str()),
        Some("validation")
    );

    // Nothing was recorded for the rejected attempt.
    let db = rusqlite::Connection::open(workspace.join("studyd.sqlite3")).expect("open db");
    let n: i64 = db
        .query_row("SELECT COUNT(*) FROM assignment_submissions", [], |r| {
            r.get(0)
        })
        .expect("count");
    assert_eq!(n, 0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn out_of_range_scores_are_rejected() {
    let workspace = temp_dir("studyd-assign-range");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let (open_id, _, _) = setup(&mut stdin, &mut reader, &workspace);

    for (id, score) in [("1", -5.0), ("2", 120.0)] {
        let resp = request(
            &mut stdin,
            &mut reader,
            id,
            "assignments.submit",
            json!({
                "studentId": "s1",
                "assignmentId": open_id,
                "content": "x",
                "score": score
            }),
        );
        assert_eq!(
            resp.pointer("/error/code").and_then(|v| v.as_str()),
            Some("validation"),
            "score {} must be rejected",
            score
        );
    }

    drop(stdin);
    let _ = child.wait();
}

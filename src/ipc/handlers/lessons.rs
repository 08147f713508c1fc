use super::{db_conn, required_str};
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::progress;
use serde_json::json;

fn handle_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match progress::start_lesson(conn, &student_id, &lesson_id) {
        Ok(p) => ok(
            &req.id,
            json!({ "progress": serde_json::to_value(p).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_complete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lesson_id = match required_str(req, "lessonId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let time_spent = req
        .params
        .get("timeSpent")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    if time_spent < 0 {
        return err(&req.id, "bad_params", "timeSpent must be >= 0", None);
    }

    match progress::complete_lesson(conn, &student_id, &lesson_id, time_spent) {
        Ok(p) => ok(
            &req.id,
            json!({ "progress": serde_json::to_value(p).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "lessons.start" => Some(handle_start(state, req)),
        "lessons.complete" => Some(handle_complete(state, req)),
        _ => None,
    }
}

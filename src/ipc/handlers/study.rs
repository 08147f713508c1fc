use super::{db_conn, required_str};
use crate::ipc::error::{core_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::progress;
use serde_json::json;

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match progress::study_overview(conn, &student_id) {
        Ok(overview) => ok(
            &req.id,
            serde_json::to_value(overview).unwrap_or_else(|_| json!({})),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_recalculate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match required_str(req, "courseId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match progress::recalculate(conn, &student_id, &course_id) {
        Ok(model) => ok(
            &req.id,
            json!({ "progress": serde_json::to_value(model).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "study.overview" => Some(handle_overview(state, req)),
        "progress.recalculate" => Some(handle_recalculate(state, req)),
        _ => None,
    }
}

use super::{db_conn, required_str};
use crate::enrollments;
use crate::ipc::error::{core_err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_enroll(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_slug = match required_str(req, "courseSlug") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match enrollments::enroll(conn, &student_id, &course_slug) {
        Ok(e) => ok(
            &req.id,
            json!({ "enrollment": serde_json::to_value(e).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_deactivate(state: &mut AppState, req: &Request) -> serde_json::Value {
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

    match enrollments::deactivate(conn, &student_id, &course_id) {
        Ok(e) => ok(
            &req.id,
            json!({ "enrollment": serde_json::to_value(e).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "enrollments.enroll" => Some(handle_enroll(state, req)),
        "enrollments.deactivate" => Some(handle_deactivate(state, req)),
        _ => None,
    }
}

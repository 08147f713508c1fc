use super::{db_conn, required_str};
use crate::grading;
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_task_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let task_id = match required_str(req, "taskId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let content = match required_str(req, "content") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let is_draft = req
        .params
        .get("isDraft")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match grading::submit_task(conn, &student_id, &task_id, &content, is_draft) {
        Ok(sub) => ok(
            &req.id,
            json!({ "submission": serde_json::to_value(sub).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_task_ai_grade(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let task_id = match required_str(req, "taskId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let content = match required_str(req, "content") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match grading::ai_grade_task(conn, &state.gateway, &student_id, &task_id, &content) {
        Ok(sub) => ok(
            &req.id,
            json!({ "submission": serde_json::to_value(sub).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_assignment_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let assignment_id = match required_str(req, "assignmentId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let content = match required_str(req, "content") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(score) = req.params.get("score").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "missing score", None);
    };

    match grading::submit_assignment(conn, &student_id, &assignment_id, &content, score) {
        Ok(sub) => ok(
            &req.id,
            json!({ "submission": serde_json::to_value(sub).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tasks.submit" => Some(handle_task_submit(state, req)),
        "tasks.aiGrade" => Some(handle_task_ai_grade(state, req)),
        "assignments.submit" => Some(handle_assignment_submit(state, req)),
        _ => None,
    }
}

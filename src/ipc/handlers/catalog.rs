use super::{db_conn, required_str};
use crate::catalog::{self, CourseInput};
use crate::ipc::error::{core_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("course") else {
        return err(&req.id, "bad_params", "missing params.course", None);
    };
    let input: CourseInput = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "validation",
                format!("course tree: {}", e),
                None,
            )
        }
    };

    match catalog::load_course(conn, &input) {
        Ok(course_id) => ok(&req.id, json!({ "courseId": course_id })),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_courses(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match catalog::list_courses(conn) {
        Ok(courses) => ok(
            &req.id,
            json!({ "courses": serde_json::to_value(courses).unwrap_or_default() }),
        ),
        Err(e) => core_err(&req.id, &e),
    }
}

fn handle_course_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let slug = match required_str(req, "slug") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let course_id = match catalog::course_id_by_slug(conn, &slug) {
        Ok(Some(id)) => id,
        Ok(None) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return core_err(&req.id, &e),
    };
    let summary = match catalog::course_summary(conn, &course_id) {
        Ok(s) => s,
        Err(e) => return core_err(&req.id, &e),
    };
    let lessons = match catalog::ordered_lessons(conn, &course_id) {
        Ok(l) => l,
        Err(e) => return core_err(&req.id, &e),
    };
    ok(
        &req.id,
        json!({
            "course": serde_json::to_value(summary).unwrap_or_default(),
            "lessons": serde_json::to_value(lessons).unwrap_or_default(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "catalog.load" => Some(handle_load(state, req)),
        "catalog.courses" => Some(handle_courses(state, req)),
        "catalog.course" => Some(handle_course_open(state, req)),
        _ => None,
    }
}

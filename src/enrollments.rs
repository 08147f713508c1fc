use crate::catalog;
use crate::error::CoreError;
use crate::progress;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub current_week_number: i64,
    pub progress_percent: f64,
    pub is_active: bool,
    pub enrolled_at: String,
}

fn load_enrollment(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
) -> Result<EnrollmentView, CoreError> {
    conn.query_row(
        "SELECT id, current_week_number, progress_percent, is_active, enrolled_at
         FROM enrollments WHERE student_id = ? AND course_id = ?",
        (student_id, course_id),
        |r| {
            Ok(EnrollmentView {
                id: r.get(0)?,
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
                current_week_number: r.get(1)?,
                progress_percent: r.get(2)?,
                is_active: r.get::<_, i64>(3)? != 0,
                enrolled_at: r.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("enrollment"))
}

/// Enrolls a student by course slug. The rollup row is created eagerly
/// with live catalog totals so the overview has counters before the first
/// PASSED transition.
pub fn enroll(
    conn: &Connection,
    student_id: &str,
    course_slug: &str,
) -> Result<EnrollmentView, CoreError> {
    if student_id.trim().is_empty() {
        return Err(CoreError::validation("studentId must not be empty"));
    }
    let course_id = catalog::course_id_by_slug(conn, course_slug)?
        .ok_or_else(|| CoreError::not_found("course"))?;

    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM enrollments WHERE student_id = ? AND course_id = ?",
            (student_id, &course_id),
            |r| r.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(CoreError::conflict("already enrolled in this course"));
    }

    conn.execute(
        "INSERT INTO enrollments(id, student_id, course_id, current_week_number,
                                 progress_percent, is_active, enrolled_at)
         VALUES(?, ?, ?, 1, 0.0, 1, ?)",
        (
            Uuid::new_v4().to_string(),
            student_id,
            &course_id,
            Utc::now().to_rfc3339(),
        ),
    )?;

    progress::recalculate(conn, student_id, &course_id)?;
    load_enrollment(conn, student_id, &course_id)
}

pub fn deactivate(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
) -> Result<EnrollmentView, CoreError> {
    let changed = conn.execute(
        "UPDATE enrollments SET is_active = 0 WHERE student_id = ? AND course_id = ?",
        (student_id, course_id),
    )?;
    if changed == 0 {
        return Err(CoreError::not_found("enrollment"));
    }
    load_enrollment(conn, student_id, course_id)
}

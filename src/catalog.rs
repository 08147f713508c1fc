use crate::error::CoreError;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

// The catalog hierarchy (Course > Week > Lesson > Task, Week > Assignment)
// is read-only for every other module. `load_course` is the single
// ingestion boundary and the place where the loosely-typed content fields
// are validated into shape.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub slug: String,
    pub title: String,
    pub duration_weeks: i64,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub weeks: Vec<WeekInput>,
}

fn default_level() -> String {
    "BEGINNER".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekInput {
    pub week_number: i64,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
    #[serde(default)]
    pub assignment: Option<AssignmentInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonInput {
    pub day_number: i64,
    pub title: String,
    #[serde(default)]
    pub duration_mins: i64,
    #[serde(default)]
    pub objectives: JsonValue,
    #[serde(default)]
    pub code_examples: JsonValue,
    #[serde(default)]
    pub resources: JsonValue,
    #[serde(default)]
    pub tasks: Vec<TaskInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub starter_code: Option<String>,
    #[serde(default)]
    pub solution_code: Option<String>,
    #[serde(default)]
    pub hints: JsonValue,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub estimated_time: i64,
}

fn default_difficulty() -> String {
    "EASY".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub title: String,
    pub due_date: String,
    pub max_score: f64,
    pub passing_score: f64,
    #[serde(default)]
    pub allow_late: bool,
    #[serde(default)]
    pub late_penalty: f64,
}

/// A code example attached to a lesson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeExample {
    pub title: String,
    pub code: String,
}

/// An external resource link attached to a lesson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceLink {
    pub label: String,
    pub url: String,
}

/// Content fields arrive either as a JSON array or as a string holding
/// encoded JSON (how the upstream seeder stores them). Anything else is a
/// validation error for the whole load; there is no raw-text fallback.
fn unwrap_encoded(field: &str, raw: &JsonValue) -> Result<JsonValue, CoreError> {
    match raw {
        JsonValue::Null => Ok(json!([])),
        JsonValue::String(s) if s.trim().is_empty() => Ok(json!([])),
        JsonValue::String(s) => serde_json::from_str(s)
            .map_err(|e| CoreError::validation(format!("{}: not valid JSON: {}", field, e))),
        other => Ok(other.clone()),
    }
}

fn parse_string_list(field: &str, raw: &JsonValue) -> Result<Vec<String>, CoreError> {
    let v = unwrap_encoded(field, raw)?;
    serde_json::from_value(v)
        .map_err(|_| CoreError::validation(format!("{} must be an array of strings", field)))
}

fn parse_code_examples(raw: &JsonValue) -> Result<Vec<CodeExample>, CoreError> {
    let v = unwrap_encoded("codeExamples", raw)?;
    serde_json::from_value(v).map_err(|_| {
        CoreError::validation("codeExamples must be an array of {title, code} objects")
    })
}

fn parse_resources(raw: &JsonValue) -> Result<Vec<ResourceLink>, CoreError> {
    let v = unwrap_encoded("resources", raw)?;
    serde_json::from_value(v)
        .map_err(|_| CoreError::validation("resources must be an array of {label, url} objects"))
}

/// Upsert a full course tree. Natural keys (slug, week_number, day_number,
/// task sort order) identify existing rows so reloading a course keeps its
/// ids and any ledger rows pointing at them.
pub fn load_course(conn: &Connection, input: &CourseInput) -> Result<String, CoreError> {
    if input.slug.trim().is_empty() {
        return Err(CoreError::validation("course slug must not be empty"));
    }
    if input.title.trim().is_empty() {
        return Err(CoreError::validation("course title must not be empty"));
    }

    conn.execute(
        "INSERT INTO courses(id, slug, title, duration_weeks, level)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(slug) DO UPDATE SET
           title = excluded.title,
           duration_weeks = excluded.duration_weeks,
           level = excluded.level",
        (
            Uuid::new_v4().to_string(),
            &input.slug,
            &input.title,
            input.duration_weeks,
            &input.level,
        ),
    )?;
    let course_id: String = conn.query_row(
        "SELECT id FROM courses WHERE slug = ?",
        [&input.slug],
        |r| r.get(0),
    )?;

    for week in &input.weeks {
        conn.execute(
            "INSERT INTO weeks(id, course_id, week_number, title)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(course_id, week_number) DO UPDATE SET
               title = excluded.title",
            (
                Uuid::new_v4().to_string(),
                &course_id,
                week.week_number,
                &week.title,
            ),
        )?;
        let week_id: String = conn.query_row(
            "SELECT id FROM weeks WHERE course_id = ? AND week_number = ?",
            (&course_id, week.week_number),
            |r| r.get(0),
        )?;

        for lesson in &week.lessons {
            let objectives = parse_string_list("objectives", &lesson.objectives)?;
            let code_examples = parse_code_examples(&lesson.code_examples)?;
            let resources = parse_resources(&lesson.resources)?;

            conn.execute(
                "INSERT INTO lessons(id, week_id, day_number, title, duration_mins,
                                     objectives, code_examples, resources)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(week_id, day_number) DO UPDATE SET
                   title = excluded.title,
                   duration_mins = excluded.duration_mins,
                   objectives = excluded.objectives,
                   code_examples = excluded.code_examples,
                   resources = excluded.resources",
                (
                    Uuid::new_v4().to_string(),
                    &week_id,
                    lesson.day_number,
                    &lesson.title,
                    lesson.duration_mins,
                    serde_json::to_string(&objectives).unwrap_or_else(|_| "[]".into()),
                    serde_json::to_string(&code_examples).unwrap_or_else(|_| "[]".into()),
                    serde_json::to_string(&resources).unwrap_or_else(|_| "[]".into()),
                ),
            )?;
            let lesson_id: String = conn.query_row(
                "SELECT id FROM lessons WHERE week_id = ? AND day_number = ?",
                (&week_id, lesson.day_number),
                |r| r.get(0),
            )?;

            for (i, task) in lesson.tasks.iter().enumerate() {
                let hints = parse_string_list("hints", &task.hints)?;
                conn.execute(
                    "INSERT INTO tasks(id, lesson_id, sort_order, title, description,
                                       instructions, starter_code, solution_code, hints,
                                       difficulty, estimated_time)
                     VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     ON CONFLICT(lesson_id, sort_order) DO UPDATE SET
                       title = excluded.title,
                       description = excluded.description,
                       instructions = excluded.instructions,
                       starter_code = excluded.starter_code,
                       solution_code = excluded.solution_code,
                       hints = excluded.hints,
                       difficulty = excluded.difficulty,
                       estimated_time = excluded.estimated_time",
                    (
                        Uuid::new_v4().to_string(),
                        &lesson_id,
                        i as i64,
                        &task.title,
                        &task.description,
                        &task.instructions,
                        &task.starter_code,
                        &task.solution_code,
                        serde_json::to_string(&hints).unwrap_or_else(|_| "[]".into()),
                        &task.difficulty,
                        task.estimated_time,
                    ),
                )?;
            }
        }

        if let Some(a) = &week.assignment {
            conn.execute(
                "INSERT INTO assignments(id, week_id, title, due_date, max_score,
                                         passing_score, allow_late, late_penalty)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(week_id) DO UPDATE SET
                   title = excluded.title,
                   due_date = excluded.due_date,
                   max_score = excluded.max_score,
                   passing_score = excluded.passing_score,
                   allow_late = excluded.allow_late,
                   late_penalty = excluded.late_penalty",
                (
                    Uuid::new_v4().to_string(),
                    &week_id,
                    &a.title,
                    &a.due_date,
                    a.max_score,
                    a.passing_score,
                    a.allow_late as i64,
                    a.late_penalty,
                ),
            )?;
        }
    }

    Ok(course_id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub duration_weeks: i64,
    pub level: String,
}

pub fn list_courses(conn: &Connection) -> Result<Vec<CourseSummary>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, slug, title, duration_weeks, level FROM courses ORDER BY slug",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(CourseSummary {
            id: r.get(0)?,
            slug: r.get(1)?,
            title: r.get(2)?,
            duration_weeks: r.get(3)?,
            level: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn course_id_by_slug(conn: &Connection, slug: &str) -> Result<Option<String>, CoreError> {
    Ok(conn
        .query_row("SELECT id FROM courses WHERE slug = ?", [slug], |r| {
            r.get(0)
        })
        .optional()?)
}

pub fn course_summary(conn: &Connection, course_id: &str) -> Result<CourseSummary, CoreError> {
    conn.query_row(
        "SELECT id, slug, title, duration_weeks, level FROM courses WHERE id = ?",
        [course_id],
        |r| {
            Ok(CourseSummary {
                id: r.get(0)?,
                slug: r.get(1)?,
                title: r.get(2)?,
                duration_weeks: r.get(3)?,
                level: r.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("course"))
}

/// Live catalog counts for a course. The aggregator recounts these on
/// every run instead of maintaining incremental counters.
pub fn count_lessons(conn: &Connection, course_id: &str) -> Result<i64, CoreError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM lessons l JOIN weeks w ON w.id = l.week_id
         WHERE w.course_id = ?",
        [course_id],
        |r| r.get(0),
    )?)
}

pub fn count_tasks(conn: &Connection, course_id: &str) -> Result<i64, CoreError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM tasks t
         JOIN lessons l ON l.id = t.lesson_id
         JOIN weeks w ON w.id = l.week_id
         WHERE w.course_id = ?",
        [course_id],
        |r| r.get(0),
    )?)
}

pub fn count_assignments(conn: &Connection, course_id: &str) -> Result<i64, CoreError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM assignments a JOIN weeks w ON w.id = a.week_id
         WHERE w.course_id = ?",
        [course_id],
        |r| r.get(0),
    )?)
}

/// A lesson in its course-wide walking order (weeks by week_number, then
/// lessons by day_number).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRef {
    pub lesson_id: String,
    pub week_number: i64,
    pub week_title: String,
    pub day_number: i64,
    pub title: String,
}

pub fn ordered_lessons(conn: &Connection, course_id: &str) -> Result<Vec<LessonRef>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, w.week_number, w.title, l.day_number, l.title
         FROM lessons l
         JOIN weeks w ON w.id = l.week_id
         WHERE w.course_id = ?
         ORDER BY w.week_number, l.day_number",
    )?;
    let rows = stmt.query_map([course_id], |r| {
        Ok(LessonRef {
            lesson_id: r.get(0)?,
            week_number: r.get(1)?,
            week_title: r.get(2)?,
            day_number: r.get(3)?,
            title: r.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub task_id: String,
    pub title: String,
    pub difficulty: String,
    pub estimated_time: i64,
}

pub fn tasks_for_lesson(conn: &Connection, lesson_id: &str) -> Result<Vec<TaskRef>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, difficulty, estimated_time FROM tasks
         WHERE lesson_id = ? ORDER BY sort_order",
    )?;
    let rows = stmt.query_map([lesson_id], |r| {
        Ok(TaskRef {
            task_id: r.get(0)?,
            title: r.get(1)?,
            difficulty: r.get(2)?,
            estimated_time: r.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Everything the graders need to know about a task, including the lesson
/// and course context used to build the grading rubric.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub solution_code: Option<String>,
    pub lesson_title: String,
    pub course_id: String,
    pub course_title: String,
}

pub fn task_context(conn: &Connection, task_id: &str) -> Result<TaskContext, CoreError> {
    conn.query_row(
        "SELECT t.id, t.title, t.description, t.instructions, t.solution_code,
                l.title, c.id, c.title
         FROM tasks t
         JOIN lessons l ON l.id = t.lesson_id
         JOIN weeks w ON w.id = l.week_id
         JOIN courses c ON c.id = w.course_id
         WHERE t.id = ?",
        [task_id],
        |r| {
            Ok(TaskContext {
                task_id: r.get(0)?,
                title: r.get(1)?,
                description: r.get(2)?,
                instructions: r.get(3)?,
                solution_code: r.get(4)?,
                lesson_title: r.get(5)?,
                course_id: r.get(6)?,
                course_title: r.get(7)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("task"))
}

#[derive(Debug, Clone)]
pub struct AssignmentRow {
    pub id: String,
    pub title: String,
    pub due_date: String,
    pub max_score: f64,
    pub passing_score: f64,
    pub allow_late: bool,
    pub late_penalty: f64,
    pub course_id: String,
}

pub fn assignment_row(conn: &Connection, assignment_id: &str) -> Result<AssignmentRow, CoreError> {
    conn.query_row(
        "SELECT a.id, a.title, a.due_date, a.max_score, a.passing_score,
                a.allow_late, a.late_penalty, w.course_id
         FROM assignments a
         JOIN weeks w ON w.id = a.week_id
         WHERE a.id = ?",
        [assignment_id],
        |r| {
            Ok(AssignmentRow {
                id: r.get(0)?,
                title: r.get(1)?,
                due_date: r.get(2)?,
                max_score: r.get(3)?,
                passing_score: r.get(4)?,
                allow_late: r.get::<_, i64>(5)? != 0,
                late_penalty: r.get(6)?,
                course_id: r.get(7)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("assignment"))
}

pub fn lesson_course_id(conn: &Connection, lesson_id: &str) -> Result<String, CoreError> {
    conn.query_row(
        "SELECT w.course_id FROM lessons l JOIN weeks w ON w.id = l.week_id
         WHERE l.id = ?",
        [lesson_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("lesson"))
}

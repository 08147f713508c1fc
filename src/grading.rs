use crate::catalog::{self, TaskContext};
use crate::error::CoreError;
use crate::gateway::{GatewayClient, GatewayVerdict, GradeRequest};
use crate::progress;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

const ATTEMPT_RETRIES: u32 = 3;

/// Submission state machine. PASSED and FAILED are terminal; any row with
/// a non-null score is locked regardless of status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    InReview,
    Passed,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "DRAFT",
            SubmissionStatus::Submitted => "SUBMITTED",
            SubmissionStatus::InReview => "IN_REVIEW",
            SubmissionStatus::Passed => "PASSED",
            SubmissionStatus::Failed => "FAILED",
        }
    }
}

/// The single transition a grader may request: a final status, a score,
/// and feedback for the student. Both grading paths produce this shape so
/// the ledger only ever observes one transition function.
#[derive(Debug, Clone)]
pub struct GradeOutcome {
    pub status: SubmissionStatus,
    pub score: i64,
    pub feedback: String,
}

pub struct GradingInput<'a> {
    pub student_id: &'a str,
    pub content: &'a str,
    pub task: &'a TaskContext,
}

pub trait Grader {
    fn evaluate(&self, input: &GradingInput<'_>) -> Result<GradeOutcome, CoreError>;
}

/// Local string-comparison grading, no external call.
pub struct HeuristicGrader;

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

impl Grader for HeuristicGrader {
    fn evaluate(&self, input: &GradingInput<'_>) -> Result<GradeOutcome, CoreError> {
        let mut status = SubmissionStatus::Submitted;
        let mut score = 50;

        if let Some(solution) = input.task.solution_code.as_deref() {
            if strip_whitespace(input.content) == strip_whitespace(solution) {
                status = SubmissionStatus::Passed;
                score = 100;
            } else if input.content.len() > 20 {
                status = SubmissionStatus::InReview;
                score = 70;
            }
        }

        let feedback = if status == SubmissionStatus::Passed {
            "Great work! Your solution is correct."
        } else {
            "Your submission has been received and will be reviewed."
        };
        Ok(GradeOutcome {
            status,
            score,
            feedback: feedback.to_string(),
        })
    }
}

/// Maps the gateway's verdict onto the ledger's state machine. The 70/60
/// gap deliberately leaves the row in SUBMITTED.
pub fn map_gateway_outcome(
    score: f64,
    verdict: GatewayVerdict,
    feedback: &serde_json::Value,
) -> GradeOutcome {
    let status = if score >= 70.0 {
        SubmissionStatus::Passed
    } else if score < 60.0 || verdict == GatewayVerdict::Failed {
        SubmissionStatus::Failed
    } else {
        SubmissionStatus::Submitted
    };
    GradeOutcome {
        status,
        score: score.round() as i64,
        feedback: serde_json::to_string(feedback).unwrap_or_else(|_| "null".to_string()),
    }
}

/// Grades through the external AI evaluator.
pub struct AiGrader<'a> {
    pub gateway: &'a GatewayClient,
}

impl Grader for AiGrader<'_> {
    fn evaluate(&self, input: &GradingInput<'_>) -> Result<GradeOutcome, CoreError> {
        let task = input.task;
        let rubric_context = format!(
            "COURSE: {}\nLESSON: {}\nTASK: {}\n\nDESCRIPTION:\n{}\n\nINSTRUCTIONS:\n{}",
            task.course_title, task.lesson_title, task.title, task.description, task.instructions
        );
        let resp = self.gateway.grade(&GradeRequest {
            subject_id: task.task_id.clone(),
            student_id: input.student_id.to_string(),
            submitted_content: input.content.to_string(),
            reference_solution: task.solution_code.clone(),
            rubric_context,
        })?;
        Ok(map_gateway_outcome(resp.score, resp.status, &resp.feedback))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmissionView {
    pub id: String,
    pub student_id: String,
    pub task_id: String,
    pub attempt_number: i64,
    pub status: String,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmissionView {
    pub id: String,
    pub student_id: String,
    pub assignment_id: String,
    pub attempt_number: i64,
    pub status: String,
    pub score: f64,
    pub percentage: f64,
    pub is_late: bool,
    pub submitted_at: String,
}

/// Appends a task attempt. attempt_number is prior count + 1; the UNIQUE
/// constraint catches two racing submitters and we recount and retry.
fn create_task_attempt(
    conn: &Connection,
    student_id: &str,
    task_id: &str,
    content: &str,
    status: SubmissionStatus,
    submitted_at: &str,
) -> Result<(String, i64), CoreError> {
    for _ in 0..ATTEMPT_RETRIES {
        let prior: i64 = conn.query_row(
            "SELECT COUNT(*) FROM task_submissions WHERE student_id = ? AND task_id = ?",
            (student_id, task_id),
            |r| r.get(0),
        )?;
        let attempt_number = prior + 1;
        let id = Uuid::new_v4().to_string();
        let res = conn.execute(
            "INSERT INTO task_submissions(id, student_id, task_id, attempt_number,
                                          content, status, submitted_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                student_id,
                task_id,
                attempt_number,
                content,
                status.as_str(),
                submitted_at,
            ),
        );
        match res {
            Ok(_) => return Ok((id, attempt_number)),
            Err(e) if is_unique_violation(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(CoreError::conflict("could not allocate attempt number"))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// The only mutation allowed on an existing ledger row. A row whose score
/// is already set is locked; finalizing it again is an error, never an
/// overwrite.
pub fn finalize_task_submission(
    conn: &Connection,
    submission_id: &str,
    outcome: &GradeOutcome,
) -> Result<(), CoreError> {
    let changed = conn.execute(
        "UPDATE task_submissions SET status = ?, score = ?, feedback = ?
         WHERE id = ? AND score IS NULL",
        (
            outcome.status.as_str(),
            outcome.score,
            &outcome.feedback,
            submission_id,
        ),
    )?;
    if changed == 1 {
        return Ok(());
    }
    let exists: Option<String> = conn
        .query_row(
            "SELECT id FROM task_submissions WHERE id = ?",
            [submission_id],
            |r| r.get(0),
        )
        .optional()?;
    match exists {
        Some(_) => Err(CoreError::AlreadyLocked),
        None => Err(CoreError::not_found("submission")),
    }
}

fn load_task_submission(
    conn: &Connection,
    submission_id: &str,
) -> Result<TaskSubmissionView, CoreError> {
    conn.query_row(
        "SELECT id, student_id, task_id, attempt_number, status, score, feedback, submitted_at
         FROM task_submissions WHERE id = ?",
        [submission_id],
        |r| {
            Ok(TaskSubmissionView {
                id: r.get(0)?,
                student_id: r.get(1)?,
                task_id: r.get(2)?,
                attempt_number: r.get(3)?,
                status: r.get(4)?,
                score: r.get(5)?,
                feedback: r.get(6)?,
                submitted_at: r.get(7)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("submission"))
}

/// The rollup is a best-effort cache; a failed recount must not fail the
/// submission that triggered it.
fn trigger_aggregation(conn: &Connection, student_id: &str, course_id: &str) {
    if let Err(e) = progress::recalculate(conn, student_id, course_id) {
        warn!(student_id, course_id, error = %e, "progress aggregation failed");
    }
}

/// Heuristic path. Drafts are recorded and left alone; everything else is
/// created as SUBMITTED and finalized in the same call.
pub fn submit_task(
    conn: &Connection,
    student_id: &str,
    task_id: &str,
    content: &str,
    is_draft: bool,
) -> Result<TaskSubmissionView, CoreError> {
    if student_id.trim().is_empty() {
        return Err(CoreError::validation("studentId must not be empty"));
    }
    if content.trim().is_empty() {
        return Err(CoreError::validation("content must not be empty"));
    }
    let task = catalog::task_context(conn, task_id)?;
    let now = Utc::now().to_rfc3339();

    if is_draft {
        let (id, _) = create_task_attempt(
            conn,
            student_id,
            task_id,
            content,
            SubmissionStatus::Draft,
            &now,
        )?;
        return load_task_submission(conn, &id);
    }

    let (id, _) = create_task_attempt(
        conn,
        student_id,
        task_id,
        content,
        SubmissionStatus::Submitted,
        &now,
    )?;
    let outcome = HeuristicGrader.evaluate(&GradingInput {
        student_id,
        content,
        task: &task,
    })?;
    finalize_task_submission(conn, &id, &outcome)?;

    if outcome.status == SubmissionStatus::Passed {
        trigger_aggregation(conn, student_id, &task.course_id);
    }
    load_task_submission(conn, &id)
}

/// Gateway path. The attempt row is created before the network call; on
/// any gateway failure it stays SUBMITTED with no score, and the error is
/// surfaced as retryable. Nothing partial is ever committed.
pub fn ai_grade_task(
    conn: &Connection,
    gateway: &GatewayClient,
    student_id: &str,
    task_id: &str,
    content: &str,
) -> Result<TaskSubmissionView, CoreError> {
    if student_id.trim().is_empty() {
        return Err(CoreError::validation("studentId must not be empty"));
    }
    if content.trim().is_empty() {
        return Err(CoreError::validation("content must not be empty"));
    }
    let task = catalog::task_context(conn, task_id)?;
    let now = Utc::now().to_rfc3339();

    let (id, _) = create_task_attempt(
        conn,
        student_id,
        task_id,
        content,
        SubmissionStatus::Submitted,
        &now,
    )?;

    let outcome = AiGrader { gateway }.evaluate(&GradingInput {
        student_id,
        content,
        task: &task,
    })?;
    finalize_task_submission(conn, &id, &outcome)?;

    if outcome.status == SubmissionStatus::Passed {
        trigger_aggregation(conn, student_id, &task.course_id);
    }
    load_task_submission(conn, &id)
}

/// Assignment attempts arrive already scored (instructor or test harness);
/// the core owns lateness policy and the pass decision, and each attempt
/// is a fresh locked row.
pub fn submit_assignment(
    conn: &Connection,
    student_id: &str,
    assignment_id: &str,
    content: &str,
    score: f64,
) -> Result<AssignmentSubmissionView, CoreError> {
    if student_id.trim().is_empty() {
        return Err(CoreError::validation("studentId must not be empty"));
    }
    if content.trim().is_empty() {
        return Err(CoreError::validation("content must not be empty"));
    }
    let assignment = catalog::assignment_row(conn, assignment_id)?;
    if !(0.0..=assignment.max_score).contains(&score) {
        return Err(CoreError::validation(format!(
            "score must be between 0 and {}",
            assignment.max_score
        )));
    }

    let due = DateTime::parse_from_rfc3339(&assignment.due_date)
        .map_err(|_| CoreError::validation("assignment has an unparsable due date"))?
        .with_timezone(&Utc);
    let now = Utc::now();
    let is_late = now > due;
    if is_late && !assignment.allow_late {
        return Err(CoreError::validation(
            "assignment is past due and does not accept late submissions",
        ));
    }
    let penalized = if is_late {
        (score * (1.0 - assignment.late_penalty / 100.0)).max(0.0)
    } else {
        score
    };
    let status = if penalized >= assignment.passing_score {
        SubmissionStatus::Passed
    } else {
        SubmissionStatus::Failed
    };
    let percentage = if assignment.max_score > 0.0 {
        penalized / assignment.max_score * 100.0
    } else {
        0.0
    };
    let submitted_at = now.to_rfc3339();

    for _ in 0..ATTEMPT_RETRIES {
        let prior: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assignment_submissions
             WHERE student_id = ? AND assignment_id = ?",
            (student_id, assignment_id),
            |r| r.get(0),
        )?;
        let attempt_number = prior + 1;
        let id = Uuid::new_v4().to_string();
        let res = conn.execute(
            "INSERT INTO assignment_submissions(id, student_id, assignment_id, attempt_number,
                                                content, status, score, percentage, is_late,
                                                submitted_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                student_id,
                assignment_id,
                attempt_number,
                content,
                status.as_str(),
                penalized,
                percentage,
                is_late as i64,
                &submitted_at,
            ),
        );
        match res {
            Ok(_) => {
                if status == SubmissionStatus::Passed {
                    trigger_aggregation(conn, student_id, &assignment.course_id);
                }
                return Ok(AssignmentSubmissionView {
                    id,
                    student_id: student_id.to_string(),
                    assignment_id: assignment_id.to_string(),
                    attempt_number,
                    status: status.as_str().to_string(),
                    score: penalized,
                    percentage,
                    is_late,
                    submitted_at,
                });
            }
            Err(e) if is_unique_violation(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(CoreError::conflict("could not allocate attempt number"))
}

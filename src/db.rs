use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("studyd.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, used by unit tests.
#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            duration_weeks INTEGER NOT NULL,
            level TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS weeks(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            week_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            UNIQUE(course_id, week_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_weeks_course ON weeks(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lessons(
            id TEXT PRIMARY KEY,
            week_id TEXT NOT NULL,
            day_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            duration_mins INTEGER NOT NULL,
            objectives TEXT NOT NULL,
            code_examples TEXT NOT NULL,
            resources TEXT NOT NULL,
            FOREIGN KEY(week_id) REFERENCES weeks(id),
            UNIQUE(week_id, day_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lessons_week ON lessons(week_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks(
            id TEXT PRIMARY KEY,
            lesson_id TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            instructions TEXT NOT NULL,
            starter_code TEXT,
            solution_code TEXT,
            hints TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            estimated_time INTEGER NOT NULL,
            FOREIGN KEY(lesson_id) REFERENCES lessons(id),
            UNIQUE(lesson_id, sort_order)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_lesson ON tasks(lesson_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignments(
            id TEXT PRIMARY KEY,
            week_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            due_date TEXT NOT NULL,
            max_score REAL NOT NULL,
            passing_score REAL NOT NULL,
            allow_late INTEGER NOT NULL,
            late_penalty REAL NOT NULL,
            FOREIGN KEY(week_id) REFERENCES weeks(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            current_week_number INTEGER NOT NULL,
            progress_percent REAL NOT NULL,
            is_active INTEGER NOT NULL,
            enrolled_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            UNIQUE(student_id, course_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_course ON enrollments(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS task_submissions(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            task_id TEXT NOT NULL,
            attempt_number INTEGER NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL,
            score INTEGER,
            feedback TEXT,
            submitted_at TEXT NOT NULL,
            FOREIGN KEY(task_id) REFERENCES tasks(id),
            UNIQUE(student_id, task_id, attempt_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_task_submissions_student ON task_submissions(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_task_submissions_task ON task_submissions(task_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignment_submissions(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            assignment_id TEXT NOT NULL,
            attempt_number INTEGER NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL,
            score REAL,
            percentage REAL,
            feedback TEXT,
            is_late INTEGER NOT NULL,
            submitted_at TEXT NOT NULL,
            FOREIGN KEY(assignment_id) REFERENCES assignments(id),
            UNIQUE(student_id, assignment_id, attempt_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assignment_submissions_student
         ON assignment_submissions(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assignment_submissions_assignment
         ON assignment_submissions(assignment_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lesson_progress(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            lesson_id TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT,
            is_completed INTEGER NOT NULL DEFAULT 0,
            time_spent INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(lesson_id) REFERENCES lessons(id),
            UNIQUE(student_id, lesson_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lesson_progress_student ON lesson_progress(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_lesson_progress_lesson ON lesson_progress(lesson_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS course_progress(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            lessons_completed INTEGER NOT NULL DEFAULT 0,
            total_lessons INTEGER NOT NULL DEFAULT 0,
            tasks_completed INTEGER NOT NULL DEFAULT 0,
            total_tasks INTEGER NOT NULL DEFAULT 0,
            assignments_completed INTEGER NOT NULL DEFAULT 0,
            total_assignments INTEGER NOT NULL DEFAULT 0,
            overall_score REAL,
            last_accessed_at TEXT,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            UNIQUE(student_id, course_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_course_progress_student ON course_progress(student_id)",
        [],
    )?;

    // Early workspaces stored assignment feedback inline in content.
    ensure_assignment_submissions_feedback(conn)?;

    Ok(())
}

fn ensure_assignment_submissions_feedback(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "assignment_submissions", "feedback")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE assignment_submissions ADD COLUMN feedback TEXT",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

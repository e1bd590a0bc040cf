//! SQLite storage for played questions and learner attempts

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rusqlite::{params, Connection, Result as SqliteResult, Row};

use crate::questions::{Level, SqlQuestion};
use crate::session::AttemptRecord;

/// Attempt statistics, optionally for a single level
#[cfg_attr(feature = "python", pyclass)]
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptStats {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub total_attempts: i64,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub correct_count: i64,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub incorrect_count: i64,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub accuracy_percent: f64,
}

#[cfg(feature = "python")]
#[pymethods]
impl AttemptStats {
    fn __repr__(&self) -> String {
        format!("AttemptStats(total={}, correct={}, accuracy={:.1}%)",
                self.total_attempts, self.correct_count, self.accuracy_percent)
    }
}

/// Open (or create) the database at `db_path` with its schema
pub fn init_database(db_path: &str) -> SqliteResult<Connection> {
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS questions (
            id INTEGER NOT NULL,
            level INTEGER NOT NULL,
            task TEXT NOT NULL,
            answer TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (level, id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            level INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            submitted TEXT NOT NULL,
            expected TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            rule TEXT,
            attempted_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Insert or replace a level's questions
pub fn save_questions(conn: &Connection, questions: &[SqlQuestion]) -> SqliteResult<usize> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO questions (id, level, task, answer) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut count = 0;
    for q in questions {
        stmt.execute(params![q.id, q.level.number(), q.task, q.answer])?;
        count += 1;
    }
    Ok(count)
}

fn question_from_row(row: &Row<'_>) -> SqliteResult<SqlQuestion> {
    let level_number: u8 = row.get(1)?;
    let level = Level::from_number(level_number).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(1, i64::from(level_number))
    })?;
    Ok(SqlQuestion {
        id: row.get(0)?,
        level,
        task: row.get(2)?,
        answer: row.get(3)?,
    })
}

pub fn get_questions(conn: &Connection, level: Level) -> SqliteResult<Vec<SqlQuestion>> {
    let mut stmt = conn.prepare(
        "SELECT id, level, task, answer FROM questions WHERE level = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![level.number()], question_from_row)?;
    rows.collect()
}

pub fn save_attempt(conn: &Connection, attempt: &AttemptRecord) -> SqliteResult<i64> {
    conn.execute(
        "INSERT INTO attempts (level, question_id, submitted, expected, is_correct, rule, attempted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            attempt.level.number(),
            attempt.question_id,
            attempt.submitted,
            attempt.expected,
            attempt.is_correct as i32,
            attempt.rule.map(|r| r.as_str()),
            attempt.attempted_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Optional level filter from a raw level number; unknown numbers are an error
pub fn level_filter(level: Option<u8>) -> Result<Option<Level>, String> {
    match level {
        None => Ok(None),
        Some(n) => Level::from_number(n)
            .map(Some)
            .ok_or_else(|| format!("Unknown level: {}", n)),
    }
}

/// Overall statistics, or those of one level
pub fn get_stats(conn: &Connection, level: Option<Level>) -> SqliteResult<AttemptStats> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*), SUM(is_correct) FROM attempts WHERE ?1 IS NULL OR level = ?1",
    )?;

    stmt.query_row(params![level.map(Level::number)], |row| {
        let total: i64 = row.get(0)?;
        let correct: i64 = row.get::<_, Option<i64>>(1)?.unwrap_or(0);
        let accuracy = if total > 0 { (correct as f64 / total as f64) * 100.0 } else { 0.0 };

        Ok(AttemptStats {
            total_attempts: total,
            correct_count: correct,
            incorrect_count: total - correct,
            accuracy_percent: accuracy,
        })
    })
}

/// Questions answered incorrectly, most failed first
pub fn get_failed_questions(conn: &Connection, limit: Option<usize>) -> SqliteResult<Vec<(SqlQuestion, i64)>> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT q.id, q.level, q.task, q.answer, COUNT(*) AS fail_count
         FROM questions q
         JOIN attempts a ON q.id = a.question_id AND q.level = a.level
         WHERE a.is_correct = 0
         GROUP BY q.level, q.id
         ORDER BY fail_count DESC, q.level, q.id
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok((question_from_row(row)?, row.get::<_, i64>(4)?))
    })?;
    rows.collect()
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
fn runtime_err(e: rusqlite::Error) -> PyErr {
    pyo3::exceptions::PyRuntimeError::new_err(e.to_string())
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "init_database")]
pub fn py_init_database(db_path: &str) -> PyResult<()> {
    init_database(db_path).map(|_| ()).map_err(runtime_err)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "save_attempt")]
pub fn py_save_attempt(
    db_path: &str,
    level: u8,
    question_id: i64,
    submitted: &str,
    expected: &str,
) -> PyResult<i64> {
    let level = Level::from_number(level)
        .ok_or_else(|| pyo3::exceptions::PyValueError::new_err(format!("Unknown level: {}", level)))?;
    let attempt = AttemptRecord::checked(level, question_id, submitted, expected);
    let conn = init_database(db_path).map_err(runtime_err)?;
    save_attempt(&conn, &attempt).map_err(runtime_err)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "get_stats")]
pub fn py_get_stats(db_path: &str, level: Option<u8>) -> PyResult<AttemptStats> {
    let level = level_filter(level).map_err(pyo3::exceptions::PyValueError::new_err)?;
    let conn = init_database(db_path).map_err(runtime_err)?;
    get_stats(&conn, level).map_err(runtime_err)
}

//! SQL Quest Core - Rust core for the SQL practice game
//!
//! Provides SQL answer normalization and clause-aware matching, level sessions
//! with hearts, webhook content decoding, question bank import and SQLite
//! progress tracking. Build with the `python` feature for the extension module.

mod answer;
mod bank;
mod config;
mod content;
mod normalize;
mod pattern;
mod questions;
mod session;
mod store;

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use answer::{
    check_answer, similarity, AnswerCheck, INCORRECT_FEEDBACK, PATTERN_FEEDBACK, PERFECT_FEEDBACK,
};
pub use bank::{parse_csv, parse_csv_reader, parse_excel, parse_file, ColumnMapping};
pub use config::GameConfig;
pub use content::{
    decode_level_questions, decode_payload, next_level_request, strip_code_fence, upload_request,
    upload_request_at, ContentEntry, GameContentItem, SqlTask,
};
pub use normalize::normalize_sql;
pub use pattern::{match_sql, sql_matches_pattern, ClauseRule, MatchVerdict};
pub use questions::{sample_questions, Level, SqlQuestion};
pub use session::{AttemptRecord, LevelSession, Phase, SessionError, SubmitOutcome};
pub use store::{
    get_failed_questions, get_questions, get_stats, init_database, init_schema, level_filter,
    save_attempt, save_questions, AttemptStats,
};

/// SQL Quest Core Python Module
#[cfg(feature = "python")]
#[pymodule]
fn sqlquest_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Answer checking
    m.add_function(wrap_pyfunction!(normalize::py_normalize_sql, m)?)?;
    m.add_function(wrap_pyfunction!(pattern::py_sql_matches_pattern, m)?)?;
    m.add_function(wrap_pyfunction!(answer::py_check_answer, m)?)?;

    // Question sources
    m.add_function(wrap_pyfunction!(content::py_decode_level_questions, m)?)?;
    m.add_function(wrap_pyfunction!(bank::py_parse_question_file, m)?)?;

    // Progress tracking
    m.add_function(wrap_pyfunction!(store::py_init_database, m)?)?;
    m.add_function(wrap_pyfunction!(store::py_save_attempt, m)?)?;
    m.add_function(wrap_pyfunction!(store::py_get_stats, m)?)?;

    // Register classes
    m.add_class::<answer::AnswerCheck>()?;
    m.add_class::<questions::SqlQuestion>()?;
    m.add_class::<store::AttemptStats>()?;

    Ok(())
}

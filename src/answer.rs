//! Answer checking with learner feedback

#[cfg(feature = "python")]
use pyo3::prelude::*;
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::normalize::normalize_sql;
use crate::pattern::{match_sql, ClauseRule};

pub const PERFECT_FEEDBACK: &str = "Perfect! Your SQL query is correct.";
pub const PATTERN_FEEDBACK: &str = "Great! Your SQL logic is correct.";
pub const INCORRECT_FEEDBACK: &str = "Incorrect. Try again!";

/// Result of checking a submitted query against the expected one
#[cfg_attr(feature = "python", pyclass)]
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerCheck {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub is_correct: bool,
    /// Accepted by normalized equality rather than a clause rule
    #[cfg_attr(feature = "python", pyo3(get))]
    pub exact: bool,
    pub rule: Option<ClauseRule>,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub similarity_score: f64,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub feedback: String,
}

#[cfg(feature = "python")]
#[pymethods]
impl AnswerCheck {
    #[getter]
    fn rule(&self) -> Option<&'static str> {
        self.rule.map(ClauseRule::as_str)
    }

    fn __repr__(&self) -> String {
        format!("AnswerCheck(is_correct={}, score={:.2}, feedback='{}')",
                self.is_correct, self.similarity_score, self.feedback)
    }
}

/// Textual closeness of two queries in `[0, 1]`, informational only.
pub fn similarity(submitted: &str, expected: &str) -> f64 {
    let submitted = normalize_sql(submitted);
    let expected = normalize_sql(expected);

    // Jaro-Winkler weighs typos near the start more gently
    normalized_levenshtein(&submitted, &expected) * 0.4 + jaro_winkler(&submitted, &expected) * 0.6
}

/// Check a learner's query and build the feedback line shown to them
pub fn check_answer(submitted: &str, expected: &str) -> AnswerCheck {
    let verdict = match_sql(submitted, expected);

    if verdict.accepted && verdict.rule.is_none() {
        return AnswerCheck {
            is_correct: true,
            exact: true,
            rule: None,
            similarity_score: 1.0,
            feedback: PERFECT_FEEDBACK.to_string(),
        };
    }

    let feedback = if verdict.accepted { PATTERN_FEEDBACK } else { INCORRECT_FEEDBACK };

    AnswerCheck {
        is_correct: verdict.accepted,
        exact: false,
        rule: verdict.rule,
        similarity_score: similarity(submitted, expected),
        feedback: feedback.to_string(),
    }
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "check_answer")]
pub fn py_check_answer(submitted: &str, expected: &str) -> AnswerCheck {
    check_answer(submitted, expected)
}

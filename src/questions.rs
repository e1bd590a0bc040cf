//! SQL practice questions and the three game levels

use std::fmt;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Game level; each one has its own question set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "sql-level-1")]
    One,
    #[serde(rename = "sql-level-2")]
    Two,
    #[serde(rename = "sql-level-3")]
    Three,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::One, Level::Two, Level::Three];

    pub fn number(self) -> u8 {
        match self {
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Level> {
        match n {
            1 => Some(Level::One),
            2 => Some(Level::Two),
            3 => Some(Level::Three),
            _ => None,
        }
    }

    /// Content type tag used by the webhook payloads
    pub fn tag(self) -> &'static str {
        match self {
            Level::One => "sql-level-1",
            Level::Two => "sql-level-2",
            Level::Three => "sql-level-3",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Level> {
        Level::ALL.into_iter().find(|level| level.tag() == tag)
    }

    pub fn next(self) -> Option<Level> {
        Level::from_number(self.number() + 1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.number())
    }
}

/// One SQL-writing task with its reference answer
#[cfg_attr(feature = "python", pyclass)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQuestion {
    #[cfg_attr(feature = "python", pyo3(get))]
    pub id: i64,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub task: String,
    #[cfg_attr(feature = "python", pyo3(get))]
    pub answer: String,
    #[serde(rename = "type")]
    pub level: Level,
}

#[cfg(feature = "python")]
#[pymethods]
impl SqlQuestion {
    #[getter]
    fn level(&self) -> u8 {
        self.level.number()
    }

    fn __repr__(&self) -> String {
        format!("SqlQuestion(id={}, level={}, task='{}...')",
                self.id, self.level.number(), &self.task.chars().take(40).collect::<String>())
    }
}

impl SqlQuestion {
    pub fn new(id: i64, task: impl Into<String>, answer: impl Into<String>, level: Level) -> Self {
        SqlQuestion {
            id,
            task: task.into(),
            answer: answer.into(),
            level,
        }
    }

    /// A question needs a non-zero id, a task and an answer to be played
    pub fn is_playable(&self) -> bool {
        self.id != 0 && !self.task.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// Pick up to `count` distinct questions in random order
pub fn sample_questions(questions: &[SqlQuestion], count: usize) -> Vec<SqlQuestion> {
    let mut rng = rand::thread_rng();
    questions.choose_multiple(&mut rng, count).cloned().collect()
}

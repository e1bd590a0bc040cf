//! Level session: hearts, answer locking and question advancement

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::answer::{check_answer, AnswerCheck};
use crate::config::GameConfig;
use crate::pattern::ClauseRule;
use crate::questions::{Level, SqlQuestion};

pub const OUT_OF_HEARTS_FEEDBACK: &str = "Out of hearts! Here is the correct answer.";

/// Where the current question stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the first submission
    Answering,
    /// Accepted; waits for `advance`
    LockedCorrect,
    /// Rejected with hearts left; a new submission is allowed
    LockedIncorrectRetry,
    /// Rejected on the last heart; answer revealed, waits for `advance`
    LockedOutOfHearts,
    /// Every question played; the caller moves to the next level
    Advancing,
}

impl Phase {
    pub fn accepts_submission(self) -> bool {
        matches!(self, Phase::Answering | Phase::LockedIncorrectRetry)
    }

    pub fn can_advance(self) -> bool {
        matches!(self, Phase::LockedCorrect | Phase::LockedOutOfHearts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    EmptyAnswer,
    NotAnswering(Phase),
    NotLocked(Phase),
    LevelFinished,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyAnswer => write!(f, "Answer is empty"),
            SessionError::NotAnswering(phase) => write!(f, "Question is locked ({:?})", phase),
            SessionError::NotLocked(phase) => write!(f, "Question is still open ({:?})", phase),
            SessionError::LevelFinished => write!(f, "Level is already finished"),
        }
    }
}

impl std::error::Error for SessionError {}

/// One submission, ready to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub level: Level,
    pub question_id: i64,
    pub submitted: String,
    pub expected: String,
    pub is_correct: bool,
    pub rule: Option<ClauseRule>,
    pub attempted_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Record a submission with the verdict and rule taken from `check`
    pub fn from_check(
        level: Level,
        question_id: i64,
        submitted: &str,
        expected: &str,
        check: &AnswerCheck,
    ) -> Self {
        AttemptRecord {
            level,
            question_id,
            submitted: submitted.to_string(),
            expected: expected.to_string(),
            is_correct: check.is_correct,
            rule: check.rule,
            attempted_at: Utc::now(),
        }
    }

    /// Check `submitted` against `expected` and record the outcome
    pub fn checked(level: Level, question_id: i64, submitted: &str, expected: &str) -> Self {
        let check = check_answer(submitted, expected);
        Self::from_check(level, question_id, submitted, expected, &check)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub check: AnswerCheck,
    pub phase: Phase,
    pub hearts: u32,
    pub feedback: String,
    /// Set once the learner ran out of hearts
    pub revealed_answer: Option<String>,
    /// Delay the caller should wait before calling `advance`
    pub advance_after_ms: Option<u64>,
    pub attempt: AttemptRecord,
}

/// Play-through of one level's questions
#[derive(Debug, Clone)]
pub struct LevelSession {
    level: Level,
    questions: Vec<SqlQuestion>,
    config: GameConfig,
    index: usize,
    hearts: u32,
    phase: Phase,
}

impl LevelSession {
    pub fn new(level: Level, questions: Vec<SqlQuestion>, config: GameConfig) -> Result<Self, String> {
        if questions.is_empty() {
            return Err(format!("No questions available for {}", level));
        }
        config.validate()?;

        info!("starting {} with {} questions", level, questions.len());
        Ok(LevelSession {
            level,
            hearts: config.max_hearts,
            questions,
            config,
            index: 0,
            phase: Phase::Answering,
        })
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hearts(&self) -> u32 {
        self.hearts
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_last_question(&self) -> bool {
        self.index + 1 == self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Advancing
    }

    pub fn current_question(&self) -> Option<&SqlQuestion> {
        if self.is_finished() {
            return None;
        }
        self.questions.get(self.index)
    }

    /// Check an answer for the current question and update hearts and phase
    pub fn submit(&mut self, answer: &str) -> Result<SubmitOutcome, SessionError> {
        if self.is_finished() {
            return Err(SessionError::LevelFinished);
        }
        if !self.phase.accepts_submission() {
            return Err(SessionError::NotAnswering(self.phase));
        }
        if answer.trim().is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        let question = &self.questions[self.index];
        let check = check_answer(answer, &question.answer);
        let attempt =
            AttemptRecord::from_check(self.level, question.id, answer, &question.answer, &check);

        let (feedback, revealed_answer, advance_after_ms) = if check.is_correct {
            self.phase = Phase::LockedCorrect;
            (check.feedback.clone(), None, Some(self.config.correct_advance_ms))
        } else {
            self.hearts = self.hearts.saturating_sub(1);
            if self.hearts == 0 {
                self.phase = Phase::LockedOutOfHearts;
                (
                    OUT_OF_HEARTS_FEEDBACK.to_string(),
                    Some(question.answer.clone()),
                    Some(self.config.out_of_hearts_advance_ms),
                )
            } else {
                self.phase = Phase::LockedIncorrectRetry;
                let plural = if self.hearts == 1 { "" } else { "s" };
                (
                    format!("Incorrect. You have {} heart{} remaining.", self.hearts, plural),
                    None,
                    None,
                )
            }
        };

        debug!(
            "{} question {}: correct={} hearts={} phase={:?}",
            self.level, question.id, check.is_correct, self.hearts, self.phase
        );

        Ok(SubmitOutcome {
            check,
            phase: self.phase,
            hearts: self.hearts,
            feedback,
            revealed_answer,
            advance_after_ms,
            attempt,
        })
    }

    /// Move past a locked question.
    ///
    /// Hearts are a level-wide budget and carry over; they are refilled only
    /// after an out-of-hearts reveal so the next question stays playable.
    pub fn advance(&mut self) -> Result<Phase, SessionError> {
        if self.is_finished() {
            return Err(SessionError::LevelFinished);
        }
        if !self.phase.can_advance() {
            return Err(SessionError::NotLocked(self.phase));
        }

        if self.is_last_question() {
            info!("{} finished", self.level);
            self.phase = Phase::Advancing;
        } else {
            if self.phase == Phase::LockedOutOfHearts {
                self.hearts = self.config.max_hearts;
            }
            self.index += 1;
            self.phase = Phase::Answering;
        }
        Ok(self.phase)
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.hearts = self.config.max_hearts;
        self.phase = Phase::Answering;
    }
}

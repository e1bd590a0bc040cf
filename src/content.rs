//! Webhook payloads: request bodies and response decoding
//!
//! The content service answers in several envelopes (an LLM message whose
//! text holds fenced JSON, a bare array, an object keyed by `tasks` ...).
//! Everything is decoded once here into [`ContentEntry`] values; items that
//! fit no known shape are logged and dropped.

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::questions::{Level, SqlQuestion};

const LIST_KEYS: [&str; 6] = ["tasks", "content", "items", "games", "questions", "results"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mcq {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blank {
    pub position: usize,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInTheBlank {
    pub sentence: String,
    pub blanks: Vec<Blank>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniQuiz {
    pub title: String,
    pub questions: Vec<Mcq>,
    /// Seconds
    #[serde(rename = "timeLimit", default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

/// SQL task as produced by the content service; fields may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTask {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub answer: String,
}

impl SqlTask {
    pub fn into_question(self, level: Level) -> SqlQuestion {
        SqlQuestion::new(self.id, self.task, self.answer, level)
    }
}

/// `{ "type": ..., "data": ... }` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameContentItem {
    #[serde(rename = "mcq")]
    Mcq(Mcq),
    #[serde(rename = "flashcard")]
    Flashcard(Flashcard),
    #[serde(rename = "fill-in-the-blank")]
    FillInTheBlank(FillInTheBlank),
    #[serde(rename = "mini-quiz")]
    MiniQuiz(MiniQuiz),
    #[serde(rename = "sql-level-1")]
    SqlLevel1(SqlTask),
    #[serde(rename = "sql-level-2")]
    SqlLevel2(SqlTask),
    #[serde(rename = "sql-level-3")]
    SqlLevel3(SqlTask),
}

impl GameContentItem {
    pub fn sql_level(&self) -> Option<Level> {
        match self {
            GameContentItem::SqlLevel1(_) => Some(Level::One),
            GameContentItem::SqlLevel2(_) => Some(Level::Two),
            GameContentItem::SqlLevel3(_) => Some(Level::Three),
            _ => None,
        }
    }
}

/// A single decoded item: either enveloped content or a bare SQL task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentEntry {
    Item(GameContentItem),
    Sql(SqlTask),
}

impl ContentEntry {
    /// The SQL task carried by this entry, if any
    pub fn into_sql_task(self) -> Option<SqlTask> {
        match self {
            ContentEntry::Item(
                GameContentItem::SqlLevel1(task)
                | GameContentItem::SqlLevel2(task)
                | GameContentItem::SqlLevel3(task),
            ) => Some(task),
            ContentEntry::Item(_) => None,
            ContentEntry::Sql(task) => Some(task),
        }
    }
}

/// Body posted with the uploaded document text
pub fn upload_request(text: &str) -> Value {
    upload_request_at(text, Utc::now())
}

pub fn upload_request_at(text: &str, at: DateTime<Utc>) -> Value {
    json!({
        "data": {
            "text": text,
            "level": Level::One.number(),
            "timestamp": at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    })
}

/// Body asking the content service for the questions of `level`
pub fn next_level_request(level: Level) -> Value {
    json!({ "data": { "current level": level.number() } })
}

/// Strip a surrounding markdown code fence (```` ``` ```` or ```` ```json ````)
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let lang_len = rest
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_alphanumeric())
            .count();
        let lang = &rest[..lang_len];
        body = if lang.eq_ignore_ascii_case("json") || lang.is_empty() {
            &rest[lang_len..]
        } else {
            rest
        };
    }

    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Message text of an LLM-style response: `[{content: {parts: [{text}]}}]` or `[{text}]`
fn message_text(payload: &Value) -> Option<&str> {
    let first = payload.as_array()?.first()?;
    first
        .pointer("/content/parts/0/text")
        .and_then(Value::as_str)
        .or_else(|| first.get("text").and_then(Value::as_str))
}

/// Raw item list out of a decoded JSON document
fn item_values(doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let list_key = LIST_KEYS
                .into_iter()
                .find(|key| map.get(*key).is_some_and(Value::is_array));
            if let Some(Value::Array(items)) = list_key.and_then(|key| map.remove(key)) {
                return items;
            }
            if let Some(content @ Value::Object(_)) = map.remove("content") {
                return vec![content];
            }
            if map.contains_key("type") && map.contains_key("data") {
                return vec![Value::Object(map)];
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Decode a raw webhook response body into content entries
pub fn decode_payload(body: &str) -> Result<Vec<ContentEntry>, String> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| format!("Failed to parse webhook response: {}", e))?;

    let text = message_text(&payload).map(str::to_owned);
    let doc = match text {
        Some(text) => {
            debug!("decoding content from message text ({} chars)", text.len());
            serde_json::from_str(strip_code_fence(&text))
                .map_err(|e| format!("Failed to parse JSON from message text: {}", e))?
        }
        None => payload,
    };

    let entries: Vec<ContentEntry> = item_values(doc)
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("dropping content item {}: {}", i, e);
                None
            }
        })
        .collect();

    info!("decoded {} content items", entries.len());
    Ok(entries)
}

/// Decode the playable SQL questions for `level` from a webhook response
pub fn decode_level_questions(body: &str, level: Level) -> Result<Vec<SqlQuestion>, String> {
    let questions = decode_payload(body)?
        .into_iter()
        .filter_map(ContentEntry::into_sql_task)
        .map(|task| task.into_question(level))
        .filter(|q| {
            let playable = q.is_playable();
            if !playable {
                warn!("dropping unplayable question id={} for {}", q.id, level);
            }
            playable
        })
        .collect();
    Ok(questions)
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "decode_level_questions")]
pub fn py_decode_level_questions(body: &str, level: u8) -> PyResult<Vec<SqlQuestion>> {
    let level = Level::from_number(level)
        .ok_or_else(|| pyo3::exceptions::PyValueError::new_err(format!("Unknown level: {}", level)))?;
    decode_level_questions(body, level)
        .map_err(pyo3::exceptions::PyRuntimeError::new_err)
}

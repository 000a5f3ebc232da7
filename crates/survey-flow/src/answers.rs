use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::FlowError;
use crate::spec::{Catalog, Question, QuestionType};

/// Suffix of the side-channel keys carrying audio references.
pub const AUDIO_SUFFIX: &str = "_audio";

/// Typed answer; empty text or an empty collection means unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Single(String),
    /// Selected values, unique, in selection order.
    Multi(Vec<String>),
    Text(String),
    /// Attribute id to selected brand values.
    Matrix(BTreeMap<String, Vec<String>>),
}

impl Answer {
    /// Empty answer matching the question kind.
    pub fn empty_for(question: &Question) -> Self {
        if question.is_matrix() {
            return Answer::Matrix(BTreeMap::new());
        }
        match question.question_type {
            QuestionType::SingleAnswer => Answer::Single(String::new()),
            QuestionType::MultiAnswer => Answer::Multi(Vec::new()),
            QuestionType::OpenEnded => Answer::Text(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Single(value) | Answer::Text(value) => value.trim().is_empty(),
            Answer::Multi(values) => values.is_empty(),
            Answer::Matrix(cells) => cells.values().all(Vec::is_empty),
        }
    }

    /// Selected values; free text and matrices select nothing.
    pub fn selected(&self) -> Vec<&str> {
        match self {
            Answer::Single(value) if !value.is_empty() => vec![value.as_str()],
            Answer::Multi(values) => values.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Text form used by rule comparisons; multi answers are comma-joined.
    pub fn as_text(&self) -> String {
        match self {
            Answer::Single(value) | Answer::Text(value) => value.clone(),
            Answer::Multi(values) => values.join(","),
            Answer::Matrix(_) => String::new(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Answer::Single(_) => "single",
            Answer::Multi(_) => "multi",
            Answer::Text(_) => "text",
            Answer::Matrix(_) => "matrix",
        }
    }

    /// Converts a loosely typed JSON answer for `question`.
    pub fn from_json(question: &Question, value: &Value) -> Result<Self, FlowError> {
        let mismatch = |expected| FlowError::AnswerKindMismatch {
            question_id: question.id.clone(),
            expected,
        };
        if value.is_null() {
            return Ok(Self::empty_for(question));
        }
        if question.is_matrix() {
            let object = value.as_object().ok_or_else(|| mismatch("matrix"))?;
            let mut cells = BTreeMap::new();
            for (attribute, selected) in object {
                let values = scalar_list(selected).ok_or_else(|| mismatch("matrix"))?;
                cells.insert(attribute.clone(), values);
            }
            return Ok(Answer::Matrix(cells));
        }
        match question.question_type {
            QuestionType::SingleAnswer => scalar_text(value)
                .map(Answer::Single)
                .ok_or_else(|| mismatch("single")),
            QuestionType::OpenEnded => scalar_text(value)
                .map(Answer::Text)
                .ok_or_else(|| mismatch("text")),
            QuestionType::MultiAnswer => scalar_list(value)
                .map(Answer::Multi)
                .ok_or_else(|| mismatch("multi")),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Answer::Single(value) | Answer::Text(value) => Value::String(value.clone()),
            Answer::Multi(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            Answer::Matrix(cells) => Value::Object(
                cells
                    .iter()
                    .map(|(attribute, values)| {
                        let list = values.iter().cloned().map(Value::String).collect();
                        (attribute.clone(), Value::Array(list))
                    })
                    .collect(),
            ),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn scalar_list(value: &Value) -> Option<Vec<String>> {
    let mut values: Vec<String> = Vec::new();
    for item in value.as_array()? {
        let text = scalar_text(item)?;
        if !values.contains(&text) {
            values.push(text);
        }
    }
    Some(values)
}

/// Outcome of a multi-answer toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Mutable answers of one respondent plus the audio side channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: BTreeMap<String, Answer>,
    audio: BTreeMap<String, String>,
}

impl AnswerStore {
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut store = Self::default();
        store.ensure_initialized(catalog);
        store
    }

    /// Adds empty answers for questions that have none, e.g. after materialization.
    pub fn ensure_initialized(&mut self, catalog: &Catalog) {
        for question in catalog {
            self.answers
                .entry(question.id.clone())
                .or_insert_with(|| Answer::empty_for(question));
        }
    }

    /// Clears everything, then re-initializes for `catalog`.
    pub fn reset(&mut self, catalog: &Catalog) {
        self.answers.clear();
        self.audio.clear();
        self.ensure_initialized(catalog);
    }

    pub fn get(&self, id: &str) -> Option<&Answer> {
        self.answers.get(id)
    }

    pub fn is_answered(&self, id: &str) -> bool {
        self.get(id).is_some_and(|answer| !answer.is_empty())
    }

    pub fn selected(&self, id: &str) -> Vec<&str> {
        self.get(id).map(Answer::selected).unwrap_or_default()
    }

    pub fn text(&self, id: &str) -> String {
        self.get(id).map(Answer::as_text).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.answers.iter().map(|(id, answer)| (id.as_str(), answer))
    }

    pub fn audio(&self, id: &str) -> Option<&str> {
        self.audio.get(id).map(String::as_str)
    }

    /// Audio references keyed by `{id}_audio`.
    pub fn audio_entries(&self) -> impl Iterator<Item = (String, &str)> {
        self.audio
            .iter()
            .map(|(id, reference)| (format!("{id}{AUDIO_SUFFIX}"), reference.as_str()))
    }

    /// Stores a single-answer or open-ended value, with an optional audio reference.
    pub fn set_single(
        &mut self,
        id: &str,
        value: impl Into<String>,
        audio: Option<String>,
    ) -> Result<(), FlowError> {
        let value = value.into();
        let answer = match self.answers.get(id) {
            None | Some(Answer::Single(_)) => Answer::Single(value),
            Some(Answer::Text(_)) => Answer::Text(value),
            Some(other) => {
                return Err(FlowError::AnswerKindMismatch {
                    question_id: id.to_string(),
                    expected: other.kind_name(),
                });
            }
        };
        self.answers.insert(id.to_string(), answer);
        if let Some(reference) = audio {
            self.audio.insert(id.to_string(), reference);
        }
        Ok(())
    }

    /// Adds `value` when absent, removes it when present. `max == 0` is unbounded.
    pub fn toggle_multi(&mut self, id: &str, value: &str, max: u32) -> Result<Toggle, FlowError> {
        let entry = self
            .answers
            .entry(id.to_string())
            .or_insert_with(|| Answer::Multi(Vec::new()));
        let values = match entry {
            Answer::Multi(values) => values,
            other => {
                return Err(FlowError::AnswerKindMismatch {
                    question_id: id.to_string(),
                    expected: other.kind_name(),
                });
            }
        };
        if let Some(position) = values.iter().position(|existing| existing == value) {
            values.remove(position);
            return Ok(Toggle::Removed);
        }
        if max > 0 && values.len() >= max as usize {
            return Err(FlowError::SelectionLimitExceeded {
                question_id: id.to_string(),
                max,
            });
        }
        values.push(value.to_string());
        Ok(Toggle::Added)
    }

    /// Replaces the whole matrix; attributes are letter ids.
    pub fn set_attribute_matrix(
        &mut self,
        id: &str,
        matrix: BTreeMap<String, Vec<String>>,
    ) -> Result<(), FlowError> {
        match self.answers.get(id) {
            None | Some(Answer::Matrix(_)) => {}
            Some(other) => {
                return Err(FlowError::AnswerKindMismatch {
                    question_id: id.to_string(),
                    expected: other.kind_name(),
                });
            }
        }
        let cells = matrix
            .into_iter()
            .map(|(attribute, values)| {
                let mut unique: Vec<String> = Vec::with_capacity(values.len());
                for value in values {
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                (attribute, unique)
            })
            .collect();
        self.answers.insert(id.to_string(), Answer::Matrix(cells));
        Ok(())
    }

    /// Toggles one brand for one attribute of the matrix.
    pub fn toggle_matrix_cell(
        &mut self,
        id: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Toggle, FlowError> {
        let entry = self
            .answers
            .entry(id.to_string())
            .or_insert_with(|| Answer::Matrix(BTreeMap::new()));
        let cells = match entry {
            Answer::Matrix(cells) => cells,
            other => {
                return Err(FlowError::AnswerKindMismatch {
                    question_id: id.to_string(),
                    expected: other.kind_name(),
                });
            }
        };
        let values = cells.entry(attribute.to_string()).or_default();
        if let Some(position) = values.iter().position(|existing| existing == value) {
            values.remove(position);
            Ok(Toggle::Removed)
        } else {
            values.push(value.to_string());
            Ok(Toggle::Added)
        }
    }

    /// Loads a loosely typed answers document; unknown ids are skipped with a warning.
    pub fn from_json(catalog: &Catalog, value: &Value) -> Result<Self, FlowError> {
        let mut store = Self::for_catalog(catalog);
        let Some(object) = value.as_object() else {
            return Err(FlowError::AnswerKindMismatch {
                question_id: "<root>".into(),
                expected: "object",
            });
        };
        for (key, raw) in object {
            if let Some(id) = key.strip_suffix(AUDIO_SUFFIX) {
                if let Some(reference) = raw.as_str() {
                    store.audio.insert(id.to_string(), reference.to_string());
                }
                continue;
            }
            match catalog.question(key) {
                Some(question) => {
                    store
                        .answers
                        .insert(key.clone(), Answer::from_json(question, raw)?);
                }
                None => warn!(question_id = %key, "ignoring answer for unknown question"),
            }
        }
        Ok(store)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (id, answer) in &self.answers {
            map.insert(id.clone(), answer.to_json());
        }
        for (key, reference) in self.audio_entries() {
            map.insert(key, Value::String(reference.to_string()));
        }
        Value::Object(map)
    }
}

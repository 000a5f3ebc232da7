use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum selections assumed for multi-answer questions that do not declare one.
pub const DEFAULT_MIN_SELECTIONS: u32 = 3;

/// Supported question kinds, using the authoring codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum QuestionType {
    #[serde(rename = "SA")]
    SingleAnswer,
    #[serde(rename = "MA")]
    MultiAnswer,
    #[serde(rename = "OE")]
    OpenEnded,
}

/// One selectable choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Comparison applied by a branching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Textual equality with the answer.
    Equals,
    /// Textual inequality with the answer.
    NotEquals,
    /// A multi answer holds the value.
    Contains,
    /// Some selected value or the text mentions the value as a substring.
    Mentions,
}

/// Authored branching rule attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogicRule {
    pub condition: Condition,
    pub value: String,
    pub jump_to_question: String,
}

/// Definition of a single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question_type: QuestionType,
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_subtext: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logic: Vec<LogicRule>,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u32>,
    /// Statements of the attribute matrix; brands are picked per statement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
}

fn default_required() -> bool {
    true
}

impl Question {
    pub fn new(id: impl Into<String>, kind: QuestionType, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question_type: kind,
            question_text: text.into(),
            question_subtext: None,
            options: Vec::new(),
            logic: Vec::new(),
            is_required: true,
            min_selections: None,
            max_selections: None,
            attributes: Vec::new(),
            display_order: None,
        }
    }

    pub fn is_matrix(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Effective minimum for multi-answer questions.
    pub fn min_selections(&self) -> u32 {
        self.min_selections.unwrap_or(DEFAULT_MIN_SELECTIONS)
    }

    /// Effective maximum; `0` means unbounded.
    pub fn max_selections(&self) -> u32 {
        self.max_selections.unwrap_or(0)
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.value == value)
    }

    pub fn label_for<'a>(&'a self, value: &'a str) -> &'a str {
        self.option(value)
            .map(|option| option.label.as_str())
            .unwrap_or(value)
    }

    /// Attribute ids (`a`, `b`, ...) paired with their statements.
    pub fn attribute_ids(&self) -> impl Iterator<Item = (String, &str)> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(index, statement)| (letter_suffix(index), statement.as_str()))
    }
}

/// Spreadsheet-style lowercase suffix: 0 -> `a`, 25 -> `z`, 26 -> `aa`.
pub fn letter_suffix(index: usize) -> String {
    let mut remaining = index + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(char::from(b'a' + rem as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_suffix_rolls_over() {
        assert_eq!(letter_suffix(0), "a");
        assert_eq!(letter_suffix(1), "b");
        assert_eq!(letter_suffix(25), "z");
        assert_eq!(letter_suffix(26), "aa");
    }

    #[test]
    fn question_defaults_follow_authoring_shape() {
        let question: Question = serde_json::from_value(serde_json::json!({
            "id": "P1",
            "questionType": "MA",
            "questionText": "Brands?"
        }))
        .expect("deserialize");
        assert!(question.is_required);
        assert_eq!(question.min_selections(), DEFAULT_MIN_SELECTIONS);
        assert_eq!(question.max_selections(), 0);
        assert!(!question.is_matrix());
    }
}

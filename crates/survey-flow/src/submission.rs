use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{Answer, AnswerStore};
use crate::spec::{Catalog, Question};

/// Submitted form of one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SubmittedValue {
    /// Option label, raw text or the encoded attribute matrix.
    Text(String),
    Labels(Vec<String>),
}

/// Payload handed to the submission sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Submission {
    pub answers: BTreeMap<String, SubmittedValue>,
    /// Audio references keyed by `{id}_audio`; never part of `answers`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio: BTreeMap<String, String>,
}

/// Normalizes stored answers to labels using the resolved catalog.
pub fn build_submission(catalog: &Catalog, answers: &AnswerStore) -> Submission {
    let mut submission = Submission::default();
    for (id, answer) in answers.iter() {
        let question = catalog.question(id);
        let value = match answer {
            Answer::Single(value) => SubmittedValue::Text(label(question, value)),
            Answer::Multi(values) => SubmittedValue::Labels(
                values.iter().map(|value| label(question, value)).collect(),
            ),
            Answer::Text(text) => SubmittedValue::Text(text.clone()),
            Answer::Matrix(cells) => SubmittedValue::Text(encode_matrix(question, cells)),
        };
        submission.answers.insert(id.to_string(), value);
    }
    submission.audio = answers
        .audio_entries()
        .map(|(key, reference)| (key, reference.to_string()))
        .collect();
    submission
}

fn label(question: Option<&Question>, value: &str) -> String {
    question
        .map(|question| question.label_for(value))
        .unwrap_or(value)
        .to_string()
}

/// `a:1,5|b:3`, statements in authored order, empty statements omitted.
pub fn encode_matrix(question: Option<&Question>, cells: &BTreeMap<String, Vec<String>>) -> String {
    let order: Vec<String> = match question {
        Some(question) => question.attribute_ids().map(|(id, _)| id).collect(),
        None => cells.keys().cloned().collect(),
    };
    order
        .iter()
        .filter_map(|attribute| {
            let values = cells.get(attribute)?;
            (!values.is_empty()).then(|| format!("{attribute}:{}", values.join(",")))
        })
        .collect::<Vec<_>>()
        .join("|")
}

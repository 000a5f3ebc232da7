use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::error::FlowError;
use crate::spec::question::Question;

/// Ordered question list; catalog indices are the positions used by the flow resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    /// Builds a catalog, ordering by `displayOrder` when authored (stable otherwise).
    pub fn new(mut questions: Vec<Question>) -> Result<Self, FlowError> {
        let mut seen = BTreeSet::new();
        for question in &questions {
            if !seen.insert(question.id.as_str()) {
                return Err(FlowError::CatalogLoad(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
        }
        if questions.iter().any(|q| q.display_order.is_some()) {
            questions.sort_by_key(|q| q.display_order.unwrap_or(i64::MAX));
        }
        Ok(Self { questions })
    }

    pub fn from_json(raw: &str) -> Result<Self, FlowError> {
        let questions: Vec<Question> = serde_json::from_str(raw)
            .map_err(|err| FlowError::CatalogLoad(format!("invalid catalog json: {err}")))?;
        Self::new(questions)
    }

    pub fn from_value(value: Value) -> Result<Self, FlowError> {
        let questions: Vec<Question> = serde_json::from_value(value)
            .map_err(|err| FlowError::CatalogLoad(format!("invalid catalog json: {err}")))?;
        Self::new(questions)
    }

    pub(crate) fn from_resolved(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Id to position lookup used by the resolvers.
    pub fn index_map(&self) -> BTreeMap<&str, usize> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, q)| (q.id.as_str(), index))
            .collect()
    }

    /// Ids that appear as a jump target of any rule.
    pub fn declared_targets(&self) -> BTreeSet<&str> {
        self.questions
            .iter()
            .flat_map(|q| q.logic.iter())
            .map(|rule| rule.jump_to_question.as_str())
            .collect()
    }

    /// Authoring problems that do not block loading; the resolvers ignore the offending rules.
    ///
    /// Jumps to `terminal` are accepted even when the catalog does not author it.
    pub fn integrity_issues(&self, terminal: &str) -> Vec<FlowError> {
        let mut ids: BTreeSet<&str> = self.questions.iter().map(|q| q.id.as_str()).collect();
        ids.insert(terminal);
        self.questions
            .iter()
            .flat_map(|q| {
                q.logic
                    .iter()
                    .filter(|rule| !ids.contains(rule.jump_to_question.as_str()))
                    .map(|rule| FlowError::UnresolvedJumpTarget {
                        question_id: q.id.clone(),
                        target: rule.jump_to_question.clone(),
                    })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

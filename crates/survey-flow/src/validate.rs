use crate::answers::{Answer, AnswerStore};
use crate::error::{FlowError, MissingAnswer};
use crate::spec::{Question, QuestionType};

/// Checks whether the respondent may leave `question`.
pub fn check_advance(question: &Question, answers: &AnswerStore) -> Result<(), FlowError> {
    missing_reason(question, answers).map_or(Ok(()), |reason| {
        Err(FlowError::RequiredAnswerMissing {
            question_id: question.id.clone(),
            reason,
        })
    })
}

fn missing_reason(question: &Question, answers: &AnswerStore) -> Option<MissingAnswer> {
    if !question.is_required {
        return None;
    }
    let answer = answers.get(&question.id);

    // The attribute matrix is complete only when every statement has a brand.
    if question.is_matrix() {
        let cells = match answer {
            Some(Answer::Matrix(cells)) => Some(cells),
            _ => None,
        };
        return question.attribute_ids().find_map(|(attribute, _)| {
            let filled = cells
                .and_then(|cells| cells.get(&attribute))
                .is_some_and(|values| !values.is_empty());
            (!filled).then_some(MissingAnswer::IncompleteMatrix { attribute })
        });
    }

    match question.question_type {
        QuestionType::MultiAnswer => {
            let Some(Answer::Multi(values)) = answer else {
                return Some(MissingAnswer::NoSelection);
            };
            let count = values.len() as u32;
            let min = question.min_selections();
            let max = question.max_selections();
            if min > 0 && count < min {
                Some(MissingAnswer::TooFewSelections { min })
            } else if max > 0 && count > max {
                Some(MissingAnswer::TooManySelections { max })
            } else {
                None
            }
        }
        QuestionType::OpenEnded => {
            let has_text = answer.is_some_and(|answer| !answer.is_empty());
            let has_audio = answers.audio(&question.id).is_some();
            (!has_text && !has_audio).then_some(MissingAnswer::EmptyText)
        }
        QuestionType::SingleAnswer => answer
            .is_none_or(Answer::is_empty)
            .then_some(MissingAnswer::NoSelection),
    }
}

use thiserror::Error;

/// Reason a question cannot be left yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingAnswer {
    #[error("please select an option")]
    NoSelection,
    #[error("please select at least {min} option(s)")]
    TooFewSelections { min: u32 },
    #[error("please select at most {max} option(s)")]
    TooManySelections { max: u32 },
    #[error("please provide an answer")]
    EmptyText,
    #[error("please select at least one brand for statement '{attribute}'")]
    IncompleteMatrix { attribute: String },
}

/// Errors produced by the survey engine.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("catalog load failed: {0}")]
    CatalogLoad(String),
    #[error("question '{question_id}' accepts at most {max} selection(s)")]
    SelectionLimitExceeded { question_id: String, max: u32 },
    #[error("question '{question_id}' is incomplete: {reason}")]
    RequiredAnswerMissing {
        question_id: String,
        reason: MissingAnswer,
    },
    #[error("rule on '{question_id}' jumps to unknown question '{target}'")]
    UnresolvedJumpTarget { question_id: String, target: String },
    #[error("unknown question '{0}'")]
    UnknownQuestion(String),
    #[error("question '{question_id}' expects a {expected} answer")]
    AnswerKindMismatch {
        question_id: String,
        expected: &'static str,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

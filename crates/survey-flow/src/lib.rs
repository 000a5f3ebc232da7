#![allow(missing_docs)]

pub mod answers;
pub mod condition;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod flow;
pub mod piping;
pub mod respondent;
pub mod schema;
pub mod spec;
pub mod submission;
pub mod template;
pub mod validate;

pub use answers::{AUDIO_SUFFIX, Answer, AnswerStore, Toggle};
pub use cursor::{Advance, Cursor};
pub use engine::{Resolution, recompute};
pub use error::{FlowError, MissingAnswer};
pub use flow::{ActivePositions, FlowResolution, FlowResolver};
pub use piping::{OrderedSampler, PipingResolver, PipingState, RandomSampler, Sampler};
pub use respondent::{LatestPurchase, RespondentMetadata, UserStatus};
pub use schema::{catalog_schema, config_schema, respondent_schema};
pub use spec::{
    Catalog, Condition, LogicRule, PipingPlan, Projection, Question, QuestionOption,
    QuestionType, RoutingPolicy, SurveyConfig,
};
pub use submission::{Submission, SubmittedValue, build_submission};
pub use template::{ResolutionMode, TemplateContext, TemplateEngine, TemplateError};
pub use validate::check_advance;

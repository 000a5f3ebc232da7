pub mod catalog;
pub mod piping;
pub mod question;
pub mod routing;

pub use catalog::Catalog;
pub use piping::{PerceptionSpec, PipingPlan, Projection, TextOverride};
pub use question::{Condition, LogicRule, Question, QuestionOption, QuestionType};
pub use routing::{FloorEntry, Refinement, RoutingPolicy, ScreeningRule, StatusBranch};

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Survey-specific configuration document: routing policy plus piping plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveyConfig {
    #[serde(default)]
    pub routing: RoutingPolicy,
    #[serde(default)]
    pub piping: PipingPlan,
}

impl SurveyConfig {
    pub fn from_json(raw: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Distinct question ids named by routing and piping.
    pub fn referenced_questions(&self) -> BTreeSet<&str> {
        self.routing
            .referenced_questions()
            .into_iter()
            .chain(self.piping.referenced_questions())
            .collect()
    }
}

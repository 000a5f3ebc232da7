use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::respondent::UserStatus;
use crate::spec::question::Condition;

/// Id of the terminal sentinel question unless configured otherwise.
pub const DEFAULT_TERMINAL: &str = "END";

/// Metadata-driven routing applied on top of the authored rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPolicy {
    #[serde(default = "default_terminal")]
    pub terminal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screening: Option<ScreeningRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_branches: Vec<StatusBranch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floor: Vec<FloorEntry>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            terminal: default_terminal(),
            screening: None,
            status_branches: Vec::new(),
            floor: Vec::new(),
        }
    }
}

fn default_terminal() -> String {
    DEFAULT_TERMINAL.into()
}

impl RoutingPolicy {
    /// Branch that applies to `status`, first match wins.
    pub fn branch_for(&self, status: UserStatus) -> Option<&StatusBranch> {
        self.status_branches
            .iter()
            .find(|branch| branch.statuses.contains(&status))
    }

    /// Every question id the policy names. The terminal counts only with screening.
    pub fn referenced_questions(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        if let Some(screening) = &self.screening {
            ids.push(screening.question_id.as_str());
            ids.push(self.terminal.as_str());
        }
        for branch in &self.status_branches {
            ids.extend(branch.exclude.iter().chain(&branch.include).map(String::as_str));
            for refinement in &branch.refinements {
                ids.push(refinement.question_id.as_str());
                ids.extend(
                    refinement
                        .exclude
                        .iter()
                        .chain(&refinement.include)
                        .map(String::as_str),
                );
            }
        }
        ids.extend(self.floor.iter().map(|entry| entry.question_id.as_str()));
        ids
    }

    /// Floor question ids that apply to `status`.
    pub fn floor_for(&self, status: UserStatus) -> impl Iterator<Item = &str> {
        self.floor
            .iter()
            .filter(move |entry| !entry.unless_status.contains(&status))
            .map(|entry| entry.question_id.as_str())
    }
}

/// Early-termination screening keyed by region class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningRule {
    pub question_id: String,
    #[serde(default)]
    pub metro_regions: Vec<String>,
    #[serde(default)]
    pub metro_terminating: Vec<String>,
    #[serde(default)]
    pub other_terminating: Vec<String>,
}

impl ScreeningRule {
    pub fn is_metro(&self, province: &str) -> bool {
        self.metro_regions.iter().any(|region| region == province)
    }

    /// Whether `answer` ends the survey for a respondent in `province`.
    pub fn terminates(&self, province: &str, answer: &str) -> bool {
        let answer = answer.trim();
        if answer.is_empty() {
            return false;
        }
        let terminating = if self.is_metro(province) {
            &self.metro_terminating
        } else {
            &self.other_terminating
        };
        terminating.iter().any(|value| value == answer)
    }
}

/// Forced exclusions and inclusions for a set of customer statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusBranch {
    pub statuses: Vec<UserStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<Refinement>,
}

/// Extra exclusions/inclusions triggered by an answer within a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Refinement {
    pub question_id: String,
    pub condition: Condition,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

/// Critical question re-admitted after all exclusions unless the flow terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FloorEntry {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unless_status: Vec<UserStatus>,
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANCHOR_VALUE: &str = "1";
pub const DEFAULT_SAMPLE_SIZE: usize = 4;
pub const DEFAULT_PERCEPTION_COUNT: usize = 3;

/// How answers of earlier questions shape later questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipingPlan {
    /// Question whose authored options form the brand universe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_source: Option<String>,
    #[serde(default = "default_anchor_value")]
    pub anchor_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projections: Vec<Projection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perception: Option<PerceptionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_overrides: Vec<TextOverride>,
}

impl Default for PipingPlan {
    fn default() -> Self {
        Self {
            brand_source: None,
            anchor_value: default_anchor_value(),
            projections: Vec::new(),
            perception: None,
            text_overrides: Vec::new(),
        }
    }
}

impl PipingPlan {
    /// Every authored question id the plan reads from or writes to.
    pub fn referenced_questions(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.brand_source.iter().map(String::as_str).collect();
        for projection in &self.projections {
            ids.push(projection.target());
            ids.extend(projection.sources());
        }
        if let Some(perception) = &self.perception {
            ids.push(&perception.anchor_question);
            ids.extend(perception.sources.iter().map(String::as_str));
        }
        ids.extend(self.text_overrides.iter().map(|o| o.question_id.as_str()));
        ids
    }
}

fn default_anchor_value() -> String {
    DEFAULT_ANCHOR_VALUE.into()
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_perception_count() -> usize {
    DEFAULT_PERCEPTION_COUNT
}

/// Option projection for one target question. Pools keep their authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Brand options selected in `source`.
    #[serde(rename_all = "camelCase")]
    CarryForward { target: String, source: String },
    /// Brand options selected in `include` but not in `exclude`.
    #[serde(rename_all = "camelCase")]
    Difference {
        target: String,
        include: String,
        exclude: String,
    },
    /// Brand options selected in any of `sources`.
    #[serde(rename_all = "camelCase")]
    Union {
        target: String,
        sources: Vec<String>,
        #[serde(default)]
        exclude_anchor: bool,
    },
    /// The anchor brand followed by a cached random sample of the union of `sources`.
    #[serde(rename_all = "camelCase")]
    AnchorSample {
        target: String,
        sources: Vec<String>,
        #[serde(default = "default_sample_size")]
        sample_size: usize,
    },
    /// Options of `options_from` kept only when selected in `gated_by`.
    #[serde(rename_all = "camelCase")]
    AnswerGated {
        target: String,
        options_from: String,
        gated_by: String,
    },
}

impl Projection {
    pub fn target(&self) -> &str {
        match self {
            Projection::CarryForward { target, .. }
            | Projection::Difference { target, .. }
            | Projection::Union { target, .. }
            | Projection::AnchorSample { target, .. }
            | Projection::AnswerGated { target, .. } => target,
        }
    }

    /// Questions whose answers or options feed the projection.
    pub fn sources(&self) -> Vec<&str> {
        match self {
            Projection::CarryForward { source, .. } => vec![source.as_str()],
            Projection::Difference {
                include, exclude, ..
            } => vec![include.as_str(), exclude.as_str()],
            Projection::Union { sources, .. } | Projection::AnchorSample { sources, .. } => {
                sources.iter().map(String::as_str).collect()
            }
            Projection::AnswerGated {
                options_from,
                gated_by,
                ..
            } => vec![options_from.as_str(), gated_by.as_str()],
        }
    }
}

/// Generated perception questions, one per sampled brand, placed after `anchor_question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerceptionSpec {
    pub anchor_question: String,
    /// Family prefix; generated ids are the prefix plus `b`, `c`, ...
    pub id_prefix: String,
    pub sources: Vec<String>,
    #[serde(default = "default_perception_count")]
    pub count: usize,
    /// Handlebars template; `{{brand}}` is the brand label.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
}

/// Text replacement rendered from the respondent's latest purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextOverride {
    pub question_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
}

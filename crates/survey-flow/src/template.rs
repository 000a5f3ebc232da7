use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde_json::{Map, Value, json};
use thiserror::Error;
use time::macros::format_description;

use crate::answers::AnswerStore;
use crate::respondent::{LatestPurchase, RespondentMetadata};
use crate::spec::Question;

/// Modes describing how unresolvable placeholders are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Render failures are reported.
    Strict,
    /// Render failures keep the authored text.
    Relaxed,
}

/// Errors raised while rendering question texts.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template render error: {0}")]
    Render(String),
}

/// Values available to question text templates.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub respondent: Value,
    pub purchase: Option<Value>,
    pub answers: Value,
    pub brand: Option<String>,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self {
            respondent: Value::Object(Map::new()),
            purchase: None,
            answers: Value::Object(Map::new()),
            brand: None,
        }
    }
}

impl TemplateContext {
    /// Exposes province, status and the latest purchase.
    pub fn with_respondent(mut self, respondent: &RespondentMetadata) -> Self {
        self.respondent = json!({
            "province": respondent.province(),
            "userStatus": respondent.user_status,
        });
        self.purchase = respondent.latest_purchase.as_ref().map(purchase_value);
        self
    }

    pub fn with_answers(mut self, answers: &AnswerStore) -> Self {
        self.answers = answers.to_json();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("respondent".into(), self.respondent.clone());
        map.insert("answers".into(), self.answers.clone());
        if let Some(purchase) = &self.purchase {
            map.insert("purchase".into(), purchase.clone());
        }
        if let Some(brand) = &self.brand {
            map.insert("brand".into(), Value::String(brand.clone()));
        }
        Value::Object(map)
    }
}

fn purchase_value(purchase: &LatestPurchase) -> Value {
    let date = purchase
        .date()
        .and_then(|date| {
            date.format(format_description!(
                "[day padding:none] [month repr:long] [year]"
            ))
            .ok()
        })
        .or_else(|| purchase.purchase_date.clone())
        .unwrap_or_default();
    json!({
        "brand": purchase.brand.clone().unwrap_or_default(),
        "productType": purchase.product_type.clone().unwrap_or_default(),
        "productName": purchase.product_name.clone().unwrap_or_default(),
        "description": purchase.description(),
        "date": date,
        "storeLocation": purchase.store_location.clone().unwrap_or_default(),
    })
}

/// Handlebars engine for question texts; output is never HTML-escaped.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    mode: ResolutionMode,
}

impl TemplateEngine {
    pub fn new(mode: ResolutionMode) -> Self {
        let mut handlebars = Handlebars::new();
        register_helpers(&mut handlebars);
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars, mode }
    }

    pub fn resolve_string(
        &self,
        template: &str,
        ctx: &TemplateContext,
    ) -> Result<String, TemplateError> {
        if !template.contains("{{") {
            return Ok(template.to_owned());
        }
        match self.handlebars.render_template(template, &ctx.to_value()) {
            Ok(result) => Ok(result),
            Err(err) => match self.mode {
                ResolutionMode::Relaxed => Ok(template.to_owned()),
                ResolutionMode::Strict => Err(TemplateError::Render(err.to_string())),
            },
        }
    }

    /// Renders the text and subtext of a question.
    pub fn resolve_question(
        &self,
        question: &Question,
        ctx: &TemplateContext,
    ) -> Result<Question, TemplateError> {
        let mut resolved = question.clone();
        resolved.question_text = self.resolve_string(&question.question_text, ctx)?;
        resolved.question_subtext = question
            .question_subtext
            .as_ref()
            .map(|value| self.resolve_string(value, ctx))
            .transpose()?;
        Ok(resolved)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(ResolutionMode::Relaxed)
    }
}

pub fn register_helpers(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper("default", Box::new(helper_default));
}

fn helper_default(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = h.param(0).map(|param| param.value());
    let fallback = h.param(1).map(|param| param.value());
    let rendered = match value {
        Some(value) if has_content(value) => display_value(value),
        _ => fallback.map(display_value).unwrap_or_default(),
    };
    out.write(&rendered)?;
    Ok(())
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Derives the concrete catalog for an answer state: carried-forward option
//! lists, sampled brand sets, generated perception questions and purchase
//! dependent texts.
//!
//! Sampling state is owned by the resolver so that repeated resolutions of an
//! unchanged answer state return the same catalog.

pub mod sampler;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::answers::AnswerStore;
use crate::respondent::RespondentMetadata;
use crate::spec::question::letter_suffix;
use crate::spec::{Catalog, PerceptionSpec, PipingPlan, Projection, Question, QuestionOption};
use crate::template::{ResolutionMode, TemplateContext, TemplateEngine};

pub use sampler::{OrderedSampler, RandomSampler, Sampler};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedSample {
    key: String,
    values: Vec<String>,
}

/// Session-scoped sampling caches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipingState {
    samples: BTreeMap<String, CachedSample>,
    perception: Option<CachedSample>,
    materialized: Option<usize>,
}

/// Turns the template catalog into the catalog shown for the current answers.
pub struct PipingResolver {
    plan: PipingPlan,
    sampler: Box<dyn Sampler>,
    templates: TemplateEngine,
    state: PipingState,
}

impl PipingResolver {
    pub fn new(plan: PipingPlan, sampler: Box<dyn Sampler>) -> Self {
        Self {
            plan,
            sampler,
            templates: TemplateEngine::new(ResolutionMode::Strict),
            state: PipingState::default(),
        }
    }

    /// Resolver backed by an entropy-seeded [`RandomSampler`].
    pub fn with_random_sampler(plan: PipingPlan) -> Self {
        Self::new(plan, Box::new(RandomSampler::from_entropy()))
    }

    pub fn plan(&self) -> &PipingPlan {
        &self.plan
    }

    pub fn state(&self) -> &PipingState {
        &self.state
    }

    /// Number of generated perception questions, fixed once they first appear.
    pub fn materialized_count(&self) -> Option<usize> {
        self.state.materialized
    }

    /// Forgets every cached sample and the materialization.
    pub fn reset(&mut self) {
        self.state = PipingState::default();
    }

    pub fn resolve(
        &mut self,
        template: &Catalog,
        answers: &AnswerStore,
        respondent: &RespondentMetadata,
    ) -> Catalog {
        let universe = self.brand_universe(template);
        let ctx = TemplateContext::default()
            .with_respondent(respondent)
            .with_answers(answers);

        let mut questions: Vec<Question> = template
            .iter()
            .map(|question| self.render_question(question, &ctx))
            .collect();
        self.apply_text_overrides(&mut questions, respondent, &ctx);

        if let Some(spec) = self.plan.perception.clone() {
            self.materialize_perception(&spec, &mut questions, &universe, answers, &ctx);
        }

        let projections = self.plan.projections.clone();
        for projection in &projections {
            let options = self.project(projection, &questions, template, &universe, answers);
            match questions.iter_mut().find(|q| q.id == projection.target()) {
                Some(target) => {
                    debug!(question_id = %target.id, options = options.len(), "piped options");
                    target.options = options;
                }
                None => {
                    debug!(question_id = %projection.target(), "projection target not in catalog")
                }
            }
        }

        Catalog::from_resolved(questions)
    }

    fn brand_universe(&self, template: &Catalog) -> Vec<QuestionOption> {
        self.plan
            .brand_source
            .as_deref()
            .and_then(|id| template.question(id))
            .map(|question| question.options.clone())
            .unwrap_or_default()
    }

    fn render(&self, text: &str, ctx: &TemplateContext) -> String {
        match self.templates.resolve_string(text, ctx) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(error = %err, "keeping authored text");
                text.to_owned()
            }
        }
    }

    fn render_question(&self, question: &Question, ctx: &TemplateContext) -> Question {
        match self.templates.resolve_question(question, ctx) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(question_id = %question.id, error = %err, "keeping authored text");
                question.clone()
            }
        }
    }

    fn apply_text_overrides(
        &self,
        questions: &mut [Question],
        respondent: &RespondentMetadata,
        ctx: &TemplateContext,
    ) {
        if respondent.latest_purchase.is_none() {
            return;
        }
        for text_override in &self.plan.text_overrides {
            let Some(question) = questions
                .iter_mut()
                .find(|q| q.id == text_override.question_id)
            else {
                continue;
            };
            question.question_text = self.render(&text_override.text, ctx);
            if let Some(subtext) = &text_override.subtext {
                question.question_subtext = Some(self.render(subtext, ctx));
            }
        }
    }

    fn materialize_perception(
        &mut self,
        spec: &PerceptionSpec,
        questions: &mut Vec<Question>,
        universe: &[QuestionOption],
        answers: &AnswerStore,
        ctx: &TemplateContext,
    ) {
        let anchor = self.plan.anchor_value.clone();
        let union: Vec<String> = union_values(answers, &spec.sources)
            .into_iter()
            .filter(|value| *value != anchor)
            .collect();
        if self.state.materialized.is_none() && union.is_empty() {
            return;
        }

        let count = self.state.materialized.unwrap_or(spec.count);
        let key = source_key(answers, &spec.sources);
        let cached = self
            .state
            .perception
            .as_ref()
            .filter(|cache| cache.key == key)
            .map(|cache| cache.values.clone());
        let brands = match cached {
            Some(values) => values,
            None => {
                let previous = self
                    .state
                    .perception
                    .take()
                    .map(|cache| cache.values)
                    .unwrap_or_default();
                let picked = self.pick_perception_brands(union, universe, &anchor, count, previous);
                debug!(brands = ?picked, "sampled perception brands");
                self.state.perception = Some(CachedSample {
                    key,
                    values: picked.clone(),
                });
                picked
            }
        };

        let Some(anchor_index) = questions.iter().position(|q| q.id == spec.anchor_question)
        else {
            warn!(question_id = %spec.anchor_question, "perception anchor question missing");
            return;
        };
        let base = questions[anchor_index].clone();
        questions.retain(|q| q.id == spec.anchor_question || !q.id.starts_with(&spec.id_prefix));
        let anchor_index = questions
            .iter()
            .position(|q| q.id == spec.anchor_question)
            .unwrap_or(anchor_index);

        let generated: Vec<Question> = brands
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let label = brand_label(universe, value);
                let brand_ctx = ctx.clone().with_brand(label);
                let mut question = base.clone();
                question.id = format!("{}{}", spec.id_prefix, letter_suffix(index + 1));
                question.logic.clear();
                question.question_text = self.render(&spec.text, &brand_ctx);
                question.question_subtext = spec
                    .subtext
                    .as_ref()
                    .map(|subtext| self.render(subtext, &brand_ctx));
                question
            })
            .collect();

        if self.state.materialized.is_none() {
            info!(count = generated.len(), "materialized perception questions");
            self.state.materialized = Some(generated.len());
        }
        let insert_at = anchor_index + 1;
        questions.splice(insert_at..insert_at, generated);
    }

    fn pick_perception_brands(
        &mut self,
        mut pool: Vec<String>,
        universe: &[QuestionOption],
        anchor: &str,
        count: usize,
        previous: Vec<String>,
    ) -> Vec<String> {
        self.sampler.shuffle(&mut pool);
        if pool.len() < count {
            let mut padding: Vec<String> = universe
                .iter()
                .map(|option| option.value.clone())
                .filter(|value| value != anchor && !pool.contains(value))
                .collect();
            self.sampler.shuffle(&mut padding);
            let needed = count - pool.len();
            pool.extend(padding.into_iter().take(needed));
        }
        for value in previous {
            if pool.len() >= count {
                break;
            }
            if !pool.contains(&value) {
                pool.push(value);
            }
        }
        pool.truncate(count);
        pool
    }

    fn project(
        &mut self,
        projection: &Projection,
        piped: &[Question],
        template: &Catalog,
        universe: &[QuestionOption],
        answers: &AnswerStore,
    ) -> Vec<QuestionOption> {
        match projection {
            Projection::CarryForward { source, .. } => {
                let selected = answers.selected(source);
                let pool = source_pool(piped, template, source, universe);
                filter_options(pool, |value| selected.contains(&value))
            }
            Projection::Difference {
                include, exclude, ..
            } => {
                let included = answers.selected(include);
                let excluded = answers.selected(exclude);
                let pool = source_pool(piped, template, include, universe);
                filter_options(pool, |value| {
                    included.contains(&value) && !excluded.contains(&value)
                })
            }
            Projection::Union {
                sources,
                exclude_anchor,
                ..
            } => {
                let union = union_values(answers, sources);
                let anchor = self.plan.anchor_value.as_str();
                filter_options(universe, |value| {
                    union.iter().any(|selected| selected == value)
                        && !(*exclude_anchor && value == anchor)
                })
            }
            Projection::AnchorSample {
                target,
                sources,
                sample_size,
            } => self.anchor_sample(target, sources, *sample_size, universe, answers),
            Projection::AnswerGated {
                options_from,
                gated_by,
                ..
            } => {
                let selected = answers.selected(gated_by);
                let pool = template
                    .question(options_from)
                    .map(|question| question.options.as_slice())
                    .unwrap_or_default();
                filter_options(pool, |value| selected.contains(&value))
            }
        }
    }

    fn anchor_sample(
        &mut self,
        target: &str,
        sources: &[String],
        sample_size: usize,
        universe: &[QuestionOption],
        answers: &AnswerStore,
    ) -> Vec<QuestionOption> {
        let anchor = self.plan.anchor_value.clone();
        let union = union_values(answers, sources);
        if union.is_empty() {
            return Vec::new();
        }
        let key = source_key(answers, sources);
        let picked = match self.state.samples.get(target) {
            Some(cache) if cache.key == key => cache.values.clone(),
            _ => {
                let mut others: Vec<String> = union
                    .into_iter()
                    .filter(|value| *value != anchor)
                    .filter(|value| universe.iter().any(|option| option.value == *value))
                    .collect();
                self.sampler.shuffle(&mut others);
                others.truncate(sample_size);
                debug!(question_id = %target, sample = ?others, "sampled brands");
                self.state.samples.insert(
                    target.to_string(),
                    CachedSample {
                        key,
                        values: others.clone(),
                    },
                );
                others
            }
        };
        filter_options(universe, |value| {
            value == anchor || picked.iter().any(|selected| selected == value)
        })
    }
}

/// Options of `source` as already piped, else as authored, else the brand universe.
fn source_pool<'a>(
    piped: &'a [Question],
    template: &'a Catalog,
    source: &str,
    universe: &'a [QuestionOption],
) -> &'a [QuestionOption] {
    piped
        .iter()
        .find(|question| question.id == source)
        .map(|question| question.options.as_slice())
        .filter(|options| !options.is_empty())
        .or_else(|| {
            template
                .question(source)
                .map(|question| question.options.as_slice())
                .filter(|options| !options.is_empty())
        })
        .unwrap_or(universe)
}

fn filter_options(
    pool: &[QuestionOption],
    keep: impl Fn(&str) -> bool,
) -> Vec<QuestionOption> {
    pool.iter()
        .filter(|option| keep(option.value.as_str()))
        .cloned()
        .collect()
}

/// Values selected in any of `sources`, in first-seen order.
fn union_values(answers: &AnswerStore, sources: &[String]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for source in sources {
        for value in answers.selected(source) {
            if !values.iter().any(|existing| existing == value) {
                values.push(value.to_string());
            }
        }
    }
    values
}

/// Order-insensitive fingerprint of the source answers.
fn source_key(answers: &AnswerStore, sources: &[String]) -> String {
    sources
        .iter()
        .map(|source| {
            let mut selected = answers.selected(source);
            selected.sort_unstable();
            format!("{source}={}", selected.join(","))
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn brand_label(universe: &[QuestionOption], value: &str) -> String {
    universe
        .iter()
        .find(|option| option.value == value)
        .map(|option| option.label.clone())
        .unwrap_or_else(|| format!("Brand {value}"))
}

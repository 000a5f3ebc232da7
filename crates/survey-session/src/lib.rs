mod collaborators;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use survey_flow::{
    AUDIO_SUFFIX, ActivePositions, Advance, AnswerStore, Catalog, Cursor, FlowError,
    PipingResolver, Question, RandomSampler, Resolution, RespondentMetadata, RoutingPolicy,
    Sampler, Submission, SurveyConfig, Toggle, build_submission, check_advance, recompute,
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use collaborators::{CatalogFile, CatalogSource, JsonCatalog, MemorySink, SubmissionSink};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("catalog could not be loaded: {0}")]
    CatalogLoadFailure(String),
    #[error("submission failed: {0}")]
    SubmissionFailure(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("no catalog loaded")]
    NotLoaded,
    #[error("survey already submitted")]
    Completed,
}

struct Loaded {
    template: Catalog,
    resolution: Resolution,
}

/// One respondent working through a survey.
///
/// Every mutation re-pipes the catalog and re-resolves the flow before it
/// returns, so reads always reflect the current answers.
pub struct SurveySession {
    routing: RoutingPolicy,
    respondent: RespondentMetadata,
    piping: PipingResolver,
    answers: AnswerStore,
    loaded: Option<Loaded>,
    complete: bool,
}

impl SurveySession {
    pub fn new(config: SurveyConfig, respondent: RespondentMetadata) -> Self {
        Self::with_sampler(config, respondent, Box::new(RandomSampler::from_entropy()))
    }

    pub fn with_sampler(
        config: SurveyConfig,
        respondent: RespondentMetadata,
        sampler: Box<dyn Sampler>,
    ) -> Self {
        Self {
            routing: config.routing,
            respondent,
            piping: PipingResolver::new(config.piping, sampler),
            answers: AnswerStore::default(),
            loaded: None,
            complete: false,
        }
    }

    /// Fetches the catalog and starts from a blank answer state. Call again to retry.
    pub fn load<S: CatalogSource>(&mut self, source: &mut S) -> Result<(), SessionError> {
        let template = source.fetch().map_err(|err| {
            warn!(error = %err, "catalog fetch failed");
            SessionError::CatalogLoadFailure(err.to_string())
        })?;
        for issue in template.integrity_issues(&self.routing.terminal) {
            warn!(%issue, "catalog integrity");
        }
        info!(questions = template.len(), "catalog loaded");

        self.answers = AnswerStore::for_catalog(&template);
        self.piping.reset();
        self.complete = false;
        let resolution = self.resolve(&template, Cursor::default(), None);
        self.loaded = Some(Loaded {
            template,
            resolution,
        });
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn respondent(&self) -> &RespondentMetadata {
        &self.respondent
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn answers_json(&self) -> Value {
        self.answers.to_json()
    }

    pub fn resolution(&self) -> Result<&Resolution, SessionError> {
        self.loaded
            .as_ref()
            .map(|loaded| &loaded.resolution)
            .ok_or(SessionError::NotLoaded)
    }

    /// Catalog as currently piped.
    pub fn catalog(&self) -> Result<&Catalog, SessionError> {
        Ok(&self.resolution()?.catalog)
    }

    pub fn active(&self) -> Result<&ActivePositions, SessionError> {
        Ok(&self.resolution()?.active)
    }

    pub fn is_terminated(&self) -> bool {
        self.resolution().is_ok_and(|resolution| resolution.terminated)
    }

    pub fn current_question(&self) -> Result<&Question, SessionError> {
        let resolution = self.resolution()?;
        let position = resolution.cursor.position();
        resolution
            .catalog
            .get(position)
            .ok_or_else(|| FlowError::UnknownQuestion(format!("position {position}")).into())
    }

    /// `(ordinal, total)` over the active questions.
    pub fn progress(&self) -> Result<(usize, usize), SessionError> {
        let resolution = self.resolution()?;
        Ok(resolution.cursor.progress(&resolution.active))
    }

    /// Stores a single-answer or open-ended value.
    pub fn answer(
        &mut self,
        question_id: &str,
        value: impl Into<String>,
        audio: Option<String>,
    ) -> Result<(), SessionError> {
        self.writable()?;
        self.question(question_id)?;
        self.answers.set_single(question_id, value, audio)?;
        self.refresh()
    }

    /// Toggles one option of a multi-answer question.
    pub fn toggle(&mut self, question_id: &str, value: &str) -> Result<Toggle, SessionError> {
        self.writable()?;
        let max = self.question(question_id)?.max_selections();
        let toggled = self.answers.toggle_multi(question_id, value, max)?;
        self.refresh()?;
        Ok(toggled)
    }

    /// Toggles one brand for one statement of an attribute matrix.
    pub fn toggle_cell(
        &mut self,
        question_id: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Toggle, SessionError> {
        self.writable()?;
        self.question(question_id)?;
        let toggled = self
            .answers
            .toggle_matrix_cell(question_id, attribute, value)?;
        self.refresh()?;
        Ok(toggled)
    }

    pub fn set_matrix(
        &mut self,
        question_id: &str,
        matrix: BTreeMap<String, Vec<String>>,
    ) -> Result<(), SessionError> {
        self.writable()?;
        self.question(question_id)?;
        self.answers.set_attribute_matrix(question_id, matrix)?;
        self.refresh()
    }

    /// Replaces the answers with a saved answers document.
    ///
    /// Answers to generated questions are applied once the rest of the
    /// document has materialized them.
    pub fn restore(&mut self, answers: &Value) -> Result<(), SessionError> {
        self.writable()?;
        let template = self.template()?;
        self.answers = AnswerStore::from_json(&template, &known_answers(&template, answers))?;
        self.refresh()?;

        let resolved = self.catalog()?;
        let restored = AnswerStore::from_json(resolved, &known_answers(resolved, answers))?;
        self.answers = restored;
        self.refresh()
    }

    /// Moves the cursor onto `question_id`, admitting it to the flow if needed.
    pub fn seek(&mut self, question_id: &str) -> Result<(), SessionError> {
        self.writable()?;
        let position = self
            .catalog()?
            .position(question_id)
            .ok_or_else(|| FlowError::UnknownQuestion(question_id.to_string()))?;
        self.resolution_mut()?.cursor = Cursor::at(position);
        self.refresh()
    }

    /// Validates the current question, then moves to the next active one.
    pub fn next(&mut self) -> Result<Advance, SessionError> {
        self.writable()?;
        check_advance(self.current_question()?, &self.answers)?;
        let resolution = self.resolution_mut()?;
        let advance = resolution.cursor.advance(&resolution.active);
        debug!(?advance, "next");
        Ok(advance)
    }

    /// Moves to the previous active question; stays on the first one.
    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.writable()?;
        let resolution = self.resolution_mut()?;
        Ok(resolution.cursor.retreat(&resolution.active))
    }

    /// Hands the label payload to `sink`. Answers survive a failed submission.
    pub fn submit<S: SubmissionSink>(&mut self, sink: &mut S) -> Result<Submission, SessionError> {
        self.writable()?;
        let submission = build_submission(self.catalog()?, &self.answers);
        sink.submit(&submission).map_err(|err| {
            warn!(error = %err, "submission rejected");
            SessionError::SubmissionFailure(err.to_string())
        })?;
        info!(answers = submission.answers.len(), "survey submitted");
        self.complete = true;
        Ok(submission)
    }

    /// Clears answers, sampling caches and the cursor.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let loaded = self.loaded.take().ok_or(SessionError::NotLoaded)?;
        self.answers.reset(&loaded.template);
        self.piping.reset();
        self.complete = false;
        let resolution = self.resolve(&loaded.template, Cursor::default(), None);
        self.loaded = Some(Loaded {
            template: loaded.template,
            resolution,
        });
        Ok(())
    }

    fn writable(&self) -> Result<(), SessionError> {
        if self.loaded.is_none() {
            return Err(SessionError::NotLoaded);
        }
        if self.complete {
            return Err(SessionError::Completed);
        }
        Ok(())
    }

    fn template(&self) -> Result<Catalog, SessionError> {
        self.loaded
            .as_ref()
            .map(|loaded| loaded.template.clone())
            .ok_or(SessionError::NotLoaded)
    }

    fn question(&self, question_id: &str) -> Result<&Question, SessionError> {
        self.catalog()?
            .question(question_id)
            .ok_or_else(|| FlowError::UnknownQuestion(question_id.to_string()).into())
    }

    fn resolution_mut(&mut self) -> Result<&mut Resolution, SessionError> {
        self.loaded
            .as_mut()
            .map(|loaded| &mut loaded.resolution)
            .ok_or(SessionError::NotLoaded)
    }

    fn resolve(&mut self, template: &Catalog, cursor: Cursor, current: Option<&str>) -> Resolution {
        let resolution = recompute(
            &mut self.piping,
            &self.routing,
            template,
            &self.answers,
            &self.respondent,
            cursor,
            current,
        );
        self.answers.ensure_initialized(&resolution.catalog);
        resolution
    }

    fn refresh(&mut self) -> Result<(), SessionError> {
        let loaded = self.loaded.take().ok_or(SessionError::NotLoaded)?;
        let current = loaded.resolution.current_id().map(str::to_owned);
        let resolution = self.resolve(&loaded.template, loaded.resolution.cursor, current.as_deref());
        self.loaded = Some(Loaded {
            template: loaded.template,
            resolution,
        });
        Ok(())
    }
}

/// Entries of `answers` that belong to questions of `catalog`.
fn known_answers(catalog: &Catalog, answers: &Value) -> Value {
    let Some(object) = answers.as_object() else {
        return answers.clone();
    };
    let known: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| {
            let id = key.strip_suffix(AUDIO_SUFFIX).unwrap_or(key);
            catalog.question(id).is_some()
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(known)
}

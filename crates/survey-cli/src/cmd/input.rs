use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use survey_flow::{RandomSampler, RespondentMetadata, Sampler, SurveyConfig};
use survey_session::{CatalogFile, SurveySession};
use time::Date;
use time::macros::format_description;
use tracing::debug;

/// Inputs needed to rebuild a respondent's session from files.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Question catalog JSON
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,
    /// Routing and piping config JSON
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Respondent metadata JSON (province, userStatus, latestPurchase)
    #[arg(long, value_name = "FILE")]
    pub respondent: Option<PathBuf>,
    /// Saved answers keyed by question id
    #[arg(long, value_name = "FILE")]
    pub answers: Option<PathBuf>,
    /// Question the respondent is currently on
    #[arg(long, value_name = "ID")]
    pub at: Option<String>,
    /// Derive the customer status from the latest purchase as of this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub today: Option<String>,
    /// Seed for brand sampling
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<SurveyConfig> {
    match path {
        Some(path) => read_json(path),
        None => Ok(SurveyConfig::default()),
    }
}

pub fn load_respondent(path: Option<&Path>, today: Option<&str>) -> Result<RespondentMetadata> {
    let respondent: RespondentMetadata = match path {
        Some(path) => read_json(path)?,
        None => RespondentMetadata::default(),
    };
    let Some(today) = today else {
        return Ok(respondent);
    };
    let today = Date::parse(today, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("invalid --today date '{today}'"))?;
    let respondent = respondent.with_status_from_purchase(today);
    debug!(status = ?respondent.user_status, "derived customer status");
    Ok(respondent)
}

/// Loads the catalog, replays the saved answers and places the cursor.
pub fn replay(args: &ReplayArgs) -> Result<SurveySession> {
    let config = load_config(args.config.as_deref())?;
    let respondent = load_respondent(args.respondent.as_deref(), args.today.as_deref())?;
    let sampler: Box<dyn Sampler> = match args.seed {
        Some(seed) => Box::new(RandomSampler::seeded(seed)),
        None => Box::new(RandomSampler::from_entropy()),
    };

    let mut session = SurveySession::with_sampler(config, respondent, sampler);
    session
        .load(&mut CatalogFile(args.catalog.clone()))
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    if let Some(path) = &args.answers {
        let answers: serde_json::Value = read_json(path)?;
        session.restore(&answers).context("failed to restore answers")?;
    }
    if let Some(id) = &args.at {
        session.seek(id)?;
    }
    Ok(session)
}

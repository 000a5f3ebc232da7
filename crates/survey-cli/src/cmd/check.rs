use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::json;
use survey_flow::Catalog;

use super::input::{load_config, read_json};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Question catalog JSON
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,
    /// Routing and piping config JSON to parse alongside the catalog
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Emit a JSON report
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let raw: serde_json::Value = read_json(&args.catalog)?;
    let catalog = Catalog::from_value(raw)
        .with_context(|| format!("invalid catalog {}", args.catalog.display()))?;
    let config = load_config(args.config.as_deref())?;

    let mut issues: Vec<String> = catalog
        .integrity_issues(&config.routing.terminal)
        .iter()
        .map(ToString::to_string)
        .collect();
    for id in config.referenced_questions() {
        if catalog.question(id).is_none() {
            issues.push(format!("config references unknown question '{id}'"));
        }
    }

    if args.json {
        let report = json!({
            "questions": catalog.len(),
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for issue in &issues {
            println!("warning: {issue}");
        }
        println!("{} questions, {} issue(s)", catalog.len(), issues.len());
    }

    if !issues.is_empty() {
        bail!("catalog check failed with {} issue(s)", issues.len());
    }
    Ok(())
}

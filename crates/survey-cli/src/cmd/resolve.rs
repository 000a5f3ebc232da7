use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::input::{ReplayArgs, replay};

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub replay: ReplayArgs,
    /// Emit the resolution as JSON, including the active questions
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let session = replay(&args.replay)?;
    let resolution = session.resolution()?;
    let (ordinal, total) = session.progress()?;
    let current = session.current_question()?;
    let active_ids: Vec<&str> = resolution
        .active
        .iter()
        .filter_map(|position| resolution.catalog.get(position))
        .map(|question| question.id.as_str())
        .collect();

    if args.json {
        let questions: Vec<_> = resolution
            .active
            .iter()
            .filter_map(|position| resolution.catalog.get(position))
            .collect();
        let report = json!({
            "terminated": resolution.terminated,
            "current": current.id,
            "progress": {"ordinal": ordinal, "total": total},
            "active": active_ids,
            "questions": questions,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("terminated: {}", resolution.terminated);
    println!("current: {} ({ordinal}/{total})", current.id);
    println!("active: {}", active_ids.join(" "));
    println!("{}", current.question_text);
    for option in &current.options {
        println!("  [{}] {}", option.value, option.label);
    }
    Ok(())
}

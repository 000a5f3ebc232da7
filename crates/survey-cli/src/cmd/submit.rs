use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use survey_session::MemorySink;
use tracing::info;

use super::input::{ReplayArgs, replay};

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub replay: ReplayArgs,
    /// Write the payload to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub fn run(args: SubmitArgs) -> Result<()> {
    let mut session = replay(&args.replay)?;
    let submission = session.submit(&mut MemorySink::default())?;
    let payload = serde_json::to_string_pretty(&submission)?;
    match &args.out {
        Some(path) => {
            fs::write(path, payload + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote submission");
        }
        None => println!("{payload}"),
    }
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use crate::cmd::{
    self, check::CheckArgs, resolve::ResolveArgs, schema::SchemaArgs, submit::SubmitArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "survey-flow",
    about = "Check survey catalogs and replay respondent answers through the flow engine",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log piping and routing decisions to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a catalog and report unresolved jump targets
    Check(CheckArgs),
    /// Pipe the catalog and resolve the active flow for saved answers
    Resolve(ResolveArgs),
    /// Build the label payload for saved answers
    Submit(SubmitArgs),
    /// Print the JSON schema of an input document
    Schema(SchemaArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Check(args) => cmd::check::run(args),
        Commands::Resolve(args) => cmd::resolve::run(args),
        Commands::Submit(args) => cmd::submit::run(args),
        Commands::Schema(args) => cmd::schema::run(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::schema::SchemaDocument;

    #[test]
    fn parses_resolve_command() {
        let cli = Cli::try_parse_from([
            "survey-flow",
            "resolve",
            "--catalog",
            "catalog.json",
            "--config",
            "config.json",
            "--answers",
            "answers.json",
            "--at",
            "P9a",
            "--seed",
            "7",
            "--json",
            "-v",
        ])
        .expect("expected CLI to parse");
        assert!(cli.verbose);
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.replay.catalog.to_str(), Some("catalog.json"));
                assert_eq!(args.replay.at.as_deref(), Some("P9a"));
                assert_eq!(args.replay.seed, Some(7));
                assert!(args.replay.respondent.is_none());
                assert!(args.json);
            }
            _ => panic!("expected resolve args"),
        }
    }

    #[test]
    fn parses_submit_with_output() {
        let cli = Cli::try_parse_from([
            "survey-flow",
            "submit",
            "--catalog",
            "catalog.json",
            "--today",
            "2025-06-15",
            "--out",
            "payload.json",
        ])
        .expect("expected CLI to parse");
        match cli.command {
            Commands::Submit(args) => {
                assert_eq!(args.replay.today.as_deref(), Some("2025-06-15"));
                assert_eq!(
                    args.out.as_deref().and_then(|path| path.to_str()),
                    Some("payload.json")
                );
            }
            _ => panic!("expected submit args"),
        }
    }

    #[test]
    fn parses_schema_document() {
        let cli = Cli::try_parse_from(["survey-flow", "schema", "respondent"])
            .expect("expected CLI to parse");
        match cli.command {
            Commands::Schema(args) => assert_eq!(args.document, SchemaDocument::Respondent),
            _ => panic!("expected schema args"),
        }
    }

    #[test]
    fn check_requires_catalog() {
        let err = Cli::try_parse_from(["survey-flow", "check"]).expect_err("missing catalog");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}

use anyhow::Result;
use clap::{Args, ValueEnum};
use survey_flow::{catalog_schema, config_schema, respondent_schema};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDocument {
    Catalog,
    Config,
    Respondent,
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Document to describe
    #[arg(value_enum)]
    pub document: SchemaDocument,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let schema = match args.document {
        SchemaDocument::Catalog => catalog_schema(),
        SchemaDocument::Config => config_schema(),
        SchemaDocument::Respondent => respondent_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

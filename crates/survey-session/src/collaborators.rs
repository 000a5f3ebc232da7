use std::fmt::Display;
use std::path::PathBuf;

use survey_flow::{Catalog, FlowError, Submission};

/// Where the question catalog comes from.
pub trait CatalogSource {
    type Error: Display;

    fn fetch(&mut self) -> Result<Catalog, Self::Error>;
}

/// Receives the final answer payload.
pub trait SubmissionSink {
    type Error: Display;

    fn submit(&mut self, submission: &Submission) -> Result<(), Self::Error>;
}

/// Catalog given as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonCatalog(pub String);

impl CatalogSource for JsonCatalog {
    type Error = FlowError;

    fn fetch(&mut self) -> Result<Catalog, FlowError> {
        Catalog::from_json(&self.0)
    }
}

/// Catalog stored as a JSON file, read on every fetch.
#[derive(Debug, Clone)]
pub struct CatalogFile(pub PathBuf);

impl CatalogSource for CatalogFile {
    type Error = FlowError;

    fn fetch(&mut self) -> Result<Catalog, FlowError> {
        let raw = std::fs::read_to_string(&self.0).map_err(|err| {
            FlowError::CatalogLoad(format!("failed to read {}: {err}", self.0.display()))
        })?;
        Catalog::from_json(&raw)
    }
}

impl CatalogSource for Catalog {
    type Error = FlowError;

    fn fetch(&mut self) -> Result<Catalog, FlowError> {
        Ok(self.clone())
    }
}

/// Keeps accepted submissions in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub submissions: Vec<Submission>,
}

impl SubmissionSink for MemorySink {
    type Error = std::convert::Infallible;

    fn submit(&mut self, submission: &Submission) -> Result<(), Self::Error> {
        self.submissions.push(submission.clone());
        Ok(())
    }
}

//! Run report: trait-based format dispatch.

pub mod json;
pub mod text;

use anyhow::{anyhow, Result};
use docsplice::{FileError, FileReport};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of every file in one run, in input order.
#[derive(Debug, Serialize)]
pub struct Report {
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileEntry {
    Processed(FileReport),
    Failed { path: PathBuf, error: String },
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub files: usize,
    pub changed: usize,
    pub inserted: usize,
    pub unresolved: usize,
    pub documented: usize,
    pub failed: usize,
}

impl Report {
    pub fn from_results(results: Vec<Result<FileReport, FileError>>) -> Self {
        let files = results
            .into_iter()
            .map(|result| match result {
                Ok(report) => FileEntry::Processed(report),
                Err(err) => {
                    log::error!("{}", err);
                    FileEntry::Failed {
                        path: err.path().to_path_buf(),
                        error: err.to_string(),
                    }
                }
            })
            .collect();
        Report { files }
    }

    pub fn totals(&self) -> Totals {
        let mut totals = Totals {
            files: self.files.len(),
            ..Totals::default()
        };
        for entry in &self.files {
            match entry {
                FileEntry::Processed(report) => {
                    let outcome = &report.outcome;
                    totals.changed += usize::from(outcome.changed);
                    totals.inserted += outcome.resolved.len();
                    totals.unresolved += outcome.unresolved.len();
                    totals.documented += outcome.skipped_documented.len();
                }
                FileEntry::Failed { .. } => totals.failed += 1,
            }
        }
        totals
    }
}

/// Trait for rendering a run report into a specific output format.
pub trait ReportRenderer {
    fn render(&self, report: &Report) -> String;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn ReportRenderer>> {
    match format {
        "text" | "txt" => Ok(Box::new(text::TextRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use text or json", format)),
    }
}

//! JSON renderer: structured output for tooling integration.
//!
//! Serializes the report with serde, plus the run totals under `summary`.

use crate::report::{FileEntry, Report, ReportRenderer, Totals};
use serde::Serialize;

pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonReport<'a> {
    files: &'a [FileEntry],
    summary: Totals,
}

impl ReportRenderer for JsonRenderer {
    fn render(&self, report: &Report) -> String {
        let doc = JsonReport {
            files: &report.files,
            summary: report.totals(),
        };
        match serde_json::to_string_pretty(&doc) {
            Ok(mut json) => {
                json.push('\n');
                json
            }
            Err(err) => {
                log::error!("failed to serialize report: {}", err);
                String::new()
            }
        }
    }
}

//! Plain text renderer: one block per file, then a summary line.

use crate::report::{FileEntry, Report, ReportRenderer};
use docsplice::FileReport;
use std::fmt::Write;

pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &Report) -> String {
        let mut out = String::new();
        for entry in &report.files {
            match entry {
                FileEntry::Processed(file) => render_file(&mut out, file),
                FileEntry::Failed { path, error } => {
                    let _ = writeln!(out, "{}: failed: {}", path.display(), error);
                }
            }
        }

        let totals = report.totals();
        let _ = writeln!(
            out,
            "{} files ({} changed, {} failed): {} inserted, {} unresolved, {} already documented",
            totals.files,
            totals.changed,
            totals.failed,
            totals.inserted,
            totals.unresolved,
            totals.documented
        );
        out
    }
}

fn render_file(out: &mut String, file: &FileReport) {
    let outcome = &file.outcome;
    let status = if file.written {
        "written"
    } else if outcome.changed {
        "dry run"
    } else {
        "unchanged"
    };
    let _ = writeln!(out, "{}: {}", file.path.display(), status);

    for key in &outcome.resolved {
        let _ = writeln!(out, "  + {}", key);
    }
    for key in &outcome.skipped_documented {
        let _ = writeln!(out, "  = {} (already documented)", key);
    }
    for item in &outcome.unresolved {
        let _ = writeln!(out, "  ! {}: {}", item.proposal, item.reason);
    }
}

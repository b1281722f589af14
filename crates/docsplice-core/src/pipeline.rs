//! Per-file pipeline: index → match → render → plan → apply → persist.
//!
//! Each file is an independent unit of work. Stages run strictly in order
//! within a unit; units share nothing and may run in parallel.

use crate::error::{FileError, PipelineError};
use crate::index::{index_with, Dialect};
use crate::matcher::match_proposals;
use crate::model::*;
use crate::proposal::ProposalSource;
use crate::render::{JsDocRenderer, RenderOptions, Renderer};
use crate::splice::{plan, RenderedComment};
use crate::write::{apply, persist};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Pipeline configuration, gathered by the caller.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Grammar override; by default chosen from the file extension.
    pub dialect: Option<Dialect>,
    pub render: RenderOptions,
    /// Compute and report, but never write.
    pub dry_run: bool,
}

/// Result of running the pipeline over one file's text.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// The new text (the input unchanged when nothing was inserted).
    #[serde(skip)]
    pub text: String,
    pub changed: bool,
    pub resolved: Vec<DeclarationKey>,
    pub unresolved: Vec<Unresolved>,
    pub skipped_documented: Vec<DeclarationKey>,
}

/// Result of processing one file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    pub written: bool,
}

/// One unit of work for [`process_files`].
#[derive(Debug, Clone)]
pub struct FileJob {
    pub path: PathBuf,
    pub proposals: Vec<ProposedComment>,
}

impl FileJob {
    pub fn from_source(path: PathBuf, source: &dyn ProposalSource) -> Self {
        let proposals = source.proposals_for(&path);
        FileJob { path, proposals }
    }
}

/// Run the pipeline over in-memory text.
pub fn process_source(
    source: &str,
    proposals: &[ProposedComment],
    options: &PipelineOptions,
) -> Result<FileOutcome, PipelineError> {
    let catalog = index_with(source, options.dialect.unwrap_or_default())?;
    let matched = match_proposals(&catalog, proposals);
    let mut unresolved = matched.unresolved;

    let renderer = JsDocRenderer::new(options.render.clone());
    let mut rendered = Vec::with_capacity(matched.resolved.len());
    for resolved in &matched.resolved {
        let record = &catalog.records[resolved.target];
        match renderer.render(resolved, record) {
            Ok(text) => rendered.push(RenderedComment {
                target: resolved.target,
                text,
            }),
            Err(error) => {
                log::warn!("rejected comment for {}: {}", record.key, error);
                unresolved.push(Unresolved {
                    proposal: resolved.proposal.key(),
                    reason: UnresolvedReason::Rejected { error },
                });
            }
        }
    }

    let plan = plan(&catalog, source, &rendered);
    for conflict in &plan.conflicts {
        if let Some(resolved) = matched.resolved.iter().find(|r| r.target == conflict.dropped) {
            unresolved.push(Unresolved {
                proposal: resolved.proposal.key(),
                reason: UnresolvedReason::Conflict {
                    target: catalog.records[conflict.kept].key.clone(),
                },
            });
        }
    }

    let text = apply(source, &plan.operations)?;
    let resolved = plan
        .operations
        .iter()
        .map(|op| catalog.records[op.target].key.clone())
        .collect();

    Ok(FileOutcome {
        changed: !plan.operations.is_empty(),
        text,
        resolved,
        unresolved,
        skipped_documented: matched.skipped_documented,
    })
}

/// Read, process and (unless dry-run or unchanged) rewrite one file.
pub fn process_file(
    path: &Path,
    proposals: &[ProposedComment],
    options: &PipelineOptions,
) -> Result<FileReport, FileError> {
    let source = std::fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let options = PipelineOptions {
        dialect: Some(options.dialect.unwrap_or_else(|| Dialect::from_path(path))),
        ..options.clone()
    };
    let outcome = process_source(&source, proposals, &options)
        .map_err(|err| FileError::from_pipeline(path.to_path_buf(), err))?;

    let written = outcome.changed && !options.dry_run;
    if written {
        persist(path, &outcome.text).map_err(|source| FileError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    log::debug!(
        "{}: {} resolved, {} unresolved, {} already documented",
        path.display(),
        outcome.resolved.len(),
        outcome.unresolved.len(),
        outcome.skipped_documented.len()
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        outcome,
        written,
    })
}

/// Process independent files on at most `concurrency` threads.
///
/// Results come back in job order; one file's failure never stops another.
pub fn process_files(
    jobs: &[FileJob],
    options: &PipelineOptions,
    concurrency: usize,
) -> Result<Vec<Result<FileReport, FileError>>, rayon::ThreadPoolBuildError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()?;
    Ok(pool.install(|| {
        jobs.par_iter()
            .map(|job| process_file(&job.path, &job.proposals, options))
            .collect()
    }))
}

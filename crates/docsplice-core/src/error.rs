//! Error types. Every error is scoped to a single file.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The input is not syntactically valid TypeScript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error at {line}:{column}")]
    Syntax { line: usize, column: usize },
    #[error("missing `{expected}` at {line}:{column}")]
    Missing {
        expected: String,
        line: usize,
        column: usize,
    },
    #[error("failed to load the TypeScript grammar: {0}")]
    Grammar(String),
    #[error("parser produced no tree")]
    NoTree,
}

/// A resolved comment failed content validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RenderError {
    #[error("summary is empty")]
    EmptySummary,
    #[error("{target} cannot document a return value")]
    ReturnsNotAllowed { target: String },
}

/// An insertion set that cannot be applied to the given text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpliceError {
    #[error("splice offset {offset} is past the end of the text ({len} bytes)")]
    OutOfBounds { offset: usize, len: usize },
    #[error("splice offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
    #[error("splice offsets must be strictly increasing ({previous} then {offset})")]
    Unordered { previous: usize, offset: usize },
}

/// Failure of one file's unit of work.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error("failed to splice {}: {source}", path.display())]
    Splice { path: PathBuf, source: SpliceError },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Everything `process_source` can fail with before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Splice(#[from] SpliceError),
}

impl FileError {
    /// The file this failure belongs to.
    pub fn path(&self) -> &Path {
        match self {
            FileError::Read { path, .. }
            | FileError::Parse { path, .. }
            | FileError::Splice { path, .. }
            | FileError::Write { path, .. } => path,
        }
    }

    pub(crate) fn from_pipeline(path: PathBuf, err: PipelineError) -> Self {
        match err {
            PipelineError::Parse(source) => FileError::Parse { path, source },
            PipelineError::Splice(source) => FileError::Splice { path, source },
        }
    }
}

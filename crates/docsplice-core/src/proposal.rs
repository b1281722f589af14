//! Proposal input: where comment proposals come from.
//!
//! The generation stage is external. Anything that can answer "which
//! proposals exist for this file" implements [`ProposalSource`]; the JSON
//! batch written by a generator is the stock implementation.

use crate::model::ProposedComment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Supplies the proposal batch for a file.
pub trait ProposalSource {
    fn proposals_for(&self, path: &Path) -> Vec<ProposedComment>;
}

impl<F> ProposalSource for F
where
    F: Fn(&Path) -> Vec<ProposedComment>,
{
    fn proposals_for(&self, path: &Path) -> Vec<ProposedComment> {
        self(path)
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read proposal batch {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid proposal batch {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// `{ "files": { "<path>": [proposal, ...] } }`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProposalBatch {
    pub files: BTreeMap<PathBuf, Vec<ProposedComment>>,
    /// Directory relative batch paths are resolved against.
    #[serde(skip)]
    base: Option<PathBuf>,
}

impl ProposalBatch {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Load a batch file; its relative paths are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let text = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let batch = Self::from_json(&text).map_err(|source| BatchError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(batch.with_base_dir(base))
    }

    pub fn with_base_dir(mut self, dir: &Path) -> Self {
        self.base = Some(dir.to_path_buf());
        self
    }

    /// Every file named in the batch, resolved.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.keys().map(|p| self.resolve(p)).collect()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.base {
            Some(ref base) if path.is_relative() => normalize_path(&base.join(path)),
            _ => normalize_path(path),
        }
    }
}

impl ProposalSource for ProposalBatch {
    fn proposals_for(&self, path: &Path) -> Vec<ProposedComment> {
        let wanted = normalize_path(path);
        self.files
            .iter()
            .find(|(key, _)| self.resolve(key) == wanted)
            .map(|(_, proposals)| proposals.clone())
            .unwrap_or_default()
    }
}

/// Absolute, lexically normalized path (`.` dropped, `..` folded).
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

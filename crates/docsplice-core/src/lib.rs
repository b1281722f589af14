//! docsplice: insert generated doc comments into TypeScript source.
//!
//! Five stages run per file, strictly in order:
//!
//! - [`index`]: parse the text and catalog documentable declarations
//! - [`matcher`]: bind each proposed comment to one declaration
//! - [`render`]: turn the proposal payload into a JSDoc block
//! - [`splice`]: position blocks as ordered insertions
//! - [`write`]: apply the insertions, then persist atomically
//!
//! [`pipeline`] sequences them for a single file or many in parallel. Comment
//! generation is not part of this crate; proposals arrive through
//! [`proposal::ProposalSource`].

pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod pipeline;
pub mod proposal;
pub mod render;
pub mod splice;
pub mod write;

pub use error::{FileError, ParseError, PipelineError, RenderError, SpliceError};
pub use index::{index, index_with, Dialect};
pub use matcher::{match_proposals, MatchOutcome};
pub use model::*;
pub use pipeline::{
    process_file, process_files, process_source, FileJob, FileOutcome, FileReport,
    PipelineOptions,
};
pub use proposal::{BatchError, ProposalBatch, ProposalSource};
pub use render::{JsDocRenderer, RenderOptions, Renderer};
pub use splice::{plan, Plan, PlanConflict, RenderedComment};
pub use write::{apply, persist};

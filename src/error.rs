//! Crate-wide error taxonomy.
//!
//! Mirrors the layering the rest of this codebase uses: each stage owns a
//! narrow `thiserror` enum, and [`PipelineError`] composes them for anything
//! that has to cross a stage boundary. Per-record problems (a single
//! malformed alert) are reported in-band by the caller and never constructed
//! as a `PipelineError` — only fatal, run-aborting conditions are.

use thiserror::Error;

/// Errors that can abort an entire pipeline run.
///
/// `MissingInput` and `EmitterFailure` are the only two fatal conditions;
/// a malformed record or an under-spread situation is recoverable and
/// reported on the affected record or situation instead of propagating here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input path does not exist: {0}")]
    MissingInput(String),

    #[error("failed to load external dependency graph from {path}: {source}")]
    GraphLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse external dependency graph from {path}: {source}")]
    GraphParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("emitter failed to write output: {0}")]
    EmitterFailure(#[from] std::io::Error),
}

//! Error taxonomy of the invocation pipeline.

use thiserror::Error;

/// Terminal failures of a single invocation request.
///
/// Every variant corresponds to a state in which the pipeline gives up on
/// the request; each carries enough detail for the user to act on.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The base run configuration is missing even after a rebuild retry.
    #[error(
        "run configuration '{name}' not found; register it manually or check \
         that the dependency rebuild produces it"
    )]
    ConfigurationNotFound { name: String },

    /// The dependency rebuild was cancelled or aborted before completing.
    #[error("dependency rebuild was cancelled")]
    RebuildCancelled,

    /// Dispatching the run or debug execution failed.
    #[error("launch failed: {0}")]
    LaunchFailure(String),

    /// The requested case index is beyond the document's case count.
    #[error("case {requested} does not exist; the file has {available} case(s)")]
    CaseOutOfRange { requested: usize, available: usize },
}

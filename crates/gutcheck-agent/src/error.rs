//! Error types for gutcheck-agent

use thiserror::Error;

/// Result type alias using gutcheck-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a turn or a session.
///
/// Tool failures are deliberately absent: dispatch downgrades them into
/// error-flagged tool-result entries and the loop continues.
#[derive(Error, Debug)]
pub enum Error {
    /// The generation capability failed; the turn cannot continue
    #[error("generation failed: {0}")]
    Generation(#[source] gutcheck_ai::Error),

    /// The extraction capability failed or returned non-conformant output
    #[error("evaluation failed: {0}")]
    Extraction(#[source] gutcheck_ai::Error),

    /// Session setup failed (tools or automation handle unavailable)
    #[error("session setup failed: {0}")]
    Setup(String),
}

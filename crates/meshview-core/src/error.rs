// ── Core error types ──
//
// Reconciliation itself never fails; these cover setting up the feed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The feed address could not be parsed.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The transport refused to start.
    #[error(transparent)]
    Feed(#[from] meshview_api::Error),
}

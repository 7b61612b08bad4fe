//! Error types for the dispatch domain.

use thiserror::Error;

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that can occur while dispatching a campaign.
///
/// Per-recipient rejections from the mail API are *not* errors; they are
/// recorded as failed outcomes and the run continues. This enum covers the
/// failures that abort a run.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The caller supplied no bearer credential.
    #[error("Authorization header is missing.")]
    MissingCredential,

    /// No recipients file was uploaded.
    #[error("Recipients file is required.")]
    MissingRecipientsFile,

    /// The uploaded file yielded zero valid email addresses.
    #[error("Could not read valid emails from {0}. Make sure it's a .xlsx or .csv file.")]
    NoRecipients(String),

    /// Transport-level failure talking to the mail API.
    #[error("Mail API request failed: {0}")]
    Transport(String),

    /// Failure serializing an outbound message.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        DispatchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Internal(format!("JSON serialization error: {}", err))
    }
}

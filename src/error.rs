//! Error types for the external-join layer.
//!
//! Two failure scopes exist and must not be conflated: construction-time errors
//! (`Configuration`) abort node startup so that no partially configured component
//! ever serves a query, while all other variants fail exactly the query that
//! triggered them. There is no partial-success mode: a provider failure never
//! yields a truncated result set.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XJoinError {
    /// Missing or invalid initialisation parameter. Fatal at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required per-query request parameter is absent or empty.
    #[error("missing or empty parameter: {0}")]
    MissingParameter(String),

    /// Network or remote-service failure during submit/poll/fetch.
    /// Not retried beyond the poll loop's own backoff.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service reported a terminal failure status.
    /// Carries the remote-supplied failure message.
    #[error("remote job failed: {0}")]
    RemoteJobFailure(String),

    /// The local wait for a remote job was cancelled. Reported distinctly
    /// from `RemoteJobFailure` so callers can tell client-side cancellation
    /// from server-side rejection.
    #[error("job interrupted: {0}")]
    Interrupted(String),

    /// A terminal job status outside the known taxonomy. The raw status is
    /// echoed for diagnosis.
    #[error("unexpected job status: {0}")]
    UnexpectedState(String),

    /// The remote payload could not be parsed into result records.
    #[error("result parse error: {0}")]
    ResultParse(String),
}

impl From<reqwest::Error> for XJoinError {
    fn from(err: reqwest::Error) -> Self {
        XJoinError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, XJoinError>;

//! Error types for client operations.

use std::fmt;

/// Errors surfaced by client calls.
///
/// Both variants are HTTP-level failures; the client never fails on the
/// shape of a response body. Malformed payload lines inside a stream are
/// skipped internally and never reach the caller.
#[derive(Debug)]
pub enum ClientError {
    /// The request could not be completed (connect, TLS, read, decode at
    /// the transport layer).
    Transport(reqwest::Error),
    /// The gateway answered with a non-success status. The body text is
    /// carried verbatim so the caller can inspect the gateway's error JSON.
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "transport error: {err}"),
            ClientError::Status { status, body } => {
                write!(f, "gateway returned {status}: {body}")
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            ClientError::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

impl ClientError {
    /// Status code of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
        }
    }
}

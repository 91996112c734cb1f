//! Error types for the client.

use std::fmt;

use bstalk_proto::ProtoError;

/// Result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// A command was issued without a live connection.
    #[error("not connected")]
    NotConnected,

    /// Network or IO failure while reading/writing, including timeouts.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Address could not be resolved into a socket address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The reply could not be framed or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtoError),

    /// The server answered with a status other than the expected one.
    #[error("{}", LastError::describe(.status, .message))]
    Rejected { status: String, message: String },

    /// Reply shape did not match the command.
    #[error("unexpected response")]
    UnexpectedResponse,

    /// `ignore` was called for a tube that is not being watched.
    #[error("tube {0:?} is not being watched")]
    NotWatching(String),

    /// `ignore` would leave the watch list empty.
    #[error("cannot ignore {0:?}: it is the only watched tube")]
    LastWatchedTube(String),
}

impl ClientError {
    /// True for failures of the connection itself rather than of a command.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::NotConnected | ClientError::Io(_))
    }

    /// True when the server rejected the command.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }

    /// Status token of a rejection.
    pub fn status(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// Last server rejection, kept until read once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub status: String,
    pub message: String,
}

impl LastError {
    fn describe(status: &str, message: &str) -> String {
        if message.is_empty() {
            format!("server replied {}", status)
        } else {
            format!("server replied {}: {}", status, message)
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::describe(&self.status, &self.message))
    }
}

impl From<LastError> for ClientError {
    fn from(err: LastError) -> Self {
        ClientError::Rejected {
            status: err.status,
            message: err.message,
        }
    }
}

use std::fmt;
use std::time::Duration;

use dropshare_connection::ConnectionError;
use dropshare_transfer::TransferError;

use crate::state::SessionState;

/// Stable classification of session failures, as reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileTooLarge,
    EmptyFile,
    ConnectionError,
    ConnectionTimeout,
    TransferInterrupted,
    ServerRejected,
    FileRead,
    InvalidState,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileTooLarge => "file_too_large",
            ErrorKind::EmptyFile => "empty_file",
            ErrorKind::ConnectionError => "connection_error",
            ErrorKind::ConnectionTimeout => "connection_timeout",
            ErrorKind::TransferInterrupted => "transfer_interrupted",
            ErrorKind::ServerRejected => "server_rejected",
            ErrorKind::FileRead => "file_read",
            ErrorKind::InvalidState => "invalid_state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a transfer session.
///
/// All of them are terminal: nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    /// The server only registers an upload when its first chunk arrives, so
    /// a zero-byte file would never receive a share code.
    #[error("file is empty")]
    EmptyFile,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("connection timed out after {0:?}")]
    ConnectionTimeout(Duration),

    #[error("transfer interrupted: {0}")]
    TransferInterrupted(String),

    #[error("server rejected upload: {0}")]
    ServerRejected(String),

    #[error("failed to read file: {0}")]
    FileRead(String),

    #[error("session is {0}, expected idle")]
    InvalidState(SessionState),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            SessionError::EmptyFile => ErrorKind::EmptyFile,
            SessionError::Connection(_) => ErrorKind::ConnectionError,
            SessionError::ConnectionTimeout(_) => ErrorKind::ConnectionTimeout,
            SessionError::TransferInterrupted(_) => ErrorKind::TransferInterrupted,
            SessionError::ServerRejected(_) => ErrorKind::ServerRejected,
            SessionError::FileRead(_) => ErrorKind::FileRead,
            SessionError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }
}

impl From<ConnectionError> for SessionError {
    fn from(e: ConnectionError) -> Self {
        match e {
            ConnectionError::Timeout(after) => SessionError::ConnectionTimeout(after),
            other => SessionError::Connection(other.to_string()),
        }
    }
}

impl From<TransferError> for SessionError {
    fn from(e: TransferError) -> Self {
        match e {
            TransferError::FileTooLarge { size, max } => SessionError::FileTooLarge { size, max },
            other => SessionError::FileRead(other.to_string()),
        }
    }
}

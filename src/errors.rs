// Error types for the daemon client
//
// Every public operation returns `Result<T>`. Errors are grouped by kind:
// transport failures, daemon-reported protocol errors, JSON decode errors,
// semantic errors (the daemon answered with an unexpected shape), local I/O
// and configuration problems.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// DNS, connect, timeout, cancellation or a rejected redirect
    Transport,
    /// The daemon answered with a status >= 400
    Protocol,
    /// A success body was not valid JSON for the requested type
    Decode,
    /// The daemon answered, but the answer violates an expected shape
    Semantic,
    /// Local file or body stream I/O
    Io,
    /// Unreadable or malformed configuration
    Config,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid daemon url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no results received")]
    NoResults,

    #[error("bad response from server")]
    BadResponse,

    #[error("add not result")]
    AddNotResult,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("response body already closed")]
    BodyClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) | Error::Cancelled | Error::InvalidUrl(_) | Error::InvalidHeader(_) => {
                ErrorKind::Transport
            }
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Decode(_) => ErrorKind::Decode,
            Error::NoResults | Error::BadResponse | Error::AddNotResult => ErrorKind::Semantic,
            Error::Io(_) | Error::BodyClosed => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// The daemon-reported error, if this is one
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }

    /// True when the transport refused to follow a redirect
    pub fn is_redirect(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_redirect())
    }
}

/// Error reported by the daemon for a failed command
///
/// Built once per failing response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub command: String,
    pub message: String,
    pub code: Option<i64>,
}

impl ProtocolError {
    pub fn new(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: Option<i64>) -> Self {
        self.code = code;
        self
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProtocolError {}

use std::{fmt, io};

/// Error produced while reading, parsing or answering a request.
///
/// The kind decides how the connection handler answers: a [`Client`]
/// error becomes a `400 Bad Request` whose body is the error text, a
/// [`Server`] error becomes a `500 Internal Server Error`.
///
/// [`Client`]: ErrorKind::Client
/// [`Server`]: ErrorKind::Server
pub struct Error {
    kind: ErrorKind,
    message: String,
}

/// Classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request is malformed or exceeds a configured cap.
    Client,
    /// The server failed while handling a well-formed request.
    Server,
}

impl Error {
    pub(crate) fn client(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Client,
            message: message.into(),
        }
    }

    pub(crate) fn server(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Server,
            message: message.into(),
        }
    }

    /// Returns the error classification.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The bare message, without the kind prefix.
    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the peer is at fault.
    #[inline]
    pub fn is_client(&self) -> bool {
        matches!(self.kind, ErrorKind::Client)
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Client => write!(f, "[Client error]: {}", self.message),
            ErrorKind::Server => write!(f, "[Server error]: {}", self.message),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::server(err.to_string())
    }
}

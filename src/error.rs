//! Error types for Rapidgator upload operations.
//!
//! Every failure is tagged with the step that produced it, so callers can
//! branch on [`ErrorKind`] (for instance, retry only transfer failures).

use thiserror::Error;

/// Result type for Rapidgator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while authenticating or uploading.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad caller input, detected before any network call
    #[error("invalid input: {0}")]
    Validation(String),

    /// Login failed or returned no session id
    #[error("authentication failed: {0}")]
    Auth(#[source] Cause),

    /// Dedup probe failed or returned a malformed response
    #[error("upload preparation failed: {0}")]
    Prepare(#[source] Cause),

    /// Byte transfer to the upload URL failed
    #[error("transfer failed: {0}")]
    Transfer(#[source] Cause),

    /// Final link lookup failed
    #[error("resolving uploaded file failed: {0}")]
    Resolve(#[source] Cause),
}

/// The step an [`Error`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    Prepare,
    Transfer,
    Resolve,
}

impl Error {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Prepare(_) => ErrorKind::Prepare,
            Error::Transfer(_) => ErrorKind::Transfer,
            Error::Resolve(_) => ErrorKind::Resolve,
        }
    }

    /// Get the underlying cause, if the error came from a network step.
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Error::Validation(_) => None,
            Error::Auth(c) | Error::Prepare(c) | Error::Transfer(c) | Error::Resolve(c) => Some(c),
        }
    }
}

/// What went wrong inside a single step.
#[derive(Error, Debug)]
pub enum Cause {
    /// HTTP request could not be completed (connect, TLS, timeout...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("server error: {message} (code: {code})")]
    Status { code: u16, message: String },

    /// API envelope reported a failure
    #[error("API error: {details} (status: {status})")]
    Api { status: u16, details: String },

    /// Response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field was absent or empty
    #[error("missing `{0}` in response")]
    MissingField(&'static str),

    /// A field was present but unusable
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ureq::Error> for Cause {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "unknown error".into());
                Cause::Status { code, message }
            }
            other => Cause::Http(other.to_string()),
        }
    }
}

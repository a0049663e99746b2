use thiserror::Error;

/// Evaluation errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The request was rejected before any network call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend answered with a non-success status.
    #[error("API request failed with status {status}")]
    Backend { status: u16 },

    /// Connection failure, timeout, or an unreadable response body.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// A success response without a required field.
    #[error("backend response missing required field `{0}`")]
    Contract(&'static str),

    /// The evaluator could not be constructed.
    #[error("config error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Backend,
    Transport,
    Contract,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Backend { .. } => ErrorKind::Backend,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Contract(_) => ErrorKind::Contract,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status for backend errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

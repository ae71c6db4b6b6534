use std::fmt;

/// Every failure the dice, trial, and analyzer operations can report.
///
/// The payload is a human-readable description of what was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The caller passed a value the operation can't accept: empty or
    /// duplicate faces, a non-numeric weight, a zero roll count, or an
    /// unknown result shape.
    InvalidArgument(String),
    /// The referenced face isn't on the die.
    NotFound(String),
    /// The operation isn't valid in the current state, e.g. reading a trial
    /// result before any rolls were played.
    IllegalState(String),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub(crate) fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::IllegalState(msg) => write!(f, "illegal state: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

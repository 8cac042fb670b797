//! Error types for session commands.

use std::fmt;
use std::io;

use reel_format::FormatError;

/// Errors raised by recording and replay session operations.
///
/// None of these are fatal to the caller; every session command reports
/// failure through this type and leaves the sessions in a consistent
/// state.
#[derive(Debug)]
pub enum SessionError {
    /// A bad recordings directory or bad filename.
    Config {
        /// Human-readable description.
        detail: String,
    },
    /// An I/O failure while reading or writing a recording.
    Io(io::Error),
    /// A recording file failed validation or decoding.
    Corrupt(FormatError),
    /// A command was issued in the wrong state, such as starting a
    /// recording while a replay is loaded.
    StateConflict {
        /// Human-readable description.
        detail: String,
    },
    /// No data was available for the requested operation.
    NotFound {
        /// Human-readable description.
        detail: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { detail } => write!(f, "configuration error: {detail}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Corrupt(e) => write!(f, "corrupt recording: {e}"),
            Self::StateConflict { detail } => write!(f, "state conflict: {detail}"),
            Self::NotFound { detail } => write!(f, "not found: {detail}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Corrupt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FormatError> for SessionError {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::Io(inner) => Self::Io(inner),
            other => Self::Corrupt(other),
        }
    }
}

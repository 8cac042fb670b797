//! Error types for the recording format.

use std::fmt;
use std::io;

/// Errors raised while encoding or decoding recording files.
#[derive(Debug)]
pub enum FormatError {
    /// An I/O error from the underlying reader or writer.
    Io(io::Error),
    /// The file does not start with the expected magic constant.
    BadMagic {
        /// The value found at offset 0.
        found: u32,
    },
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the file.
        found: u32,
    },
    /// A packet record declares a payload longer than the maximum
    /// protocol message size. The stream cannot be trusted past this
    /// point; callers must abort the load.
    OversizedPacket {
        /// The declared payload length.
        len: u32,
    },
    /// A packet record carries an unknown mode tag.
    UnknownMode {
        /// The unrecognized tag.
        tag: u16,
    },
    /// The stream ended mid-record.
    Truncated {
        /// What was being read when the stream ended.
        detail: String,
    },
    /// A header text field is not valid UTF-8.
    Malformed {
        /// Human-readable description.
        detail: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::BadMagic { found } => {
                write!(f, "not a recording file (magic 0x{found:08X})")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported recording format version {found}")
            }
            Self::OversizedPacket { len } => {
                write!(f, "packet record declares oversized payload ({len} bytes)")
            }
            Self::UnknownMode { tag } => write!(f, "unknown packet mode tag {tag}"),
            Self::Truncated { detail } => write!(f, "truncated recording: {detail}"),
            Self::Malformed { detail } => write!(f, "malformed recording: {detail}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

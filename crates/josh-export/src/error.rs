//! Errors surfaced by sinks and the export facade.

use std::error::Error;
use std::fmt;
use std::io;

/// A sink or facade failure (`spec.md` §4.I, §7).
#[derive(Debug)]
pub enum ExportError {
    /// A sink's underlying I/O failed.
    Io(io::Error),
    /// A write was addressed to a sink whose writer thread has already
    /// stopped (it failed earlier, or the facade was never started).
    SinkUnavailable {
        /// The sink's attachment name.
        name: String,
    },
    /// A sink's writer thread panicked instead of returning an error.
    WriterPanicked {
        /// The sink's attachment name.
        name: String,
    },
    /// `write` or `join` was called before `start`.
    NotStarted,
    /// `attach` or `start` was called after `start` already ran.
    AlreadyStarted,
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "sink I/O error: {e}"),
            Self::SinkUnavailable { name } => write!(f, "sink '{name}' is no longer accepting writes"),
            Self::WriterPanicked { name } => write!(f, "sink '{name}' writer thread panicked"),
            Self::NotStarted => write!(f, "export facade has not been started"),
            Self::AlreadyStarted => write!(f, "export facade has already been started"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

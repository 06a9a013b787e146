//! Layered error types for the compile pipeline.
//!
//! Library code returns [`CompileError`] so callers can match on the kind of
//! failure (§7 of the design doc); the CLI boundary wraps these in
//! `anyhow::Result` the way the reference crate's `ports` traits do.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Position in an XML source, used to annotate invalid-data errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Malformed XML, unbalanced start/end tags, or a truncated stream.
    #[error("invalid data in import '{guid}' at {pos}: {message}")]
    InvalidData {
        guid: String,
        pos: Position,
        message: String,
    },

    /// An I/O failure while opening, reading, decompressing, or writing.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cooperative cancellation raised during an import's read loop.
    #[error("compile cancelled while reading import '{guid}'")]
    Cancelled { guid: String },

    /// The bytes loaded during `ensure()` are not a recognizable silo
    /// (bad magic or unsupported version).
    #[error("format mismatch: {0}")]
    FormatMismatch(String),
}

impl CompileError {
    pub fn invalid_data(guid: impl Into<String>, pos: Position, message: impl Into<String>) -> Self {
        CompileError::InvalidData {
            guid: guid.into(),
            pos,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Prefixes an existing error with the GUID of the import that produced
    /// it, per §4.5 step 1 ("wrapped with a prefix naming the offending
    /// import's GUID").
    pub fn with_import_guid(self, guid: &str) -> Self {
        match self {
            CompileError::InvalidData {
                guid: _,
                pos,
                message,
            } => CompileError::InvalidData {
                guid: guid.to_string(),
                pos,
                message,
            },
            other => other,
        }
    }
}

// Centralized error handling module
// Error types carrying the path and operation that failed

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Which of the two tree roots a [`FastDlError::MissingRoot`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRole {
    /// The game installation being published.
    Source,
    /// The FastDL distribution directory.
    Mirror,
}

impl fmt::Display for RootRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RootRole::Source => write!(f, "Game root"),
            RootRole::Mirror => write!(f, "FastDL root"),
        }
    }
}

/// Main error type for mirror synchronization.
#[derive(Debug, thiserror::Error)]
pub enum FastDlError {
    /// A tree root is absent. Raised before anything is touched.
    #[error("{role} \"{}\" folder wasn't found!", path.display())]
    MissingRoot { role: RootRole, path: PathBuf },

    /// A filesystem operation failed mid-run.
    #[error("I/O error while {operation} {}: {source}", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed.
    #[error("Error walking directory {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: jwalk::Error,
    },

    /// The configuration file could not be read or parsed.
    #[error("Invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl FastDlError {
    /// Wrap an io::Error with the operation and path it happened on
    pub fn io(source: io::Error, operation: &str, path: impl Into<PathBuf>) -> Self {
        FastDlError::Io {
            operation: operation.to_string(),
            path: path.into(),
            source,
        }
    }

    /// True for the pre-run root check, which never leaves side effects.
    pub fn is_missing_root(&self) -> bool {
        matches!(self, FastDlError::MissingRoot { .. })
    }
}

pub type Result<T> = std::result::Result<T, FastDlError>;

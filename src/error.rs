//! Global error handling for treedump
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use thiserror::Error;

/// Global error type for treedump operations
#[derive(Error, Debug)]
pub enum TreeDumpError {
    /// The traversal root does not exist or is not a directory
    #[error("Invalid root: {0}")]
    InvalidRoot(String),

    /// A single file or directory could not be visited
    #[error("Failed to visit {path}: {message}")]
    TraversalEntry { path: String, message: String },

    /// A dump line does not have the expected shape
    #[error("Malformed entry ({reason}): {line:?}")]
    MalformedEntry { reason: String, line: String },

    /// A path string could not be decomposed into segments
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeDumpError {
    /// Build a `MalformedEntry` error for the given raw line
    pub fn malformed(reason: impl Into<String>, line: &str) -> Self {
        Self::MalformedEntry {
            reason: reason.into(),
            line: line.to_string(),
        }
    }
}

/// Specialized Result type for treedump operations
pub type Result<T> = std::result::Result<T, TreeDumpError>;

/// Creates a TreeDumpError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::TreeDumpError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// Allow returning TreeDumpError from an io::Result main
impl From<TreeDumpError> for io::Error {
    fn from(err: TreeDumpError) -> Self {
        match err {
            TreeDumpError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_raw_line() {
        let err = TreeDumpError::malformed("expected 5 tagged fields", "  7| x| /T@D-F+S-O-");
        let message = err.to_string();
        assert!(message.contains("expected 5 tagged fields"));
        assert!(message.contains("7| x| /T@D-F+S-O-"));
    }

    #[test]
    fn test_error_macros() {
        fn check(value: usize) -> Result<usize> {
            ensure!(value > 0, InvalidArgument, "value must be positive, got {}", value);
            Ok(value)
        }

        assert!(check(1).is_ok());
        match check(0) {
            Err(TreeDumpError::InvalidArgument(msg)) => assert!(msg.contains("got 0")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_io_conversion_preserves_kind() {
        let err = TreeDumpError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }
}

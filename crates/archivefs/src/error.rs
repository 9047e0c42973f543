//! Error types for archive access.

use std::io;
use std::path::PathBuf;

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or reading an archive.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error while reading the archive file.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Archive path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The zip container could not be read.
    #[error("invalid zip archive {path}: {message}")]
    Zip {
        /// Archive path.
        path: PathBuf,
        /// Error message from the zip reader.
        message: String,
    },

    /// A decompressor could not be initialized.
    #[error("decompression failed for {path}: {message}")]
    Decompression {
        /// Archive path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The requested entry does not exist or is not a regular file.
    #[error("no such file in archive: {0}")]
    NotFound(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the entry was simply absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("bin/foo".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no such file in archive: bin/foo");
    }

    #[test]
    fn test_io_constructor_keeps_path() {
        let err = Error::io("/tmp/a.tar.gz", io::Error::other("boom"));
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("/tmp/a.tar.gz"));
    }
}

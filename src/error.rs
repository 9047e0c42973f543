//! Error types for binary acquisition.
//!
//! Errors are split into two tiers. Configuration problems abort a run
//! before any network or file work starts. Everything else is scoped to a
//! single binary: it becomes that binary's failed outcome, and the run
//! reports all such failures together in [`Error::Acquisition`].

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for acquisition operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of acquisition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid configuration; nothing was attempted.
    Config,
    /// Transport failure or a transient HTTP status (5xx, 408, 429).
    Network,
    /// The artifact could not be read or the binary was not found in it.
    Format,
    /// Permission denied while writing.
    Permission,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether re-running the acquisition may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Config => "fix the binary definitions and run again",
            Self::Network => "check the network and the download URL, then run again",
            Self::Format => "set path_in_archive to point at the binary inside the archive",
            Self::Permission => "check permissions of the destination directory",
            Self::Other => "check the error details for more information",
        }
    }
}

/// A single binary's failure within a run.
#[derive(Debug)]
pub struct BinaryFailure {
    /// Binary name.
    pub binary: String,
    /// What went wrong.
    pub error: Error,
}

impl fmt::Display for BinaryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.binary, self.error)
    }
}

fn describe_failures(failures: &[BinaryFailure]) -> String {
    let noun = if failures.len() == 1 { "binary" } else { "binaries" };
    let details: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!("{} {noun} failed: {}", failures.len(), details.join("; "))
}

fn describe_not_found(binary: &str, top_level: usize, tried: &[&str]) -> String {
    format!(
        "could not auto-detect binary {binary} in archive \
         ({top_level} top-level entries; tried {})",
        tried.join(", ")
    )
}

/// Errors that can occur during acquisition.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Two binaries share a name.
    #[error("duplicate binary name: {0}")]
    DuplicateBinary(String),

    /// URL template could not be parsed.
    #[error("invalid URL template {template:?}: {message}")]
    Template {
        /// Template source.
        template: String,
        /// What is wrong with it.
        message: String,
    },

    /// Destination directory is unusable.
    #[error("destination directory {path}: {source}")]
    DestinationDir {
        /// Destination directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// HTTP transport failure.
    #[error("HTTP request to {url} failed: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Server answered with a non-success status code.
    #[error("unexpected status code {status} from {url}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The archive could not be opened or read.
    #[error(transparent)]
    Archive(#[from] archivefs::Error),

    /// No layout heuristic located the binary inside the archive.
    #[error("{}", describe_not_found(.binary, *.top_level, .tried))]
    BinaryNotFound {
        /// Binary name.
        binary: String,
        /// Number of entries at the archive root.
        top_level: usize,
        /// Strategies that were tried, in order.
        tried: Vec<&'static str>,
    },

    /// The downloaded artifact has a type the pipeline cannot handle.
    #[error("unknown detected file type for {0}, cannot install it")]
    UnknownFileType(String),

    /// The worker pool could not be created.
    #[error("failed to create thread pool: {0}")]
    ThreadPool(String),

    /// One or more binaries failed; every failure is listed.
    #[error("{}", describe_failures(.failures))]
    Acquisition {
        /// Per-binary failures, in configuration order.
        failures: Vec<BinaryFailure>,
    },
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a template error.
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::DuplicateBinary(_) | Error::Template { .. } => {
                ErrorCategory::Config
            }
            Error::DestinationDir { source, .. } | Error::Io { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    ErrorCategory::Permission
                } else {
                    ErrorCategory::Other
                }
            }
            Error::Http { .. } => ErrorCategory::Network,
            Error::HttpStatus { status, .. } => {
                if (400..500).contains(status) && !matches!(status, 408 | 429) {
                    ErrorCategory::Config
                } else {
                    ErrorCategory::Network
                }
            }
            Error::Archive(_) | Error::BinaryNotFound { .. } | Error::UnknownFileType(_) => {
                ErrorCategory::Format
            }
            Error::ThreadPool(_) => ErrorCategory::Other,
            Error::Acquisition { failures } => {
                if failures.iter().all(|f| f.error.is_retryable()) {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Other
                }
            }
        }
    }

    /// Whether re-running the acquisition may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Per-binary failures carried by [`Error::Acquisition`].
    #[must_use]
    pub fn failures(&self) -> &[BinaryFailure] {
        match self {
            Error::Acquisition { failures } => failures,
            _ => &[],
        }
    }
}

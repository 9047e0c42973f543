//! Core types for binary acquisition.
//!
//! This module contains the configuration handed to the orchestrator
//! ([`BinarySpec`], [`AcquisitionConfig`]) and the per-run results it
//! produces ([`AcquisitionOutcome`], [`AcquisitionReport`]).

use crate::error::{BinaryFailure, Error, Result};
use crate::probe::VersionProbe;
use crate::template::UrlTemplate;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Destination directory used when none is configured.
pub const DEFAULT_DIR: &str = "testbin/bin";

/// A binary to keep installed at a pinned version.
///
/// # Example
///
/// ```
/// use testbin::BinarySpec;
/// use testbin::probe::CommandProbe;
///
/// let etcd = BinarySpec::new(
///     "etcd",
///     "3.5.9",
///     "https://github.com/etcd-io/etcd/releases/download/v{{.Version}}/etcd-v{{.Version}}-{{.GOOS}}-{{.GOARCH}}.tar.gz",
///     CommandProbe::new(),
/// );
/// assert_eq!(etcd.name, "etcd");
/// assert!(etcd.path_in_archive.is_none());
/// ```
#[derive(Clone)]
pub struct BinarySpec {
    /// Unique name; also the installed filename and the name searched for
    /// inside archives.
    pub name: String,
    /// Pinned version.
    pub version: String,
    /// Download URL template (see [`crate::template`]).
    pub url: String,
    /// Reports the version of an installed copy.
    pub probe: Arc<dyn VersionProbe>,
    /// In-archive location, for archives where the binary is not at `name`
    /// or `<top-level-dir>/bin/name`.
    pub path_in_archive: Option<String>,
}

impl BinarySpec {
    /// Create a binary definition.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
        probe: impl VersionProbe + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url: url.into(),
            probe: Arc::new(probe),
            path_in_archive: None,
        }
    }

    /// Set the in-archive location of the binary.
    #[must_use]
    pub fn path_in_archive(mut self, path: impl Into<String>) -> Self {
        self.path_in_archive = Some(path.into());
        self
    }

    /// Parse the URL template.
    pub fn url_template(&self) -> Result<UrlTemplate> {
        UrlTemplate::parse(&self.url)
    }
}

impl fmt::Debug for BinarySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinarySpec")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("url", &self.url)
            .field("path_in_archive", &self.path_in_archive)
            .finish_non_exhaustive()
    }
}

/// Everything one acquisition run needs.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Directory where finished binaries are placed.
    pub dir: PathBuf,
    /// Binaries to acquire.
    pub binaries: Vec<BinarySpec>,
}

impl AcquisitionConfig {
    /// Create a configuration for `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            binaries: Vec::new(),
        }
    }

    /// Add a binary.
    #[must_use]
    pub fn binary(mut self, binary: BinarySpec) -> Self {
        self.binaries.push(binary);
        self
    }

    /// Check names and URL templates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBinary`] for repeated names,
    /// [`Error::Config`] for names that are not plain filenames, and
    /// [`Error::Template`] for malformed URL templates.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for binary in &self.binaries {
            let name = binary.name.as_str();
            if name.is_empty() || name == "." || name == ".." {
                return Err(Error::Config(format!("invalid binary name {name:?}")));
            }
            if name.contains(['/', '\\']) {
                return Err(Error::Config(format!(
                    "binary name {name:?} must not contain path separators"
                )));
            }
            if !seen.insert(name) {
                return Err(Error::DuplicateBinary(name.to_string()));
            }
            binary.url_template()?;
        }
        Ok(())
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIR)
    }
}

/// Shape of a downloaded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFileType {
    /// An archive or compressed stream.
    Compressed,
    /// A bare executable.
    Executable,
    /// Could not be determined.
    Unknown,
}

impl fmt::Display for DetectedFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compressed => "compressed",
            Self::Executable => "executable",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Why a binary had to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireReason {
    /// Not present in the destination directory.
    Missing,
    /// Present at a different version.
    VersionMismatch {
        /// Probed version.
        have: String,
        /// Pinned version.
        want: String,
    },
}

impl fmt::Display for AcquireReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::VersionMismatch { have, want } => {
                write!(f, "version mismatch (have {have}, want {want})")
            }
        }
    }
}

/// Result of one binary's acquisition.
#[derive(Debug)]
pub enum AcquisitionOutcome {
    /// Already installed at the pinned version; nothing was touched.
    AlreadyCurrent,
    /// Downloaded and installed.
    Installed {
        /// Why it was downloaded.
        reason: AcquireReason,
    },
    /// Acquisition failed.
    Failed(Error),
}

impl AcquisitionOutcome {
    /// Whether this outcome is a failure.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for AcquisitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyCurrent => f.write_str("up to date"),
            Self::Installed { reason } => write!(f, "installed ({reason})"),
            Self::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

/// Outcomes of a run, in configuration order.
#[derive(Debug, Default)]
pub struct AcquisitionReport {
    /// `(binary name, outcome)` pairs.
    pub outcomes: Vec<(String, AcquisitionOutcome)>,
}

impl AcquisitionReport {
    /// Outcome for a binary.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&AcquisitionOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Names of binaries that were downloaded and installed.
    #[must_use]
    pub fn installed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, AcquisitionOutcome::Installed { .. }))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Names of binaries that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Whether no binary failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| !o.is_failed())
    }

    /// Convert failures into a single [`Error::Acquisition`].
    ///
    /// Successful outcomes are kept in the returned report.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let failures = self
            .outcomes
            .into_iter()
            .filter_map(|(binary, outcome)| match outcome {
                AcquisitionOutcome::Failed(error) => Some(BinaryFailure { binary, error }),
                _ => None,
            })
            .collect();
        Err(Error::Acquisition { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn spec(name: &str, url: &str) -> BinarySpec {
        BinarySpec::new(name, "1.0.0", url, |_: &Path| String::new())
    }

    #[test]
    fn test_default_config_dir() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.dir, PathBuf::from("testbin/bin"));
        assert!(config.binaries.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_duplicate_names() {
        let config = AcquisitionConfig::new("bin")
            .binary(spec("foo", "https://x/foo"))
            .binary(spec("bar", "https://x/bar"))
            .binary(spec("foo", "https://x/foo2"));
        match config.validate() {
            Err(Error::DuplicateBinary(name)) => assert_eq!(name, "foo"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_bad_names() {
        for name in ["", "..", "sub/foo", "dir\\foo"] {
            let config = AcquisitionConfig::new("bin").binary(spec(name, "https://x"));
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_bad_template() {
        let config = AcquisitionConfig::new("bin").binary(spec("foo", "https://x/{{.Bogus}}"));
        assert!(matches!(config.validate(), Err(Error::Template { .. })));
    }

    #[test]
    fn test_spec_builder_and_debug() {
        let spec = spec("kubectl", "https://x").path_in_archive("kubernetes/client/bin/kubectl");
        assert_eq!(
            spec.path_in_archive.as_deref(),
            Some("kubernetes/client/bin/kubectl")
        );
        let debug = format!("{spec:?}");
        assert!(debug.contains("kubectl"));
        assert!(!debug.contains("probe"));
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(AcquireReason::Missing.to_string(), "missing");
        let mismatch = AcquireReason::VersionMismatch {
            have: "1.0.0".to_string(),
            want: "1.1.0".to_string(),
        };
        assert_eq!(mismatch.to_string(), "version mismatch (have 1.0.0, want 1.1.0)");
    }

    #[test]
    fn test_report_into_result() {
        let report = AcquisitionReport {
            outcomes: vec![
                ("a".to_string(), AcquisitionOutcome::AlreadyCurrent),
                (
                    "b".to_string(),
                    AcquisitionOutcome::Installed {
                        reason: AcquireReason::Missing,
                    },
                ),
            ],
        };
        assert!(report.is_success());
        assert_eq!(report.installed(), vec!["b"]);
        assert!(report.into_result().is_ok());

        let report = AcquisitionReport {
            outcomes: vec![
                ("a".to_string(), AcquisitionOutcome::AlreadyCurrent),
                (
                    "b".to_string(),
                    AcquisitionOutcome::Failed(Error::UnknownFileType("b".to_string())),
                ),
            ],
        };
        assert_eq!(report.failures(), vec!["b"]);
        let err = report.into_result().unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].binary, "b");
    }
}

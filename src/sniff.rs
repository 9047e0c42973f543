//! Content sniffing for downloaded artifacts.
//!
//! Servers are not trusted to label downloads correctly (GitHub release
//! assets arrive as `application/octet-stream`), so the artifact's leading
//! bytes decide. When they are inconclusive the host's `file` utility is
//! consulted, and when that is missing or unhelpful the artifact is assumed
//! to be compressed, which is how most release binaries ship.

use crate::error::{Error, Result};
use crate::types::DetectedFileType;
use archivefs::Compression;
use archivefs::format::{SNIFF_LEN, is_zip_magic};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Classify the leading bytes of an artifact.
///
/// Returns [`DetectedFileType::Unknown`] when no archive or compression
/// signature matches; a generic binary stream is not evidence either way.
#[must_use]
pub fn classify_magic(head: &[u8]) -> DetectedFileType {
    if is_zip_magic(head) || Compression::from_magic(head).is_some() {
        DetectedFileType::Compressed
    } else {
        DetectedFileType::Unknown
    }
}

/// Classify the output of the `file` utility.
#[must_use]
pub fn classify_description(description: &str) -> DetectedFileType {
    let description = description.to_lowercase();
    if description.contains("executable") {
        DetectedFileType::Executable
    } else if description.contains("compressed") || description.contains("archive") {
        DetectedFileType::Compressed
    } else {
        DetectedFileType::Unknown
    }
}

/// Decides whether an artifact is an archive or a bare executable.
#[derive(Debug, Clone, Default)]
pub struct Sniffer {
    utility: Option<PathBuf>,
}

impl Sniffer {
    /// Sniffer using the `file` utility found on `PATH`, if any.
    #[must_use]
    pub fn detect() -> Self {
        let utility = which::which("file").ok();
        if utility.is_none() {
            log::debug!("file utility not found; inconclusive artifacts default to compressed");
        }
        Self { utility }
    }

    /// Sniffer relying on magic bytes only.
    #[must_use]
    pub fn without_utility() -> Self {
        Self { utility: None }
    }

    /// Sniffer using a specific `file`-compatible utility.
    #[must_use]
    pub fn with_utility(path: impl Into<PathBuf>) -> Self {
        Self {
            utility: Some(path.into()),
        }
    }

    /// Path of the fallback utility, if any.
    #[must_use]
    pub fn utility(&self) -> Option<&Path> {
        self.utility.as_deref()
    }

    /// Classify the artifact at `path`.
    ///
    /// An empty artifact is [`DetectedFileType::Unknown`]; otherwise the
    /// result is never `Unknown`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the artifact cannot be read.
    pub fn sniff(&self, path: &Path) -> Result<DetectedFileType> {
        let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(|e| Error::io(path, e))?;

        if head.is_empty() {
            log::debug!("{} is empty", path.display());
            return Ok(DetectedFileType::Unknown);
        }

        let by_magic = classify_magic(&head);
        if by_magic != DetectedFileType::Unknown {
            log::debug!("{} sniffed as {} by magic bytes", path.display(), by_magic);
            return Ok(by_magic);
        }

        if let Some(description) = self.describe(path) {
            let by_utility = classify_description(&description);
            if by_utility != DetectedFileType::Unknown {
                log::debug!("{} sniffed as {} by file utility", path.display(), by_utility);
                return Ok(by_utility);
            }
        }

        log::debug!("{} is inconclusive, assuming compressed", path.display());
        Ok(DetectedFileType::Compressed)
    }

    fn describe(&self, path: &Path) -> Option<String> {
        let utility = self.utility.as_deref()?;
        match Command::new(utility).arg(path).output() {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                log::warn!(
                    "{} exited with {} for {}",
                    utility.display(),
                    output.status,
                    path.display()
                );
                None
            }
            Err(e) => {
                log::warn!("failed to run {}: {}", utility.display(), e);
                None
            }
        }
    }
}

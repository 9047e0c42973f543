//! Installed-version probes.
//!
//! A probe reports the version of an already-installed binary so the
//! orchestrator can decide whether to leave it alone. Any closure
//! `Fn(&Path) -> String` is a probe; [`CommandProbe`] covers the common
//! case of running the binary and parsing its output.

use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

static DEFAULT_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:[-+][0-9A-Za-z.-]+)?)").expect("valid version regex")
});

/// Reports the version of an installed binary.
///
/// An empty string means the version could not be determined; it never
/// equals a pinned version, so the binary gets reinstalled.
pub trait VersionProbe: Send + Sync {
    /// Version of the binary at `path`.
    fn installed_version(&self, path: &Path) -> String;
}

impl<F> VersionProbe for F
where
    F: Fn(&Path) -> String + Send + Sync,
{
    fn installed_version(&self, path: &Path) -> String {
        self(path)
    }
}

/// Runs the binary and extracts a version from its output.
///
/// # Example
///
/// ```
/// use testbin::probe::CommandProbe;
///
/// let probe = CommandProbe::new().args(["version", "--short"]);
/// assert_eq!(probe.parse("Client Version: v1.29.3"), "1.29.3");
/// ```
#[derive(Debug, Clone)]
pub struct CommandProbe {
    args: Vec<String>,
    pattern: Regex,
}

impl CommandProbe {
    /// Probe running `<binary> --version` and taking the first dotted version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            args: vec!["--version".to_string()],
            pattern: DEFAULT_VERSION_RE.clone(),
        }
    }

    /// Replace the arguments passed to the binary.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the version pattern.
    ///
    /// The first capture group is the version; without groups the whole
    /// match is used.
    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = pattern;
        self
    }

    /// Extract a version from command output.
    #[must_use]
    pub fn parse(&self, output: &str) -> String {
        self.pattern
            .captures(output)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionProbe for CommandProbe {
    fn installed_version(&self, path: &Path) -> String {
        let output = match Command::new(path).args(&self.args).output() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("failed to execute {}: {}", path.display(), e);
                return String::new();
            }
        };

        // Some tools print their version on stderr.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        let version = self.parse(&text);
        if version.is_empty() {
            log::debug!(
                "no version found in output of {} {}",
                path.display(),
                self.args.join(" ")
            );
        }
        version
    }
}

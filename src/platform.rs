//! Platform identifiers for download URLs.
//!
//! Release pages name their artifacts after Go-style platform identifiers
//! (`linux`/`darwin`/`windows`, `amd64`/`arm64`), so the Rust target
//! constants are translated to that vocabulary.
//!
//! # Example
//!
//! ```
//! use testbin::platform::Platform;
//!
//! let platform = Platform::current();
//! println!("Downloading for {platform}");
//! ```

use std::fmt;

/// Operating system and architecture used to render URL templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system identifier (e.g., "linux", "darwin").
    pub os: String,
    /// CPU architecture identifier (e.g., "amd64", "arm64").
    pub arch: String,
}

impl Platform {
    /// Create a platform from explicit identifiers.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self::new(
            os_identifier(std::env::consts::OS),
            arch_identifier(std::env::consts::ARCH),
        )
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Translate a Rust `target_os` value.
#[must_use]
pub fn os_identifier(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Translate a Rust `target_arch` value.
#[must_use]
pub fn arch_identifier(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_identifier() {
        assert_eq!(os_identifier("macos"), "darwin");
        assert_eq!(os_identifier("linux"), "linux");
        assert_eq!(os_identifier("windows"), "windows");
        assert_eq!(os_identifier("freebsd"), "freebsd");
    }

    #[test]
    fn test_arch_identifier() {
        assert_eq!(arch_identifier("x86_64"), "amd64");
        assert_eq!(arch_identifier("aarch64"), "arm64");
        assert_eq!(arch_identifier("x86"), "386");
        assert_eq!(arch_identifier("riscv64"), "riscv64");
    }

    #[test]
    fn test_current_platform() {
        let platform = Platform::current();
        assert!(!platform.os.is_empty());
        assert!(!platform.arch.is_empty());
        assert_ne!(platform.os, "macos");
        assert_ne!(platform.arch, "x86_64");
    }

    #[test]
    fn test_display() {
        assert_eq!(Platform::new("linux", "amd64").to_string(), "linux/amd64");
    }
}

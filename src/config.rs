//! TOML manifest for binary definitions.
//!
//! ```toml
//! dir = "testbin/bin"
//!
//! [[binary]]
//! name = "etcd"
//! version = "3.5.9"
//! url = "https://github.com/etcd-io/etcd/releases/download/v{{.Version}}/etcd-v{{.Version}}-{{.GOOS}}-{{.GOARCH}}.tar.gz"
//!
//! [[binary]]
//! name = "kubectl"
//! version = "1.29.3"
//! url = "https://dl.k8s.io/v{{.Version}}/kubernetes-client-{{.GOOS}}-{{.GOARCH}}.tar.gz"
//! path_in_archive = "client/bin/kubectl"
//! version_args = ["version", "--client"]
//! version_pattern = 'GitVersion:"v([^"]+)"'
//! ```
//!
//! `dir` is optional and tilde-expanded; relative paths are relative to the
//! working directory. Every binary gets a [`CommandProbe`].

use crate::error::{Error, Result};
use crate::probe::CommandProbe;
use crate::types::{AcquisitionConfig, BinarySpec, DEFAULT_DIR};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Destination directory.
    #[serde(default)]
    pub dir: Option<String>,

    /// Binary definitions.
    #[serde(default, rename = "binary")]
    pub binaries: Vec<ManifestBinary>,
}

/// One `[[binary]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestBinary {
    /// Binary name.
    pub name: String,
    /// Pinned version.
    pub version: String,
    /// Download URL template.
    pub url: String,
    /// In-archive location.
    #[serde(default)]
    pub path_in_archive: Option<String>,
    /// Arguments that make the binary print its version.
    #[serde(default)]
    pub version_args: Option<Vec<String>>,
    /// Regex extracting the version from that output.
    #[serde(default)]
    pub version_pattern: Option<String>,
}

impl ManifestBinary {
    fn probe(&self) -> Result<CommandProbe> {
        let mut probe = CommandProbe::new();
        if let Some(args) = &self.version_args {
            probe = probe.args(args.iter().cloned());
        }
        if let Some(pattern) = &self.version_pattern {
            let regex = Regex::new(pattern).map_err(|e| {
                Error::Config(format!("invalid version_pattern for {}: {e}", self.name))
            })?;
            probe = probe.pattern(regex);
        }
        Ok(probe)
    }

    /// Convert into a [`BinarySpec`].
    pub fn to_spec(&self) -> Result<BinarySpec> {
        let mut spec = BinarySpec::new(&self.name, &self.version, &self.url, self.probe()?);
        if let Some(path) = &self.path_in_archive {
            spec = spec.path_in_archive(path);
        }
        Ok(spec)
    }
}

impl Manifest {
    /// Read a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid manifest {}: {e}", path.display())))
    }

    /// Parse a manifest from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid manifest: {e}")))
    }

    /// Destination directory with `~` expanded.
    #[must_use]
    pub fn expanded_dir(&self) -> PathBuf {
        let dir = self.dir.as_deref().unwrap_or(DEFAULT_DIR);
        PathBuf::from(shellexpand::tilde(dir).as_ref())
    }

    /// Build and validate an [`AcquisitionConfig`].
    pub fn into_config(self) -> Result<AcquisitionConfig> {
        let binaries = self
            .binaries
            .iter()
            .map(ManifestBinary::to_spec)
            .collect::<Result<Vec<_>>>()?;
        let config = AcquisitionConfig {
            dir: self.expanded_dir(),
            binaries,
        };
        config.validate()?;
        Ok(config)
    }
}

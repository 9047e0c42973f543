//! Acquisition orchestration.
//!
//! [`Acquirer`] checks every configured binary against the destination
//! directory and, for those missing or at the wrong version, runs
//! download, sniff, extract and install. Binaries are handled concurrently,
//! one worker per binary, and one binary's failure never stops the others.

use crate::error::{Error, Result};
use crate::extract;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::install;
use crate::platform::Platform;
use crate::sniff::Sniffer;
use crate::template::{TemplateData, UrlTemplate};
use crate::types::{
    AcquireReason, AcquisitionConfig, AcquisitionOutcome, AcquisitionReport, BinarySpec,
    DetectedFileType,
};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of per-download temporary directories.
pub const TEMP_DIR_PREFIX: &str = "testbin-download-";

/// Runs acquisitions.
///
/// # Example
///
/// ```no_run
/// use testbin::{Acquirer, AcquisitionConfig, BinarySpec};
/// use testbin::probe::CommandProbe;
///
/// let config = AcquisitionConfig::new("testbin/bin").binary(BinarySpec::new(
///     "etcd",
///     "3.5.9",
///     "https://github.com/etcd-io/etcd/releases/download/v{{.Version}}/etcd-v{{.Version}}-{{.GOOS}}-{{.GOARCH}}.tar.gz",
///     CommandProbe::new(),
/// ));
///
/// let report = Acquirer::new().acquire(&config).unwrap();
/// for (name, outcome) in &report.outcomes {
///     println!("{name}: {outcome}");
/// }
/// ```
#[derive(Clone)]
pub struct Acquirer {
    fetcher: Arc<dyn Fetcher>,
    sniffer: Sniffer,
    platform: Platform,
    temp_root: Option<PathBuf>,
}

impl Acquirer {
    /// Acquirer downloading over HTTP for the current platform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fetcher(HttpFetcher::new())
    }

    /// Acquirer using a custom fetcher.
    pub fn with_fetcher(fetcher: impl Fetcher + 'static) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            sniffer: Sniffer::detect(),
            platform: Platform::current(),
            temp_root: None,
        }
    }

    /// Replace the content sniffer.
    #[must_use]
    pub fn sniffer(mut self, sniffer: Sniffer) -> Self {
        self.sniffer = sniffer;
        self
    }

    /// Render URLs for another platform.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Create per-download working directories under `dir` instead of the
    /// system temp directory.
    #[must_use]
    pub fn temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(dir.into());
        self
    }

    /// Acquire every binary in `config`.
    ///
    /// Per-binary failures are reported as [`AcquisitionOutcome::Failed`]
    /// in the returned report.
    ///
    /// # Errors
    ///
    /// Fails without touching anything if the configuration is invalid, and
    /// before any download if the destination directory cannot be used.
    pub fn acquire(&self, config: &AcquisitionConfig) -> Result<AcquisitionReport> {
        config.validate()?;
        let templates = config
            .binaries
            .iter()
            .map(BinarySpec::url_template)
            .collect::<Result<Vec<_>>>()?;

        ensure_dir(&config.dir)?;

        if config.binaries.is_empty() {
            return Ok(AcquisitionReport::default());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.binaries.len())
            .thread_name(|i| format!("testbin-{i}"))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        let outcomes: Vec<AcquisitionOutcome> = pool.install(|| {
            config
                .binaries
                .par_iter()
                .zip(templates.par_iter())
                .map(|(binary, template)| self.acquire_binary(&config.dir, binary, template))
                .collect()
        });

        Ok(AcquisitionReport {
            outcomes: config
                .binaries
                .iter()
                .map(|b| b.name.clone())
                .zip(outcomes)
                .collect(),
        })
    }

    /// Acquire every binary and fail if any of them failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Acquisition`] listing every failed binary, or the
    /// fatal error from [`Acquirer::acquire`].
    pub fn run(&self, config: &AcquisitionConfig) -> Result<()> {
        self.acquire(config)?.into_result().map(|_| ())
    }

    fn acquire_binary(
        &self,
        dir: &Path,
        binary: &BinarySpec,
        template: &UrlTemplate,
    ) -> AcquisitionOutcome {
        let name = binary.name.as_str();
        let target = dir.join(name);

        let reason = if target.exists() {
            let have = binary.probe.installed_version(&target);
            if have == binary.version {
                log::info!("{name} binary up to date");
                return AcquisitionOutcome::AlreadyCurrent;
            }
            log::info!(
                "{name} binary version mismatch (have {have}, want {})",
                binary.version
            );
            AcquireReason::VersionMismatch {
                have,
                want: binary.version.clone(),
            }
        } else {
            log::info!("{name} binary missing");
            AcquireReason::Missing
        };

        match self.download(dir, binary, template) {
            Ok(path) => {
                log::info!("{name} {} installed to {}", binary.version, path.display());
                AcquisitionOutcome::Installed { reason }
            }
            Err(e) => {
                log::warn!(
                    "{name} binary acquisition failed: {e} ({})",
                    e.category().advice()
                );
                AcquisitionOutcome::Failed(e)
            }
        }
    }

    fn download(&self, dir: &Path, binary: &BinarySpec, template: &UrlTemplate) -> Result<PathBuf> {
        let name = binary.name.as_str();
        log::info!("downloading {name} version {}...", binary.version);

        // Removed on drop, whichever way this returns.
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let temp = match &self.temp_root {
            Some(root) => builder.tempdir_in(root).map_err(|e| Error::io(root, e))?,
            None => builder
                .tempdir()
                .map_err(|e| Error::io(std::env::temp_dir(), e))?,
        };

        let url = template.render(&TemplateData {
            version: &binary.version,
            platform: &self.platform,
        });
        let archive = temp.path().join(format!("{name}-archive"));
        self.fetcher.fetch(&url, &archive)?;

        let staged = match self.sniffer.sniff(&archive)? {
            DetectedFileType::Compressed => extract::extract_binary(
                &archive,
                name,
                binary.path_in_archive.as_deref(),
                &extract::staged_path(temp.path(), name),
            )?,
            DetectedFileType::Executable => archive,
            DetectedFileType::Unknown => return Err(Error::UnknownFileType(name.to_string())),
        };

        install::install(&staged, dir, name)
    }
}

impl Default for Acquirer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Acquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquirer")
            .field("sniffer", &self.sniffer)
            .field("platform", &self.platform)
            .field("temp_root", &self.temp_root)
            .finish_non_exhaustive()
    }
}

/// Make sure `dir` exists and is a directory, creating it if missing.
fn ensure_dir(dir: &Path) -> Result<()> {
    let destination = |source: io::Error| Error::DestinationDir {
        path: dir.to_path_buf(),
        source,
    };

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(destination(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("creating {}", dir.display());
            fs::create_dir_all(dir).map_err(destination)
        }
        Err(e) => Err(destination(e)),
    }
}

/// Acquire every binary in `config` over HTTP for the current platform.
///
/// # Errors
///
/// See [`Acquirer::run`].
pub fn run(config: &AcquisitionConfig) -> Result<()> {
    Acquirer::new().run(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetcher;
    use std::path::Path;

    fn probe_none(_: &Path) -> String {
        String::new()
    }

    #[test]
    fn test_ensure_dir_creates_missing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a/b/bin");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("bin");
        fs::write(&file, b"").unwrap();
        match ensure_dir(&file) {
            Err(Error::DestinationDir { path, .. }) => assert_eq!(path, file),
            other => panic!("expected DestinationDir error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_config_creates_dir() {
        let root = tempfile::tempdir().unwrap();
        let config = AcquisitionConfig::new(root.path().join("bin"));
        let report = Acquirer::with_fetcher(MockFetcher::new())
            .acquire(&config)
            .unwrap();
        assert!(report.outcomes.is_empty());
        assert!(root.path().join("bin").is_dir());
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("bin");
        let config = AcquisitionConfig::new(&dir)
            .binary(BinarySpec::new("foo", "1", "mock://{{.Nope}}", probe_none));
        let fetcher = MockFetcher::new();

        let err = Acquirer::with_fetcher(fetcher.clone())
            .acquire(&config)
            .unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        assert!(!dir.exists());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[test]
    fn test_inconclusive_artifact_found_by_archive_name() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.add_body("mock://foo/1.0/linux/amd64", b"\x7fELF binary".to_vec());
        let config = AcquisitionConfig::new(root.path()).binary(BinarySpec::new(
            "foo",
            "1.0",
            "mock://foo/{{.Version}}/{{.GOOS}}/{{.GOARCH}}",
            probe_none,
        ));

        let report = Acquirer::with_fetcher(fetcher.clone())
            .sniffer(Sniffer::without_utility())
            .platform(Platform::new("linux", "amd64"))
            .acquire(&config)
            .unwrap();

        // Without the utility an ELF header is inconclusive and treated as
        // compressed; the single-file view still exposes it by archive name.
        assert!(report.is_success(), "{report:?}");
        assert_eq!(fs::read(root.path().join("foo")).unwrap(), b"\x7fELF binary");
        assert_eq!(fetcher.requests(), vec!["mock://foo/1.0/linux/amd64"]);
    }

    #[test]
    fn test_unusable_temp_root_fails_binary() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.add_body("mock://foo", b"\x7fELF binary".to_vec());
        let config = AcquisitionConfig::new(root.path().join("bin"))
            .binary(BinarySpec::new("foo", "1.0", "mock://foo", probe_none));
        let missing = root.path().join("no-such-dir");

        let report = Acquirer::with_fetcher(fetcher.clone())
            .sniffer(Sniffer::without_utility())
            .temp_root(&missing)
            .acquire(&config)
            .unwrap();
        match report.outcome("foo") {
            Some(AcquisitionOutcome::Failed(Error::Io { path, .. })) => assert_eq!(path, &missing),
            other => panic!("expected Io error, got {other:?}"),
        }
        assert_eq!(fetcher.request_count(), 0);
    }

    #[test]
    fn test_unknown_file_type_fails_binary() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new();
        fetcher.add_body("mock://empty", Vec::new());
        let config = AcquisitionConfig::new(root.path())
            .binary(BinarySpec::new("foo", "1.0", "mock://empty", probe_none));

        let report = Acquirer::with_fetcher(fetcher)
            .sniffer(Sniffer::without_utility())
            .acquire(&config)
            .unwrap();
        assert!(matches!(
            report.outcome("foo"),
            Some(AcquisitionOutcome::Failed(Error::UnknownFileType(_)))
        ));
        assert!(!root.path().join("foo").exists());
    }
}

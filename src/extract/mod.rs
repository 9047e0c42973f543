//! Locating a binary inside a downloaded archive.
//!
//! Release archives do not agree on a layout. Some put the binary at the
//! root, some wrap everything in a `<name>-<version>-<os>-<arch>/`
//! directory, some add a `bin/` level, and some are a single compressed
//! executable. [`Extractor`] tries an ordered list of [`Strategy`]s and
//! stages the first hit as a plain file.
//!
//! # Example
//!
//! ```
//! use archivefs::MemoryArchive;
//! use std::path::Path;
//! use testbin::extract::{Extractor, SearchContext};
//!
//! let view = MemoryArchive::new().with_file("foo-1.2.3-linux-amd64/bin/foo", b"#!".to_vec());
//! let dir = tempfile::tempdir().unwrap();
//! let archive = dir.path().join("foo-archive");
//! let dest = dir.path().join("foo-extracted");
//!
//! let extractor = Extractor::new(&view, SearchContext::new("foo", &archive, &dest));
//! let found = extractor.locate().unwrap();
//! assert_eq!(found.strategy, "top-level-dir");
//! ```

mod fallback;
pub mod strategies;

pub use strategies::{STRATEGIES, Strategy};

use crate::error::{Error, Result};
use archivefs::{ArchiveFs, ArchiveView};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Where a strategy found the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// A regular file in the archive view.
    Entry(String),
    /// Already copied to the staging file.
    Staged(PathBuf),
}

/// What a strategy needs to know about the search.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// Binary name.
    pub binary: &'a str,
    /// Configured in-archive location, if any.
    pub path_override: Option<&'a str>,
    /// Downloaded archive file.
    pub archive_path: &'a Path,
    /// Staging file the binary is copied to.
    pub dest: &'a Path,
}

impl<'a> SearchContext<'a> {
    /// Create a context without a path override.
    #[must_use]
    pub fn new(binary: &'a str, archive_path: &'a Path, dest: &'a Path) -> Self {
        Self {
            binary,
            path_override: None,
            archive_path,
            dest,
        }
    }

    /// Set the in-archive location.
    #[must_use]
    pub fn path_override(mut self, path: Option<&'a str>) -> Self {
        self.path_override = path.filter(|p| !p.is_empty());
        self
    }

    /// Base name of the archive file.
    #[must_use]
    pub fn archive_name(&self) -> Option<&'a str> {
        self.archive_path.file_name().and_then(|n| n.to_str())
    }
}

/// A successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    /// Name of the strategy that found the binary.
    pub strategy: &'static str,
    /// Where it was found.
    pub located: Located,
}

/// Runs the layout strategies against an archive view.
pub struct Extractor<'a> {
    view: &'a dyn ArchiveView,
    ctx: SearchContext<'a>,
}

impl<'a> Extractor<'a> {
    /// Create an extractor.
    pub fn new(view: &'a dyn ArchiveView, ctx: SearchContext<'a>) -> Self {
        Self { view, ctx }
    }

    /// Run the strategies in order and return the first hit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BinaryNotFound`] when no strategy applies.
    pub fn locate(&self) -> Result<Found> {
        let mut tried = Vec::with_capacity(STRATEGIES.len());
        for strategy in &STRATEGIES {
            tried.push(strategy.name);
            if let Some(located) = strategy.find(self.view, &self.ctx)? {
                log::debug!("{}: located via {} ({:?})", self.ctx.binary, strategy.name, located);
                return Ok(Found {
                    strategy: strategy.name,
                    located,
                });
            }
        }

        Err(Error::BinaryNotFound {
            binary: self.ctx.binary.to_string(),
            top_level: self.view.root_entries().len(),
            tried,
        })
    }

    /// Locate the binary and copy it to the staging file.
    ///
    /// Returns the staging file path.
    pub fn extract(&self) -> Result<PathBuf> {
        let dest = self.ctx.dest;
        match self.locate()?.located {
            Located::Entry(path) => {
                let mut out = File::create(dest).map_err(|e| Error::io(dest, e))?;
                self.view.copy_to(&path, &mut out)?;
                Ok(dest.to_path_buf())
            }
            Located::Staged(path) => Ok(path),
        }
    }
}

/// Staging file for a binary extracted into `dir`.
#[must_use]
pub fn staged_path(dir: &Path, binary: &str) -> PathBuf {
    dir.join(format!("{binary}-extracted"))
}

/// Open the archive at `archive` and stage `binary` out of it.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the archive cannot be read and
/// [`Error::BinaryNotFound`] if no strategy locates the binary.
pub fn extract_binary(
    archive: &Path,
    binary: &str,
    path_override: Option<&str>,
    dest: &Path,
) -> Result<PathBuf> {
    let fs = ArchiveFs::open(archive)?;
    log::debug!("{}: {} is a {} archive", binary, archive.display(), fs.format());
    let ctx = SearchContext::new(binary, archive, dest).path_override(path_override);
    Extractor::new(&fs, ctx).extract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivefs::MemoryArchive;
    use std::fs;

    #[test]
    fn test_first_strategy_wins() {
        let view = MemoryArchive::new()
            .with_file("foo", b"root".to_vec())
            .with_file("foo-archive", b"named".to_vec());
        let ctx = SearchContext::new("foo", Path::new("/tmp/foo-archive"), Path::new("/tmp/out"));
        let found = Extractor::new(&view, ctx).locate().unwrap();
        assert_eq!(found.strategy, "direct-name");
        assert_eq!(found.located, Located::Entry("foo".to_string()));
    }

    #[test]
    fn test_not_found_lists_strategies() {
        let view = MemoryArchive::new()
            .with_file("a/foo", b"".to_vec())
            .with_file("b/foo", b"".to_vec());
        let ctx = SearchContext::new("foo", Path::new("/tmp/foo-archive"), Path::new("/tmp/out"));
        match Extractor::new(&view, ctx).locate() {
            Err(Error::BinaryNotFound {
                binary,
                top_level,
                tried,
            }) => {
                assert_eq!(binary, "foo");
                assert_eq!(top_level, 2);
                assert_eq!(tried.len(), STRATEGIES.len());
            }
            other => panic!("expected BinaryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let ctx = SearchContext::new("foo", Path::new("a"), Path::new("b")).path_override(Some(""));
        assert!(ctx.path_override.is_none());
        assert_eq!(ctx.archive_name(), Some("a"));
    }

    #[test]
    fn test_extract_copies_entry() {
        let dir = tempfile::tempdir().unwrap();
        let dest = staged_path(dir.path(), "foo");
        let view = MemoryArchive::new().with_file("foo-1.0/bin/foo", b"payload".to_vec());
        let archive = dir.path().join("foo-archive");

        let staged = Extractor::new(&view, SearchContext::new("foo", &archive, &dest))
            .extract()
            .unwrap();
        assert_eq!(staged, dir.path().join("foo-extracted"));
        assert_eq!(fs::read(&staged).unwrap(), b"payload");
    }

    #[test]
    fn test_extract_binary_from_tar_gz() {
        use flate2::Compression as Level;
        use flate2::write::GzEncoder;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo-archive");
        let encoder = GzEncoder::new(File::create(&archive).unwrap(), Level::default());
        let mut builder = tar::Builder::new(encoder);
        let data = b"#!/bin/sh\necho foo\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        builder
            .append_data(&mut header, "foo-1.2.3-linux-amd64/foo", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = staged_path(dir.path(), "foo");
        let staged = extract_binary(&archive, "foo", None, &dest).unwrap();
        assert_eq!(fs::read(staged).unwrap(), data);
    }

    #[test]
    fn test_extract_binary_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_binary(
            &dir.path().join("missing"),
            "foo",
            None,
            &dir.path().join("out"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }
}

//! Archive files on disk.

use crate::error::{Error, Result};
use crate::format::{self, Compression, Format};
use crate::index::{Index, normalize_path};
use crate::{ArchiveView, DirEntry, EntryKind};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

/// A read-only view over an archive file.
///
/// The entry list is read once when the archive is opened. File contents
/// are streamed from the archive on demand, so the archive file must stay
/// in place for the lifetime of the view.
///
/// # Example
///
/// ```no_run
/// use archivefs::{ArchiveFs, ArchiveView};
///
/// let fs = ArchiveFs::open("/tmp/foo-1.2.3-linux-amd64.tar.gz").unwrap();
/// for entry in fs.root_entries() {
///     println!("{} ({:?})", entry.name, entry.kind);
/// }
/// ```
#[derive(Debug)]
pub struct ArchiveFs {
    path: PathBuf,
    format: Format,
    /// Payload is the raw entry name as stored in the archive.
    index: Index<String>,
}

impl ArchiveFs {
    /// Open and index the archive at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = format::detect(&path)?;
        let mut fs = Self {
            path,
            format,
            index: Index::default(),
        };
        fs.build_index()?;
        log::debug!(
            "opened {} as {} ({} entries)",
            fs.path.display(),
            fs.format,
            fs.index.len()
        );
        Ok(fs)
    }

    /// Path of the underlying archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected archive format.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Name under which single-file formats expose their content.
    fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn build_index(&mut self) -> Result<()> {
        match self.format {
            Format::Zip => self.index_zip(),
            Format::Tar(compression) => {
                self.index_tar(compression)?;
                Ok(())
            }
            Format::Compressed(_) | Format::Raw => {
                let name = self.base_name();
                self.index.insert(&name, EntryKind::File, name.clone());
                Ok(())
            }
        }
    }

    fn index_zip(&mut self) -> Result<()> {
        let mut archive = self.open_zip()?;
        for i in 0..archive.len() {
            let file = match archive.by_index_raw(i) {
                Ok(file) => file,
                Err(e) => {
                    log::warn!(
                        "skipping unreadable zip entry #{i} in {}: {e}",
                        self.path.display()
                    );
                    continue;
                }
            };
            let kind = if file.is_dir() {
                EntryKind::Dir
            } else if file.unix_mode().is_some_and(|m| m & S_IFMT == S_IFLNK) {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };
            let raw = file.name().to_string();
            self.index.insert(&raw, kind, raw.clone());
        }
        Ok(())
    }

    fn index_tar(&mut self, compression: Compression) -> Result<()> {
        let mut archive = self.open_tar(compression)?;
        let entries = match archive.entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("cannot list entries of {}: {e}", self.path.display());
                return Ok(());
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Keep what was read so far; callers fall back to streaming.
                    log::warn!("stopped listing {} early: {e}", self.path.display());
                    break;
                }
            };
            let entry_type = entry.header().entry_type();
            let kind = if entry_type.is_dir() {
                EntryKind::Dir
            } else if entry_type.is_file() {
                EntryKind::File
            } else if entry_type.is_symlink() || entry_type.is_hard_link() {
                EntryKind::Symlink
            } else {
                continue;
            };
            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            self.index.insert(&raw, kind, raw.clone());
        }
        Ok(())
    }

    fn open_file(&self) -> Result<BufReader<File>> {
        File::open(&self.path)
            .map(BufReader::new)
            .map_err(|e| Error::io(&self.path, e))
    }

    fn open_zip(&self) -> Result<zip::ZipArchive<File>> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        zip::ZipArchive::new(file).map_err(|e| Error::Zip {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn open_decoded(&self, compression: Compression) -> Result<Box<dyn Read>> {
        let file = self.open_file()?;
        compression.reader(file).map_err(|e| Error::Decompression {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn open_tar(&self, compression: Compression) -> Result<tar::Archive<Box<dyn Read>>> {
        Ok(tar::Archive::new(self.open_decoded(compression)?))
    }

    fn copy_tar_entry(
        &self,
        compression: Compression,
        target: &str,
        out: &mut dyn Write,
    ) -> Result<u64> {
        let mut archive = self.open_tar(compression)?;
        let entries = archive.entries().map_err(|e| Error::io(&self.path, e))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| Error::io(&self.path, e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            if normalize_path(&raw).as_deref() == Some(target) {
                return io::copy(&mut entry, out).map_err(|e| Error::io(&self.path, e));
            }
        }
        Err(Error::NotFound(target.to_string()))
    }
}

impl ArchiveView for ArchiveFs {
    fn kind(&self, path: &str) -> Option<EntryKind> {
        self.index.kind(path)
    }

    fn root_entries(&self) -> Vec<DirEntry> {
        self.index.root_entries()
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> Result<u64> {
        let raw = self
            .index
            .file(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;

        match self.format {
            Format::Zip => {
                let mut archive = self.open_zip()?;
                let mut file = archive.by_name(raw).map_err(|e| Error::Zip {
                    path: self.path.clone(),
                    message: e.to_string(),
                })?;
                io::copy(&mut file, out).map_err(|e| Error::io(&self.path, e))
            }
            Format::Tar(compression) => {
                let target = normalize_path(raw).ok_or_else(|| Error::NotFound(raw.clone()))?;
                self.copy_tar_entry(compression, &target, out)
            }
            Format::Compressed(compression) => {
                let mut reader = self.open_decoded(compression)?;
                io::copy(&mut reader, out).map_err(|e| Error::Decompression {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
            Format::Raw => {
                let mut reader = self.open_file()?;
                io::copy(&mut reader, out).map_err(|e| Error::io(&self.path, e))
            }
        }
    }
}

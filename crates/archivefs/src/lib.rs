//! # archivefs
//!
//! Read-only filesystem view over release archives.
//!
//! Release artifacts come in many shapes: zip files, tarballs compressed
//! with gzip, zstd, xz or bzip2, single compressed executables, or plain
//! files served under an archive-looking name. This crate identifies the
//! format from magic bytes and exposes every shape through the same
//! [`ArchiveView`] interface: look up an entry, list the root, copy a file
//! out.
//!
//! ## Example
//!
//! ```no_run
//! use archivefs::{ArchiveFs, ArchiveView};
//!
//! let fs = ArchiveFs::open("/tmp/tool.tar.gz").unwrap();
//! if fs.is_file("tool/bin/tool") {
//!     let mut out = std::fs::File::create("/tmp/tool").unwrap();
//!     fs.copy_to("tool/bin/tool", &mut out).unwrap();
//! }
//! ```
//!
//! ## Single-file formats
//!
//! A compressed stream that is not a tar archive, and any file whose format
//! is not recognized, is exposed as one file named after the archive file
//! itself.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod format;
pub mod fs;
mod index;
pub mod memory;

pub use error::{Error, Result};
pub use format::{Compression, Format};
pub use fs::ArchiveFs;
pub use index::normalize_path;
pub use memory::MemoryArchive;

use std::io::Write;

/// Kind of an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory, explicit or implied by a child path.
    Dir,
    /// Symbolic or hard link.
    Symlink,
}

/// An entry directly under the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (a single path segment).
    pub name: String,
    /// Entry kind.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Whether this entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Read-only view over the contents of an archive.
///
/// Paths are `/`-separated and relative to the archive root; they are
/// normalized with [`normalize_path`] before lookup.
pub trait ArchiveView {
    /// Kind of the entry at `path`, if it exists.
    fn kind(&self, path: &str) -> Option<EntryKind>;

    /// Entries directly under the archive root, sorted by name.
    fn root_entries(&self) -> Vec<DirEntry>;

    /// Copy the regular file at `path` into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `path` is missing or not a regular file.
    fn copy_to(&self, path: &str, out: &mut dyn Write) -> Result<u64>;

    /// Whether `path` is a regular file.
    fn is_file(&self, path: &str) -> bool {
        self.kind(path) == Some(EntryKind::File)
    }
}

//! In-memory archive view for tests.

use crate::error::{Error, Result};
use crate::index::Index;
use crate::{ArchiveView, DirEntry, EntryKind};
use std::io::Write;

/// An archive view backed by in-memory entries.
///
/// Useful for exercising layout heuristics without building real archives.
///
/// # Example
///
/// ```
/// use archivefs::{ArchiveView, MemoryArchive};
///
/// let archive = MemoryArchive::new()
///     .with_file("foo-1.0/bin/foo", b"binary".to_vec())
///     .with_dir("foo-1.0/share");
///
/// assert!(archive.is_file("foo-1.0/bin/foo"));
/// assert_eq!(archive.root_entries().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    index: Index<Vec<u8>>,
}

impl MemoryArchive {
    /// Create an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a regular file.
    #[must_use]
    pub fn with_file(mut self, path: &str, data: Vec<u8>) -> Self {
        self.index.insert(path, EntryKind::File, data);
        self
    }

    /// Add an (empty) directory.
    #[must_use]
    pub fn with_dir(mut self, path: &str) -> Self {
        self.index.insert(path, EntryKind::Dir, Vec::new());
        self
    }
}

impl ArchiveView for MemoryArchive {
    fn kind(&self, path: &str) -> Option<EntryKind> {
        self.index.kind(path)
    }

    fn root_entries(&self) -> Vec<DirEntry> {
        self.index.root_entries()
    }

    fn copy_to(&self, path: &str, out: &mut dyn Write) -> Result<u64> {
        let data = self
            .index
            .file(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        out.write_all(data)
            .map_err(|e| Error::io(format!("memory:{path}"), e))?;
        Ok(data.len() as u64)
    }
}

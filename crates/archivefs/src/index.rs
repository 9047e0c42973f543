//! Path index shared by the archive views.

use crate::{DirEntry, EntryKind};
use std::collections::BTreeMap;

/// Normalize an in-archive path.
///
/// Strips leading `/` and `./`, collapses `.` segments, converts `\` to `/`
/// and drops trailing slashes. Returns `None` for empty paths and for paths
/// containing `..`.
#[must_use]
pub fn normalize_path(raw: &str) -> Option<String> {
    let unified = raw.replace('\\', "/");
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    kind: EntryKind,
    payload: Option<T>,
}

/// Entries keyed by normalized path, with implicit parent directories.
#[derive(Debug, Clone)]
pub(crate) struct Index<T> {
    slots: BTreeMap<String, Slot<T>>,
}

impl<T> Default for Index<T> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl<T> Index<T> {
    /// Insert an entry. Returns `false` if the path was rejected.
    pub(crate) fn insert(&mut self, raw: &str, kind: EntryKind, payload: T) -> bool {
        let Some(path) = normalize_path(raw) else {
            log::debug!("skipping archive entry with unusable path: {raw:?}");
            return false;
        };

        let mut prefix = String::new();
        let mut segments = path.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                break;
            }
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            self.slots.entry(prefix.clone()).or_insert(Slot {
                kind: EntryKind::Dir,
                payload: None,
            });
        }

        self.slots.insert(
            path,
            Slot {
                kind,
                payload: Some(payload),
            },
        );
        true
    }

    pub(crate) fn kind(&self, path: &str) -> Option<EntryKind> {
        let path = normalize_path(path)?;
        self.slots.get(&path).map(|slot| slot.kind)
    }

    /// Payload of a regular file.
    pub(crate) fn file(&self, path: &str) -> Option<&T> {
        let path = normalize_path(path)?;
        self.slots
            .get(&path)
            .filter(|slot| slot.kind == EntryKind::File)
            .and_then(|slot| slot.payload.as_ref())
    }

    pub(crate) fn root_entries(&self) -> Vec<DirEntry> {
        self.slots
            .iter()
            .filter(|(path, _)| !path.contains('/'))
            .map(|(path, slot)| DirEntry {
                name: path.clone(),
                kind: slot.kind,
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("foo"), Some("foo".to_string()));
        assert_eq!(normalize_path("./foo/bin/"), Some("foo/bin".to_string()));
        assert_eq!(normalize_path("/abs//foo"), Some("abs/foo".to_string()));
        assert_eq!(normalize_path("dir\\foo.exe"), Some("dir/foo.exe".to_string()));
        assert_eq!(normalize_path("./"), None);
        assert_eq!(normalize_path(""), None);
        assert_eq!(normalize_path("../etc/passwd"), None);
        assert_eq!(normalize_path("a/../b"), None);
    }

    #[test]
    fn test_implicit_parent_directories() {
        let mut index = Index::default();
        assert!(index.insert("foo-1.0/bin/foo", EntryKind::File, 1));

        assert_eq!(index.kind("foo-1.0"), Some(EntryKind::Dir));
        assert_eq!(index.kind("foo-1.0/bin"), Some(EntryKind::Dir));
        assert_eq!(index.kind("foo-1.0/bin/foo"), Some(EntryKind::File));
        assert_eq!(index.file("foo-1.0/bin/foo"), Some(&1));
        assert_eq!(index.file("foo-1.0/bin"), None);

        let roots = index.root_entries();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "foo-1.0");
        assert_eq!(roots[0].kind, EntryKind::Dir);
    }

    #[test]
    fn test_explicit_dir_does_not_clobber_children() {
        let mut index = Index::default();
        index.insert("top/foo", EntryKind::File, 1);
        index.insert("top/", EntryKind::Dir, 0);
        assert_eq!(index.file("top/foo"), Some(&1));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_rejected_paths_are_not_indexed() {
        let mut index: Index<u8> = Index::default();
        assert!(!index.insert("../escape", EntryKind::File, 0));
        assert!(!index.insert("./", EntryKind::Dir, 0));
        assert!(index.root_entries().is_empty());
    }
}

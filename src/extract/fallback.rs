//! Last-resort extraction straight from the archive byte stream.
//!
//! Some tarballs cannot be indexed (unusual headers, trailing garbage after
//! the first entries) and show up with an empty root. For those the
//! artifact is re-read as a plain (optionally compressed) tar stream and
//! the binary is copied out of it directly.

use super::{Located, SearchContext};
use crate::error::{Error, Result};
use archivefs::format::SNIFF_LEN;
use archivefs::{ArchiveView, Compression, normalize_path};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Only applies when the indexed archive has no root entries.
///
/// Takes the first regular file whose path starts with the binary name.
/// Among those, one that also ends with the name (`foo-1.0/bin/foo`) is
/// preferred over a plain prefix match (`foo-linux-amd64`).
pub(super) fn raw_tar_stream(
    view: &dyn ArchiveView,
    ctx: &SearchContext<'_>,
) -> Result<Option<Located>> {
    if !view.root_entries().is_empty() {
        return Ok(None);
    }
    log::debug!(
        "{}: archive index is empty, scanning {} as a tar stream",
        ctx.binary,
        ctx.archive_path.display()
    );

    let binary = ctx.binary;
    let bounded = |path: &str| path.starts_with(binary) && path.ends_with(binary);
    if scan(ctx, &bounded)? {
        return Ok(Some(Located::Staged(ctx.dest.to_path_buf())));
    }

    let prefixed = |path: &str| path.starts_with(binary);
    if scan(ctx, &prefixed)? {
        return Ok(Some(Located::Staged(ctx.dest.to_path_buf())));
    }

    Ok(None)
}

fn open_stream(path: &Path) -> Result<Box<dyn Read>> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.by_ref()
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(|e| Error::io(path, e))?;

    let compression = Compression::from_magic(&head).unwrap_or(Compression::None);
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    compression
        .reader(BufReader::new(file))
        .map_err(|e| Error::io(path, e))
}

/// Copy the first regular file matching `matches` to `ctx.dest`.
///
/// Read errors end the scan; whatever was read before them is still
/// searched.
fn scan(ctx: &SearchContext<'_>, matches: &dyn Fn(&str) -> bool) -> Result<bool> {
    let archive_path = ctx.archive_path;
    let mut archive = tar::Archive::new(open_stream(archive_path)?);
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot read {} as tar: {}", archive_path.display(), e);
            return Ok(false);
        }
    };

    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("stopped reading {}: {}", archive_path.display(), e);
                return Ok(false);
            }
        };
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let Some(path) = entry
            .path()
            .ok()
            .and_then(|p| normalize_path(&p.to_string_lossy()))
        else {
            continue;
        };
        if !matches(&path) {
            continue;
        }

        log::debug!("{}: found {} in tar stream", ctx.binary, path);
        let mut out = File::create(ctx.dest).map_err(|e| Error::io(ctx.dest, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| Error::io(ctx.dest, e))?;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivefs::MemoryArchive;
    use flate2::Compression as Level;
    use flate2::write::GzEncoder;
    use std::fs;

    fn tar_gz(path: &Path, files: &[(&str, &[u8])]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Level::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_skipped_when_root_has_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo-archive");
        tar_gz(&archive, &[("foo", b"bin")]);
        let dest = dir.path().join("foo-extracted");

        let view = MemoryArchive::new().with_file("other", b"".to_vec());
        let ctx = SearchContext::new("foo", &archive, &dest);
        assert!(raw_tar_stream(&view, &ctx).unwrap().is_none());
        assert!(!dest.exists());
    }

    #[test]
    fn test_requires_name_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo-archive");
        tar_gz(&archive, &[("release/foo", b"wrong"), ("foo-linux-amd64", b"right")]);
        let dest = dir.path().join("foo-extracted");
        let ctx = SearchContext::new("foo", &archive, &dest);

        let located = raw_tar_stream(&MemoryArchive::new(), &ctx).unwrap();
        assert!(matches!(located, Some(Located::Staged(ref p)) if p == &dest));
        assert_eq!(fs::read(&dest).unwrap(), b"right");
    }

    #[test]
    fn test_prefers_prefix_and_suffix_match() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo-archive");
        tar_gz(
            &archive,
            &[
                ("foo-1.0/README", b"docs"),
                ("release/foo", b"not this"),
                ("foo-1.0/bin/foo", b"binary"),
            ],
        );
        let dest = dir.path().join("foo-extracted");
        let ctx = SearchContext::new("foo", &archive, &dest);

        assert!(raw_tar_stream(&MemoryArchive::new(), &ctx).unwrap().is_some());
        assert_eq!(fs::read(&dest).unwrap(), b"binary");
    }

    #[test]
    fn test_prefix_match_when_nothing_ends_with_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo-archive");
        tar_gz(&archive, &[("docs/foo.md", b"docs"), ("foo-linux-amd64", b"binary")]);
        let dest = dir.path().join("foo-extracted");
        let ctx = SearchContext::new("foo", &archive, &dest);

        assert!(raw_tar_stream(&MemoryArchive::new(), &ctx).unwrap().is_some());
        assert_eq!(fs::read(&dest).unwrap(), b"binary");
    }

    #[test]
    fn test_not_a_tar_stream() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("foo-archive");
        fs::write(&archive, b"this is not a tarball at all").unwrap();
        let dest = dir.path().join("foo-extracted");
        let ctx = SearchContext::new("foo", &archive, &dest);

        assert!(raw_tar_stream(&MemoryArchive::new(), &ctx).unwrap().is_none());
        assert!(!dest.exists());
    }
}
